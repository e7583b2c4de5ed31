pub mod args;
mod backup;
pub mod commands;
mod config;
mod db;
mod error;
pub mod forms;
pub mod ledger;
pub mod metrics;
pub mod model;
pub mod report;
mod utils;
pub mod view;

#[cfg(test)]
mod test;

pub use backup::Backup;
pub use config::Config;
pub use error::Error;
pub use error::Result;
