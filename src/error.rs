use serde::{Deserialize, Serialize};

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the failure of a command at the boundary where it is reported to the user.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The data directory or its configuration file is missing or invalid.
    Config,
    /// The SQLite database could not be read or written.
    Database,
    /// The user asked for something invalid, e.g. a missing form field or an unknown user.
    Request,
    /// Reading or writing a file outside the database failed.
    Filesystem,
}

serde_plain::derive_display_from_serialize!(ErrorType);

/// Tags an internal error with the `ErrorType` shown to the user.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T> IntoResult<T> for Result<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| e.context(format!("{error_type} error")))
    }
}
