//! Rendering of list views as a Markdown table, CSV or JSON.

use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// The output format of a list view.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// A Markdown table.
    #[default]
    Table,
    /// Comma separated values with a header row.
    Csv,
    /// A JSON array of objects.
    Json,
}

serde_plain::derive_display_from_serialize!(Format);
serde_plain::derive_fromstr_from_deserialize!(Format);

/// A row type that can be laid out in columns.
pub trait Tabular: Serialize {
    /// Column headings, in display order.
    const HEADERS: &'static [&'static str];

    /// The display text of each column, in the same order as `HEADERS`.
    fn cells(&self) -> Vec<String>;
}

/// One labelled value of a two-column summary table.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Field {
    pub field: &'static str,
    pub value: String,
}

impl Field {
    pub fn new(field: &'static str, value: impl ToString) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}

impl Tabular for Field {
    const HEADERS: &'static [&'static str] = &["Field", "Value"];

    fn cells(&self) -> Vec<String> {
        vec![self.field.to_string(), self.value.clone()]
    }
}

/// List view rows in the requested output format.
#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rows {
    /// JSON array of objects, one per row.
    Json(serde_json::Value),
    /// Markdown table as a single formatted string.
    Table(String),
    /// CSV data as a properly escaped string.
    Csv(String),
}

impl Rows {
    /// Renders `rows` in `format`.
    pub fn render<T: Tabular>(rows: &[T], format: Format) -> Result<Self> {
        Ok(match format {
            Format::Json => {
                Rows::Json(serde_json::to_value(rows).context("Unable to serialize rows")?)
            }
            Format::Table => Rows::Table(markdown_table(rows)),
            Format::Csv => Rows::Csv(csv_text(rows)?),
        })
    }
}

impl Debug for Rows {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Rows::Json(v) => write!(f, "Rows::Json({:?})", v),
            Rows::Table(s) => write!(f, "Rows::Table({} chars)", s.len()),
            Rows::Csv(s) => write!(f, "Rows::Csv({} chars)", s.len()),
        }
    }
}

impl Display for Rows {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Rows::Json(v) => {
                if let Ok(s) = serde_json::to_string_pretty(v) {
                    write!(f, "{}", s)
                } else {
                    write!(f, "{:?}", v)
                }
            }
            Rows::Table(s) => write!(f, "{}", s),
            Rows::Csv(s) => write!(f, "{}", s),
        }
    }
}

/// Renders `rows` as a Markdown table.
pub fn markdown_table<T: Tabular>(rows: &[T]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|r| r.cells().iter().map(|c| escape_cell(c)).collect())
        .collect();

    let mut widths: Vec<usize> = T::HEADERS.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let headers: Vec<String> = T::HEADERS.iter().map(|h| h.to_string()).collect();
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let mut out = table_line(&widths, &headers);
    out.push_str(&table_line(&widths, &rule));
    for row in &cells {
        out.push_str(&table_line(&widths, row));
    }
    out
}

fn table_line(widths: &[usize], values: &[String]) -> String {
    let padded: Vec<String> = widths
        .iter()
        .zip(values)
        .map(|(w, v)| format!("{v:<width$}", width = *w))
        .collect();
    format!("| {} |\n", padded.join(" | "))
}

fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

fn csv_text<T: Tabular>(rows: &[T]) -> Result<String> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    wtr.write_record(T::HEADERS)
        .context("Unable to write CSV header")?;
    for row in rows {
        wtr.write_record(row.cells())
            .context("Unable to write CSV row")?;
    }
    let bytes = wtr.into_inner().context("Unable to flush CSV output")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}
