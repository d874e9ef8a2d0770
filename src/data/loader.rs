//! CSV Data Loader Module
//! Reads the transactions export with Polars and renames source headers to canonical columns.

use polars::prelude::*;
use std::fs;
use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{ColumnMapping, Encoding, PipelineConfig};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Input file not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Input is not valid UTF-8 (try --encoding latin1)")]
    InvalidUtf8,
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Missing required column '{column}' (looked for: {tried})")]
    MissingColumn { column: &'static str, tried: String },
    #[error("No data rows in input")]
    Empty,
}

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Decode raw file bytes into text.
///
/// Latin-1 maps every byte to the code point of the same value, so it never fails.
pub fn decode_bytes(mut bytes: Vec<u8>, encoding: Encoding) -> Result<String, LoaderError> {
    if bytes.starts_with(UTF8_BOM) {
        bytes.drain(..UTF8_BOM.len());
    }
    match encoding {
        Encoding::Utf8 => String::from_utf8(bytes).map_err(|_| LoaderError::InvalidUtf8),
        Encoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        Encoding::Auto => match String::from_utf8(bytes) {
            Ok(text) => Ok(text),
            Err(err) => {
                debug!("Input is not valid UTF-8, decoding as Latin-1");
                Ok(err.into_bytes().iter().map(|&b| char::from(b)).collect())
            }
        },
    }
}

/// Loads a delimited transactions file into a DataFrame of canonical string columns.
pub struct DataLoader {
    encoding: Encoding,
    delimiter: u8,
    columns: ColumnMapping,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            encoding: Encoding::Auto,
            delimiter: b',',
            columns: ColumnMapping::default(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            encoding: config.encoding,
            delimiter: config.delimiter as u8,
            columns: config.columns.clone(),
        }
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_columns(mut self, columns: ColumnMapping) -> Self {
        self.columns = columns;
        self
    }

    /// Load a CSV file. Every column is read as a string; the cleaner does typed coercion.
    pub fn load_csv(&self, file_path: &Path) -> Result<DataFrame, LoaderError> {
        let bytes = fs::read(file_path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => LoaderError::NotFound(file_path.to_path_buf()),
            _ => LoaderError::Io {
                path: file_path.to_path_buf(),
                source,
            },
        })?;
        debug!("Read {} bytes from {}", bytes.len(), file_path.display());

        let text = decode_bytes(bytes, self.encoding)?;
        let df = self.parse_text(text)?;
        info!("Loaded {} rows from {}", df.height(), file_path.display());
        Ok(df)
    }

    /// Parse already-decoded CSV text and apply the rename step.
    pub fn parse_text(&self, text: String) -> Result<DataFrame, LoaderError> {
        let raw = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .with_parse_options(CsvParseOptions::default().with_separator(self.delimiter))
            .into_reader_with_file_handle(Cursor::new(text.into_bytes()))
            .finish()?;

        let df = self.rename_columns(raw)?;
        if df.height() == 0 {
            return Err(LoaderError::Empty);
        }
        Ok(df)
    }

    /// Select the mapped source columns under their canonical names; other columns are dropped.
    fn rename_columns(&self, raw: DataFrame) -> Result<DataFrame, LoaderError> {
        let headers = Self::get_columns(&raw);
        let mut selection = Vec::with_capacity(6);

        for (canonical, aliases) in self.columns.entries() {
            let source = Self::resolve_header(&headers, aliases).ok_or_else(|| {
                LoaderError::MissingColumn {
                    column: canonical,
                    tried: aliases.join(", "),
                }
            })?;
            debug!("Column '{}' <- '{}'", canonical, source);
            selection.push(col(source).alias(canonical));
        }

        Ok(raw.lazy().select(selection).collect()?)
    }

    fn resolve_header<'a>(headers: &'a [String], aliases: &[String]) -> Option<&'a str> {
        aliases.iter().find_map(|alias| {
            headers
                .iter()
                .find(|h| h.trim().eq_ignore_ascii_case(alias.trim()))
                .map(|h| h.as_str())
        })
    }

    /// Get list of column names from a DataFrame.
    pub fn get_columns(df: &DataFrame) -> Vec<String> {
        df.get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}
