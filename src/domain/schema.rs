//! Target table layout: the ordered column list and each column's coercion class.
//!
//! The service never creates or migrates tables; this list is the contract the
//! existing table must satisfy. Two presets cover the deployments in use, and
//! any other layout can be supplied as a JSON file.

use crate::domain::ident::is_valid_identifier;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// PostgreSQL refuses statements with more bind parameters than this.
pub const MAX_BIND_PARAMS: usize = 65_535;

/// How a loosely typed input value is normalized for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoercionClass {
    #[serde(rename = "string")]
    StringTrimmed,
    #[serde(rename = "integer")]
    IntegerOrNull,
    #[serde(rename = "float")]
    FloatOrNull,
    #[serde(rename = "date")]
    DatePassthrough,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub class: CoercionClass,
}

impl ColumnSpec {
    pub fn new(name: &str, class: CoercionClass) -> Self {
        Self {
            name: name.to_string(),
            class,
        }
    }
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema has no columns")]
    Empty,
    #[error("invalid column name '{0}'")]
    InvalidColumn(String),
    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),
    #[error("chunk size must be at least 1")]
    ZeroChunkSize,
    #[error("chunk size {chunk_size} x {columns} columns exceeds the 65535 bind parameter limit")]
    TooManyParams { chunk_size: usize, columns: usize },
    #[error("unknown schema preset '{0}' (expected 'wide' or 'narrow')")]
    UnknownPreset(String),
    #[error("failed to read schema file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse schema file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct SchemaFile {
    columns: Vec<ColumnSpec>,
    #[serde(default)]
    chunk_size: Option<usize>,
}

/// Ordered columns plus the rows-per-INSERT used when writing them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    columns: Vec<ColumnSpec>,
    chunk_size: usize,
}

impl TableSchema {
    pub fn new(columns: Vec<ColumnSpec>, chunk_size: usize) -> Result<Self, SchemaError> {
        if columns.is_empty() {
            return Err(SchemaError::Empty);
        }
        let mut seen = HashSet::new();
        for c in &columns {
            if !is_valid_identifier(&c.name) {
                return Err(SchemaError::InvalidColumn(c.name.clone()));
            }
            if !seen.insert(c.name.as_str()) {
                return Err(SchemaError::DuplicateColumn(c.name.clone()));
            }
        }
        let schema = Self {
            columns,
            chunk_size: 1,
        };
        schema.with_chunk_size(chunk_size)
    }

    /// The 20-column client register layout, written 100 rows per statement.
    pub fn wide() -> Self {
        use CoercionClass::*;
        let columns = [
            ("code", StringTrimmed),
            ("name", StringTrimmed),
            ("address", StringTrimmed),
            ("branch", StringTrimmed),
            ("district", StringTrimmed),
            ("state", StringTrimmed),
            ("software", StringTrimmed),
            ("mobile", StringTrimmed),
            ("installationdate", DatePassthrough),
            ("priority", IntegerOrNull),
            ("directdealing", StringTrimmed),
            ("route", StringTrimmed),
            ("amc", StringTrimmed),
            ("amcamt", FloatOrNull),
            ("accountcode", StringTrimmed),
            ("address3", StringTrimmed),
            ("lictype", StringTrimmed),
            ("clients", IntegerOrNull),
            ("sp", StringTrimmed),
            ("nature", StringTrimmed),
        ]
        .into_iter()
        .map(|(name, class)| ColumnSpec::new(name, class))
        .collect();
        Self {
            columns,
            chunk_size: 100,
        }
    }

    /// The 4-column layout, written 500 rows per statement.
    pub fn narrow() -> Self {
        let columns = ["code", "name", "address", "branch"]
            .into_iter()
            .map(|name| ColumnSpec::new(name, CoercionClass::StringTrimmed))
            .collect();
        Self {
            columns,
            chunk_size: 500,
        }
    }

    pub fn preset(name: &str) -> Result<Self, SchemaError> {
        match name.trim().to_lowercase().as_str() {
            "wide" => Ok(Self::wide()),
            "narrow" => Ok(Self::narrow()),
            other => Err(SchemaError::UnknownPreset(other.to_string())),
        }
    }

    /// Loads `{"chunk_size": N, "columns": [{"name": .., "class": ..}, ..]}`.
    /// Without `chunk_size` the largest chunk that stays under the bind limit
    /// (capped at 500) is used.
    pub fn from_json_file(path: &Path) -> Result<Self, SchemaError> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: display.clone(),
            source,
        })?;
        let file: SchemaFile = serde_json::from_str(&raw).map_err(|source| SchemaError::Parse {
            path: display,
            source,
        })?;
        let default_chunk = (MAX_BIND_PARAMS / file.columns.len().max(1)).clamp(1, 500);
        Self::new(file.columns, file.chunk_size.unwrap_or(default_chunk))
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Result<Self, SchemaError> {
        if chunk_size == 0 {
            return Err(SchemaError::ZeroChunkSize);
        }
        if chunk_size.saturating_mul(self.columns.len()) > MAX_BIND_PARAMS {
            return Err(SchemaError::TooManyParams {
                chunk_size,
                columns: self.columns.len(),
            });
        }
        self.chunk_size = chunk_size;
        Ok(self)
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}
