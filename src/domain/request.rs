use crate::domain::record::Record;
use std::fmt;
use std::str::FromStr;

/// How the target table is emptied before the snapshot is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearMode {
    /// `DELETE FROM <table>`
    DeleteAll,
    /// `TRUNCATE TABLE <table> RESTART IDENTITY`
    TruncateReset,
}

impl fmt::Display for ClearMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClearMode::DeleteAll => f.write_str("delete"),
            ClearMode::TruncateReset => f.write_str("truncate"),
        }
    }
}

/// Deployment-wide choice of [`ClearMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClearPolicy {
    #[default]
    Delete,
    Truncate,
    /// The request's `truncateFirst` flag decides; absent means delete.
    CallerSelects,
}

impl ClearPolicy {
    pub fn resolve(self, truncate_first: Option<bool>) -> ClearMode {
        match self {
            ClearPolicy::Delete => ClearMode::DeleteAll,
            ClearPolicy::Truncate => ClearMode::TruncateReset,
            ClearPolicy::CallerSelects if truncate_first == Some(true) => ClearMode::TruncateReset,
            ClearPolicy::CallerSelects => ClearMode::DeleteAll,
        }
    }
}

impl FromStr for ClearPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "delete" => Ok(ClearPolicy::Delete),
            "truncate" => Ok(ClearPolicy::Truncate),
            "caller" => Ok(ClearPolicy::CallerSelects),
            other => Err(format!(
                "unknown clear mode '{}' (expected delete, truncate or caller)",
                other
            )),
        }
    }
}

/// One snapshot upload, already authenticated and shape-checked.
#[derive(Debug, Clone, Default)]
pub struct SyncRequest {
    pub records: Vec<Record>,
    pub table_name: Option<String>,
    pub truncate_first: Option<bool>,
}

/// What a committed sync did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub table: String,
    pub clear_mode: ClearMode,
    pub inserted_count: u64,
    pub chunks: usize,
}
