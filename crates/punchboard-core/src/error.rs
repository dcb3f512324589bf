//! Error types for punchboard-core
//!
//! Hard failures go through [`CoreError`]; recoverable data problems found while
//! loading a dataset are collected in a [`LoadReport`] instead.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for punchboard operations
#[derive(Error, Debug)]
pub enum CoreError {
    // ===================
    // Date range errors
    // ===================
    #[error("Invalid {anchor} anchor for {granularity} range: {reason}")]
    InvalidAnchor {
        granularity: &'static str,
        anchor: &'static str,
        reason: String,
    },

    // ===================
    // IO Errors
    // ===================
    #[error("Failed to read file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    // ===================
    // Parse Errors
    // ===================
    #[error("Failed to parse JSON in {path}: {message}")]
    JsonParse {
        path: PathBuf,
        message: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse config {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        message: String,
        #[source]
        source: toml::de::Error,
    },

    // ===================
    // Config Errors
    // ===================
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    // ===================
    // Collaborator Errors
    // ===================
    #[error("Fetch from {source_name} failed: {message}")]
    Fetch {
        source_name: String,
        message: String,
    },

    // ===================
    // State Errors
    // ===================
    #[error("No employee selected for drill-down")]
    NoEmployeeSelected,
}

impl CoreError {
    pub(crate) fn invalid_anchor(
        granularity: &'static str,
        anchor: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        CoreError::InvalidAnchor {
            granularity,
            anchor,
            reason: reason.into(),
        }
    }

    /// True for errors the caller can fix by supplying different parameters
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidAnchor { .. } | CoreError::InvalidConfig { .. }
        )
    }
}

/// Severity level for problems found during load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Data kept, but something looked off
    Warning,
    /// Data could not be used
    Error,
}

/// Individual entry in a load report
#[derive(Debug, Clone)]
pub struct LoadError {
    pub source: String,
    pub message: String,
    pub severity: ErrorSeverity,
}

impl LoadError {
    pub fn warning(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
            severity: ErrorSeverity::Warning,
        }
    }

    pub fn error(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
            severity: ErrorSeverity::Error,
        }
    }
}

/// Report of problems encountered while loading attendance data
///
/// Records with unknown category tags or inverted punches are kept;
/// the report only tells the caller they exist.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub errors: Vec<LoadError>,
    pub records_loaded: usize,
    pub unrecognized_categories: usize,
    pub inverted_punches: usize,
}

impl LoadReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, error: LoadError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, source: impl Into<String>, message: impl Into<String>) {
        self.errors.push(LoadError::warning(source, message));
    }

    /// Returns true if there are any entries (including warnings)
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns true if any entry is worse than a warning
    pub fn has_hard_errors(&self) -> bool {
        self.errors
            .iter()
            .any(|e| e.severity == ErrorSeverity::Error)
    }

    /// Returns only warnings
    pub fn warnings(&self) -> impl Iterator<Item = &LoadError> {
        self.errors
            .iter()
            .filter(|e| e.severity == ErrorSeverity::Warning)
    }
}
