//! Error handling for worktable
//!
//! This module provides the error types and user-friendly error reporting for the
//! report generator. The error system follows two principles:
//! 1. **Strongly-typed errors** for precise handling inside the pipeline
//! 2. **User-friendly messages** with actionable suggestions at the CLI boundary
//!
//! # Architecture
//!
//! - [`ReportError`] - Enumerated error types for every terminal failure of a run
//! - [`ErrorContext`] - Wrapper that adds details and suggestions for display
//!
//! # Error Categories
//!
//! - **Configuration**: [`ReportError::ConfigError`], [`ReportError::InvalidPeriod`],
//!   [`ReportError::ProjectNotFound`]
//! - **Template**: [`ReportError::TemplateNotFound`], [`ReportError::TemplateParseError`],
//!   [`ReportError::TemplateRenderError`]
//! - **Remote**: [`ReportError::NetworkError`], [`ReportError::RemoteStatus`]
//! - **Output**: [`ReportError::NoRowsRendered`], [`ReportError::RenderAborted`],
//!   [`ReportError::DocumentError`]
//!
//! Attribute resolution misses are *not* errors: they are `Ok(None)` values and never
//! reach this module.
//!
//! # Examples
//!
//! ```rust,no_run
//! use worktable::core::{ReportError, user_friendly_error};
//!
//! let error = anyhow::Error::from(ReportError::NoRowsRendered);
//! let ctx = user_friendly_error(error);
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for report runs.
///
/// Each variant describes one failure class. Everything here is terminal for the
/// current run: the pipeline stops and the output document is not persisted.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// The requested reporting period is invalid
    ///
    /// Raised for a month outside 1..=12, a year outside 0..=9999, or a range whose
    /// start lies after its end. Always raised before any network call.
    #[error("Invalid reporting period: {reason}")]
    InvalidPeriod {
        /// Why the period was rejected
        reason: String,
    },

    /// Scope project could not be located on the remote service
    #[error("The project named `{identifier}` could not be found")]
    ProjectNotFound {
        /// Identifier (numeric id or string identifier) that was looked up
        identifier: String,
    },

    /// Template document not found
    #[error("Template file not found: {path}")]
    TemplateNotFound {
        /// Path of the missing template
        path: String,
    },

    /// Template document could not be parsed
    #[error("Invalid template document {file}")]
    TemplateParseError {
        /// Path of the template document
        file: String,
        /// Specific reason for the failure
        reason: String,
    },

    /// A column template failed to compile or render
    #[error("Column {column} failed to render: {reason}")]
    TemplateRenderError {
        /// 1-based column position from the header row
        column: u32,
        /// Rendering failure reported by the template engine
        reason: String,
    },

    /// No rows were produced by the render pass
    ///
    /// An empty cross-product of the resource graph is a failed run, never a valid
    /// empty report.
    #[error("Unsuccessfully generated, no data was generated")]
    NoRowsRendered,

    /// Rendering stopped part way through the table
    ///
    /// Pending merge runs were committed before this error was raised, but the
    /// document is still treated as failed.
    #[error("Rendering aborted at row {row}: {reason}")]
    RenderAborted {
        /// Sheet row that was being rendered
        row: u32,
        /// Underlying failure
        reason: String,
    },

    /// Network error
    #[error("Network error: {operation}")]
    NetworkError {
        /// The remote operation that failed
        operation: String,
        /// Reason for the network failure
        reason: String,
    },

    /// The remote service answered with a non-success status
    #[error("Remote service returned HTTP {status} for {operation}")]
    RemoteStatus {
        /// The remote operation that failed
        operation: String,
        /// HTTP status code
        status: u16,
    },

    /// The output document could not be written
    #[error("Document error: {operation}")]
    DocumentError {
        /// Document operation that failed
        operation: String,
        /// Reason reported by the writer
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

impl Clone for ReportError {
    fn clone(&self) -> Self {
        match self {
            Self::ConfigError {
                message,
            } => Self::ConfigError {
                message: message.clone(),
            },
            Self::InvalidPeriod {
                reason,
            } => Self::InvalidPeriod {
                reason: reason.clone(),
            },
            Self::ProjectNotFound {
                identifier,
            } => Self::ProjectNotFound {
                identifier: identifier.clone(),
            },
            Self::TemplateNotFound {
                path,
            } => Self::TemplateNotFound {
                path: path.clone(),
            },
            Self::TemplateParseError {
                file,
                reason,
            } => Self::TemplateParseError {
                file: file.clone(),
                reason: reason.clone(),
            },
            Self::TemplateRenderError {
                column,
                reason,
            } => Self::TemplateRenderError {
                column: *column,
                reason: reason.clone(),
            },
            Self::NoRowsRendered => Self::NoRowsRendered,
            Self::RenderAborted {
                row,
                reason,
            } => Self::RenderAborted {
                row: *row,
                reason: reason.clone(),
            },
            Self::NetworkError {
                operation,
                reason,
            } => Self::NetworkError {
                operation: operation.clone(),
                reason: reason.clone(),
            },
            Self::RemoteStatus {
                operation,
                status,
            } => Self::RemoteStatus {
                operation: operation.clone(),
                status: *status,
            },
            Self::DocumentError {
                operation,
                reason,
            } => Self::DocumentError {
                operation: operation.clone(),
                reason: reason.clone(),
            },
            // For errors that don't implement Clone, convert to Other
            Self::IoError(e) => Self::Other {
                message: format!("IO error: {e}"),
            },
            Self::TomlError(e) => Self::Other {
                message: format!("TOML parsing error: {e}"),
            },
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// Error context wrapper that provides user-friendly error information
///
/// When displayed, errors show:
/// 1. **Error**: The main error message in red
/// 2. **Details**: Additional context in yellow (optional)
/// 3. **Suggestion**: Actionable steps in green (optional)
///
/// # Examples
///
/// ```rust,no_run
/// use worktable::core::{ErrorContext, ReportError};
///
/// let context = ErrorContext::new(ReportError::NoRowsRendered)
///     .with_suggestion("Check the reporting period")
///     .with_details("No time entries matched the query");
///
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: ReportError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: ReportError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes [`ReportError`] (directly or anywhere in the `anyhow` chain),
/// [`std::io::Error`] and [`toml::de::Error`]; anything else is reported with its full
/// cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    // Context values are only visible through `downcast_ref` on the error itself
    let report_error = error
        .downcast_ref::<ReportError>()
        .or_else(|| error.chain().find_map(|e| e.downcast_ref::<ReportError>()));
    if let Some(report_error) = report_error {
        return create_error_context(report_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(ReportError::DocumentError {
                    operation: "file access".to_string(),
                    reason: io_error.to_string(),
                })
                .with_suggestion("Check write permissions on the output directory")
                .with_details("The report could not read or write one of its files");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(ReportError::Other {
                    message: error.to_string(),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(ReportError::ConfigError {
            message: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax: quotes, brackets and key names")
        .with_details("TOML parsing errors are usually caused by syntax issues like missing quotes or mismatched brackets");
    }

    // Generic error - include the full error chain for better diagnostics
    let mut message = error.to_string();

    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(ReportError::Other {
        message,
    })
}

/// Map each [`ReportError`] variant to an [`ErrorContext`] with tailored suggestions.
fn create_error_context(error: ReportError) -> ErrorContext {
    match &error {
        ReportError::InvalidPeriod { .. } => ErrorContext::new(error.clone())
            .with_suggestion("Use --month 1..12 with an optional --year, or --from/--to as YYYY-MM-DD")
            .with_details("The reporting period is validated before any request is sent"),

        ReportError::ProjectNotFound { identifier } => ErrorContext::new(error.clone())
            .with_suggestion(format!(
                "Check the project identifier '{identifier}' or use its numeric id"
            ))
            .with_details("Project scoping looks the project up before walking its sub-projects"),

        ReportError::TemplateNotFound { path } => ErrorContext::new(error.clone())
            .with_suggestion(format!(
                "Create the template at {path} or pass --template with the right path"
            ))
            .with_details("The template's first row holds column labels, the second the cell templates"),

        ReportError::TemplateParseError { .. } => ErrorContext::new(error.clone())
            .with_suggestion("The template must contain a `rows` array of string arrays"),

        ReportError::TemplateRenderError { .. } => ErrorContext::new(error.clone())
            .with_suggestion(
                "Check template syntax: variables use {{ var }}. Available roots are project, user, \
                 task, parent and report",
            ),

        ReportError::NoRowsRendered => ErrorContext::new(error.clone())
            .with_suggestion("Check the reporting period and project scope; no output file was written")
            .with_details("The query returned no time entries, so the table would be empty"),

        ReportError::RenderAborted { .. } => ErrorContext::new(error.clone())
            .with_details("Rows rendered before the failure were committed, but no output file was written"),

        ReportError::NetworkError { .. } => ErrorContext::new(error.clone())
            .with_suggestion("Check the server URL and your network connection"),

        ReportError::RemoteStatus { status, .. } => {
            let suggestion = match status {
                401 | 403 => "Check the API key or username/password",
                404 => "Check the server URL; it should point at the Redmine root",
                _ => "Retry later or check the server logs",
            };
            ErrorContext::new(error.clone()).with_suggestion(suggestion)
        }

        _ => ErrorContext::new(error.clone()),
    }
}
