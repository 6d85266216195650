//! Core types for worktable
//!
//! This module holds the pieces every other module leans on:
//!
//! - [`ReportError`] - Enumerated error types covering every terminal failure of a run
//! - [`ErrorContext`] - User-friendly error wrapper with suggestions and details
//! - [`user_friendly_error`] - Convert any error to the user-friendly format
//! - [`ResourceKind`] - The four entity kinds the resource graph stores
//!
//! # Error Handling Pattern
//!
//! ```rust
//! use worktable::core::{ReportError, user_friendly_error};
//! use anyhow::Result;
//!
//! fn example_operation() -> Result<String> {
//!     Err(ReportError::NoRowsRendered.into())
//! }
//!
//! if let Err(e) = example_operation() {
//!     let friendly = user_friendly_error(e);
//!     assert!(friendly.suggestion.is_some());
//! }
//! ```

pub mod error;
mod resource;

pub use error::{ErrorContext, ReportError, user_friendly_error};
pub use resource::ResourceKind;
