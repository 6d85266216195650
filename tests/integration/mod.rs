//! Integration tests for worktable.
//!
//! `pipeline` and `rendering` drive the library against in-memory fixtures; `cli`
//! runs the built binary without any network access.

#[path = "../common/mod.rs"]
mod common;

mod cli;
mod pipeline;
mod rendering;
