//! pgRouting CLI library.
//!
//! This crate provides the argument definitions, command handlers and output
//! formatting behind the `pgrouter` binary.

pub mod args;
pub mod commands;
pub mod output;
