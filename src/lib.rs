//! `confq` reads a configuration document in one of several formats, runs a
//! query or mutation against it, and writes the result in any format.
//!
//! The binary is a thin shim over [`cli::must_run`]: it classifies stdin with
//! [`stdin::piped`], registers the built-in [`format`] plugins, and hands off.
//! Library callers can use [`format::FormatRegistry`] and the [`selector`]
//! functions directly.

pub mod cli;
pub mod config;
pub mod domain;
pub mod format;
pub mod logging;
pub mod selector;
pub mod stdin;
