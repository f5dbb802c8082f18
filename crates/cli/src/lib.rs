//! Stitch CLI
//!
//! Command-line front end for running JSON browser workflows.

pub mod discover;
pub mod output;
pub mod settings;
