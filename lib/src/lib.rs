//! # Pre-flight guard for the OOB update tool
//!
//! Verifies that the host has the tooling, scratch space and Python
//! dependency the out-of-band update program needs, then runs that
//! program with the caller's arguments and reports its exit status.

// See https://doc.rust-lang.org/rustc/lints/listing/allowed-by-default.html
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![forbid(unused_must_use)]
#![deny(unsafe_code)]
#![deny(clippy::dbg_macro)]
#![deny(clippy::todo)]

pub mod cli;
pub mod config;
pub mod delegate;
pub mod dependency;
mod error;
pub use error::*;
pub mod guard;
pub mod space;
pub mod tools;
