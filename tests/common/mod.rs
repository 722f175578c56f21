//! Shared helpers for the end-to-end tests: image fixtures written to temp
//! dirs and parsers for the stamp text formats.
//!
//! Every test binary compiles this module separately, hence the allows.

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;
