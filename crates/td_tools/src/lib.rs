//! # TD Development Tools
//!
//! Command-line tools for level authors:
//! - Level file validation

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod validate;
