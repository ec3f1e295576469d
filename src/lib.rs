//! Sort television episode files into a tidy library.
//!
//! Filenames are classified by an ordered list of patterns, resolved against a
//! show catalog, and given a destination rendered from a path template.

pub mod config;
pub mod error;
pub mod format;
pub mod library;
pub mod sort;
pub mod worker;

pub use config::Config;
pub use error::{Error, Result};
