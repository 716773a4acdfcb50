//! Terminal output for the command-line front end.
//!
//! - [`display`]: catalog tables and operation summaries
//! - [`progress`]: progress bar and a reader that drives it

pub mod display;
pub mod progress;
