//! Core types and trait definitions for the Tally incident tracker.
//!
//! No HTTP or database code lives here; every other crate in the workspace
//! builds on these types.

pub mod catalog;
pub mod error;
pub mod gate;
pub mod incident;
mod input;
pub mod report;
pub mod store;

pub use error::{Error, Result};
