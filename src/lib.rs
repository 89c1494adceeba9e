//! # CENSUS
//!
//! Inventory of which functions and methods of a versioned Python API surface
//! (a dataframe/query library such as PySpark) are actually called across a
//! source tree.
//!
//! Every call site is attributed to the module that owns the symbol using a
//! lightweight, scope-aware symbolic pass: import aliases and the believed
//! origin of assigned values are tracked per file, chained calls inherit the
//! surface of their receiver, and same-name candidates are separated by
//! owner and arity. Ambiguous sites are counted, never guessed.
//!
//! ## Output
//!
//! - **Report**: ordered, redacted [`core::Match`] records (no literal values)
//! - **Summary**: match frequencies per `module.function`

pub mod core;
pub mod formatters;
pub mod parsers;
