//! Dashboard API record schema
//!
//! This module parses the activity and biometric arrays served by the
//! dashboard API. Parsing is lenient at the field level (a malformed field
//! becomes absent) and validation is reported per record without failing
//! the batch.

pub mod de;
mod adapter;

pub use adapter::*;
