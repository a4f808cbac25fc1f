//! # Campus Testkit
//!
//! Test utilities for the campus sync crates:
//! - seeded temporary data roots
//! - golden-file comparison
//! - proptest strategies for record rows
//!
//! ## Usage
//!
//! ```rust
//! use campus_testkit::TestDataRoot;
//! use campus_core::Coordinator;
//!
//! let root = TestDataRoot::seeded();
//! let catalog = Coordinator::new(root.store(), root.layout()).build();
//! assert!(catalog.roster_is_consistent());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod golden;

pub use fixtures::*;
pub use generators::*;
pub use golden::*;
