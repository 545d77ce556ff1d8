//! Core traits module
//!
//! Contains the abstract interface every upstream provider implements

pub mod provider;

pub use provider::*;
