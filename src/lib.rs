//! Curbside: recurring collection-schedule configuration
//!
//! A step-by-step wizard that collects, validates, and normalizes
//! garbage/recycling schedule parameters into a single stored record.

pub mod cli;
pub mod core;
pub mod flow;
pub mod schema;
