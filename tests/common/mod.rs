//! Shared test utilities

// Each test binary compiles its own copy; not every binary uses every helper
#![allow(dead_code)]

pub mod fixtures;
