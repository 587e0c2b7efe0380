// src/debug/mod.rs

//! The `debug` module is helper functions for test builds.

#[cfg(test)]
pub mod helpers;
