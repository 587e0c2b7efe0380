// src/data/mod.rs

//! The `data` modules define passive data containers and declarative tables
//! processed by the [`readers`].
//!
//! [`readers`]: crate::readers

pub mod commandblock;
pub mod field;
pub mod stepschedule;
pub mod transcript;
pub mod triggers;
