//! Application services layer.

pub mod directory;
pub mod error;
pub mod ranking;
