//! Core type definitions for Solace

pub mod emotion;
pub mod memory;
pub mod model;
pub mod profile;

// Re-export commonly used types
pub use emotion::*;
pub use memory::*;
pub use model::*;
pub use profile::*;
