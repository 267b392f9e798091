//! Feature Vector Assembly
//!
//! Merges per-frame perception outputs and derived geometry into a
//! fixed-order numeric feature map. Key order and names are part of the
//! scoring contract: the model oracles were trained against
//! [`MODEL_SCHEMA`] and are order-sensitive.

pub mod assembler;
pub mod schema;

pub use assembler::assemble;
pub use schema::{Features, FEATURE_DIMENSION, MODEL_SCHEMA};
