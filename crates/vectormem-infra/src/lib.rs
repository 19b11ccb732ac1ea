//! Infrastructure layer for vectormem.
//!
//! Contains implementations of the port traits defined in `vectormem-core`:
//! the OpenAI-compatible embedding adapter, the Weaviate gateway, and the
//! TOML configuration loader that wires them together.

pub mod builder;
pub mod config;
pub mod embedding;
pub mod weaviate;
