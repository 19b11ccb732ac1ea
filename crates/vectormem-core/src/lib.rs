//! Memory store orchestration and port trait definitions for vectormem.
//!
//! This crate defines the "ports" (embedding provider, vector database
//! gateway, memory db) that the infrastructure layer implements, plus the
//! `VectorMemoryStore` that ties them together. It depends only on
//! `vectormem-types` -- never on `vectormem-infra` or any HTTP crate.

pub mod cancel;
pub mod memory;
