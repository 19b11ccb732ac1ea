//! Shared domain types for vectormem.
//!
//! This crate contains the types that flow between the memory store, the
//! embedding providers and the vector database gateway: records, tags,
//! filters, embeddings, the error taxonomy and configuration.
//!
//! Zero infrastructure dependencies -- only serde, serde_json, thiserror.

pub mod config;
pub mod error;
pub mod memory;
