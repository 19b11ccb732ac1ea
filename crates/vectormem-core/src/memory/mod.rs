//! Vector memory: embedding, gateway and memory-db ports plus the store.
//!
//! The store depends on an [`embedder::Embedder`] (type-erased as
//! [`box_embedder::BoxEmbedder`]) and a [`gateway::VectorGateway`], and
//! exposes the [`db::MemoryDb`] contract consumed by retrieval pipelines.

pub mod box_embedder;
pub mod db;
pub mod embedder;
pub mod gateway;
pub mod store;
pub mod tokenizer;

#[cfg(test)]
pub(crate) mod test_support;
