mod client;
mod config;

pub use client::{product_payload, QdrantVectorStore};
pub use config::{QdrantConfig, DEFAULT_DIMENSION};
