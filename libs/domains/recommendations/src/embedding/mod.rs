mod http;
mod provider;

pub use http::{EmbeddingConfig, HttpEmbeddingProvider};
pub use provider::EmbeddingProvider;

#[cfg(test)]
pub use provider::MockEmbeddingProvider;
