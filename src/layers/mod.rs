pub mod assembler;
pub mod embedding;
pub mod feature_embedder;

pub use assembler::{AssemblerInput, FeatureAssembler, SharedEmbedder};
pub use embedding::{EmbeddingTable, Init};
pub use feature_embedder::FeatureEmbedder;
