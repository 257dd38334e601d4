use std::cell::RefCell;
use std::fs;
use std::rc::Rc;

use serde::Deserialize;

use crate::error::FeatureError;
use crate::layers::{FeatureAssembler, FeatureEmbedder, SharedEmbedder};

/// Categorical feature lists for one embedder.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbedderConfig {
    /// Number of distinct category values per feature.
    pub cardinalities: Vec<usize>,
    /// Output vector width per feature.
    pub embedding_dims: Vec<usize>,
}

impl EmbedderConfig {
    pub fn build(&self) -> Result<FeatureEmbedder, FeatureError> {
        FeatureEmbedder::new(&self.cardinalities, &self.embedding_dims)
    }
}

/// Assembler pipeline configuration loaded from a TOML or JSON file.
#[derive(Debug, Clone, Deserialize)]
pub struct AssemblerConfig {
    /// Time-axis length static features are broadcast to.
    pub t: usize,
    /// Embedder for the static categorical features, if any.
    #[serde(default)]
    pub embed_static: Option<EmbedderConfig>,
    /// Embedder for the dynamic categorical features, if any.
    #[serde(default)]
    pub embed_dynamic: Option<EmbedderConfig>,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            t: 8,
            embed_static: Some(EmbedderConfig {
                cardinalities: vec![4],
                embedding_dims: vec![3],
            }),
            embed_dynamic: Some(EmbedderConfig {
                cardinalities: vec![7, 12],
                embedding_dims: vec![2, 4],
            }),
        }
    }
}

impl AssemblerConfig {
    /// Load configuration from the given path.  Supports TOML or JSON based
    /// on the file extension. Returns `None` if parsing fails.
    pub fn from_path(path: &str) -> Option<Self> {
        let Ok(content) = fs::read_to_string(path) else {
            return None;
        };
        if path.ends_with(".json") {
            serde_json::from_str(&content).ok()
        } else {
            toml::from_str(&content).ok()
        }
    }

    /// Build the assembler plus owning handles for the embedders it
    /// references, so the caller can run optimizer steps against them.
    pub fn build(&self) -> Result<(FeatureAssembler, Vec<SharedEmbedder>), FeatureError> {
        let make = |c: &Option<EmbedderConfig>| -> Result<Option<SharedEmbedder>, FeatureError> {
            c.as_ref()
                .map(|c| c.build().map(|e| Rc::new(RefCell::new(e))))
                .transpose()
        };
        let embed_static = make(&self.embed_static)?;
        let embed_dynamic = make(&self.embed_dynamic)?;
        let mut owned: Vec<SharedEmbedder> = Vec::new();
        owned.extend(embed_static.iter().cloned());
        owned.extend(embed_dynamic.iter().cloned());
        let assembler = FeatureAssembler::new(self.t, embed_static, embed_dynamic)?;
        Ok((assembler, owned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_toml() {
        let cfg: AssemblerConfig = toml::from_str(
            r#"
            t = 16

            [embed_dynamic]
            cardinalities = [30, 30]
            embedding_dims = [10, 20]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.t, 16);
        assert!(cfg.embed_static.is_none());
        assert_eq!(cfg.embed_dynamic.unwrap().embedding_dims, vec![10, 20]);
    }

    #[test]
    fn parses_json() {
        let cfg: AssemblerConfig = serde_json::from_str(
            r#"{"t": 4, "embed_static": {"cardinalities": [2], "embedding_dims": [5]}}"#,
        )
        .unwrap();
        assert_eq!(cfg.t, 4);
        assert_eq!(cfg.embed_static.unwrap().cardinalities, vec![2]);
    }

    #[test]
    fn build_wires_referenced_embedders() {
        let (assembler, owned) = AssemblerConfig::default().build().unwrap();
        assert_eq!(owned.len(), 2);
        // one table for the static feature, two for the dynamic ones
        assert_eq!(assembler.num_parameters(), 3);
    }
}
