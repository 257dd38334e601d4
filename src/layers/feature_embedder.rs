use super::embedding::{EmbeddingTable, Init};
use crate::error::FeatureError;
use crate::math::Matrix;
use crate::tensor::{IndexTensor, Tensor};

/// Embeds a fixed ordered list of categorical features, one independent
/// lookup table per feature.
///
/// The forward input is an integer tensor whose last axis enumerates the
/// configured features; every leading axis is batch-like (entity batch and,
/// for dynamic features, time).  The output keeps the leading axes and
/// replaces the last axis with the concatenation of the per-feature
/// embedding vectors, in configuration order.
#[derive(Debug)]
pub struct FeatureEmbedder {
    tables: Vec<EmbeddingTable>,
    out_dim: usize,
}

impl FeatureEmbedder {
    pub fn new(cardinalities: &[usize], embedding_dims: &[usize]) -> Result<Self, FeatureError> {
        Self::with_init(cardinalities, embedding_dims, Init::default())
    }

    pub fn with_init(
        cardinalities: &[usize],
        embedding_dims: &[usize],
        init: Init,
    ) -> Result<Self, FeatureError> {
        if cardinalities.len() != embedding_dims.len() {
            return Err(FeatureError::Config(format!(
                "got {} cardinalities but {} embedding dims",
                cardinalities.len(),
                embedding_dims.len()
            )));
        }
        if cardinalities.is_empty() {
            return Err(FeatureError::Config(
                "at least one categorical feature is required".into(),
            ));
        }
        for (i, (&c, &d)) in cardinalities.iter().zip(embedding_dims.iter()).enumerate() {
            if c == 0 || d == 0 {
                return Err(FeatureError::Config(format!(
                    "feature {i}: cardinality and embedding dim must be positive, got ({c}, {d})"
                )));
            }
        }
        let tables = cardinalities
            .iter()
            .zip(embedding_dims.iter())
            .map(|(&c, &d)| EmbeddingTable::with_init(c, d, init))
            .collect();
        Ok(Self {
            tables,
            out_dim: embedding_dims.iter().sum(),
        })
    }

    /// Number of configured categorical features.
    pub fn num_features(&self) -> usize {
        self.tables.len()
    }

    /// Width of the output feature axis, `sum(embedding_dims)`.
    pub fn output_dim(&self) -> usize {
        self.out_dim
    }

    /// Number of trainable tensors, one table per feature.
    pub fn num_parameters(&self) -> usize {
        self.tables.len()
    }

    /// Mutable access to the tables for optimisation.
    pub fn parameters(&mut self) -> Vec<&mut EmbeddingTable> {
        self.tables.iter_mut().collect()
    }

    /// Read-only view of the tables.
    pub fn tables(&self) -> &[EmbeddingTable] {
        &self.tables
    }

    fn check_input(&self, x: &IndexTensor) -> Result<(), FeatureError> {
        if x.shape.is_empty() {
            return Err(FeatureError::Shape(
                "feature tensor must have at least one axis".into(),
            ));
        }
        if x.last_dim() != self.tables.len() {
            return Err(FeatureError::Config(format!(
                "embedder configured for {} features but input last axis is {}",
                self.tables.len(),
                x.last_dim()
            )));
        }
        Ok(())
    }

    fn out_shape(&self, x: &IndexTensor) -> Vec<usize> {
        let mut shape = x.shape[..x.shape.len() - 1].to_vec();
        shape.push(self.out_dim);
        shape
    }

    /// Generic path: split the last axis by feature position, gather through
    /// the matching table and concatenate the results in input order.
    fn gather_split(&self, x: &IndexTensor) -> Matrix {
        let f = self.tables.len();
        let rows = x.data.len() / f;
        let mut out = Matrix::zeros(rows, self.out_dim);
        let mut offset = 0;
        for (i, table) in self.tables.iter().enumerate() {
            let idx: Vec<usize> = (0..rows).map(|r| x.data[r * f + i]).collect();
            let cols = table.gather(&idx);
            let dim = table.embedding_dim();
            for r in 0..rows {
                out.row_mut(r)[offset..offset + dim].copy_from_slice(cols.row(r));
            }
            offset += dim;
        }
        out
    }

    fn gather_all(&self, x: &IndexTensor) -> Matrix {
        // Single-feature shortcut: the index values feed the table directly,
        // no decomposition of the feature axis.
        if self.tables.len() == 1 {
            self.tables[0].gather(&x.data)
        } else {
            self.gather_split(x)
        }
    }

    /// Embed a batch of index tensors.
    pub fn forward(&self, x: &IndexTensor) -> Result<Tensor, FeatureError> {
        self.check_input(x)?;
        let shape = self.out_shape(x);
        let out = self.gather_all(x);
        Ok(Tensor::new(out.data, shape))
    }

    /// Embed while caching per-table indices for [`backward`](Self::backward).
    pub fn forward_train(&mut self, x: &IndexTensor) -> Result<Tensor, FeatureError> {
        self.check_input(x)?;
        let shape = self.out_shape(x);
        let f = self.tables.len();
        let rows = x.data.len() / f;
        let mut out = Matrix::zeros(rows, self.out_dim);
        let mut offset = 0;
        for (i, table) in self.tables.iter_mut().enumerate() {
            let idx: Vec<usize> = (0..rows).map(|r| x.data[r * f + i]).collect();
            let cols = table.forward_train(&idx);
            let dim = cols.cols;
            for r in 0..rows {
                out.row_mut(r)[offset..offset + dim].copy_from_slice(cols.row(r));
            }
            offset += dim;
        }
        Ok(Tensor::new(out.data, shape))
    }

    /// Route the trailing axis of `grad_out` back to the owning tables.
    /// Leading axes must match the last training forward.
    pub fn backward(&mut self, grad_out: &Tensor) {
        assert_eq!(grad_out.last_dim(), self.out_dim, "gradient width mismatch");
        let rows = grad_out.data.len() / self.out_dim;
        let mut offset = 0;
        for table in self.tables.iter_mut() {
            let dim = table.embedding_dim();
            let mut band = Matrix::zeros(rows, dim);
            for r in 0..rows {
                let base = r * self.out_dim + offset;
                band.row_mut(r)
                    .copy_from_slice(&grad_out.data[base..base + dim]);
            }
            table.backward(&band);
            offset += dim;
        }
    }

    pub fn zero_grad(&mut self) {
        for table in self.tables.iter_mut() {
            table.zero_grad();
        }
    }

    pub fn sgd_step(&mut self, lr: f32, weight_decay: f32) {
        for table in self.tables.iter_mut() {
            table.sgd_step(lr, weight_decay);
        }
    }

    pub fn adam_step(&mut self, lr: f32, beta1: f32, beta2: f32, eps: f32, weight_decay: f32) {
        for table in self.tables.iter_mut() {
            table.adam_step(lr, beta1, beta2, eps, weight_decay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_feature_shortcut_matches_generic_path() {
        let e = FeatureEmbedder::with_init(&[7], &[4], Init::Uniform { scale: 0.5 }).unwrap();
        let x = IndexTensor::new(vec![3, 0, 6, 1, 1, 2], vec![2, 3, 1]);
        let shortcut = e.gather_all(&x);
        let generic = e.gather_split(&x);
        // bit-identical, not approximately equal
        assert_eq!(shortcut.data, generic.data);
    }

    #[test]
    fn split_concatenates_in_feature_order() {
        let mut e = FeatureEmbedder::with_init(&[3, 3], &[1, 2], Init::Constant(0.0)).unwrap();
        for (i, p) in e.parameters().into_iter().enumerate() {
            p.weight.fill(i as f32 + 1.0);
        }
        let x = IndexTensor::new(vec![0, 2], vec![1, 2]);
        let out = e.forward(&x).unwrap();
        assert_eq!(out.shape, vec![1, 3]);
        assert_eq!(out.data, vec![1.0, 2.0, 2.0]);
    }

    #[test]
    fn backward_splits_gradient_by_embedding_dims() {
        let mut e = FeatureEmbedder::with_init(&[2, 2], &[1, 1], Init::Constant(0.0)).unwrap();
        let x = IndexTensor::new(vec![0, 1], vec![1, 2]);
        e.forward_train(&x).unwrap();
        e.backward(&Tensor::new(vec![3.0, 5.0], vec![1, 2]));
        let params = e.parameters();
        assert_eq!(params[0].grad_row(0), &[3.0]);
        assert_eq!(params[1].grad_row(1), &[5.0]);
    }
}
