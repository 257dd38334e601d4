use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::math::{self, Matrix};

static STREAM: AtomicU64 = AtomicU64::new(0);

/// `StdRng` seeded from the `SEED` environment variable.  Each call draws a
/// distinct deterministic stream via an incrementing counter offset.
fn rng_from_env() -> StdRng {
    let base = std::env::var("SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    let idx = STREAM.fetch_add(1, Ordering::SeqCst);
    StdRng::seed_from_u64(base + idx)
}

/// Weight initialization policy for embedding tables.
#[derive(Clone, Copy, Debug)]
pub enum Init {
    /// Uniform values in `(-scale/2, scale/2)`.
    Uniform { scale: f32 },
    /// Every weight set to the same value.  Mostly useful in tests.
    Constant(f32),
}

impl Default for Init {
    fn default() -> Self {
        Init::Uniform { scale: 0.02 }
    }
}

impl Init {
    fn table(&self, rows: usize, cols: usize) -> Matrix {
        match *self {
            Init::Uniform { scale } => {
                let mut rng = rng_from_env();
                Matrix::from_vec(
                    rows,
                    cols,
                    (0..rows * cols)
                        .map(|_| (rng.gen::<f32>() - 0.5) * scale)
                        .collect(),
                )
            }
            Init::Constant(v) => Matrix::from_vec(rows, cols, vec![v; rows * cols]),
        }
    }
}

// One trainable lookup table for a single categorical feature.  The forward
// op is a row gather; backward scatter-adds into the gradient rows of the
// indices cached by the last training forward.  Adam statistics live on the
// table so optimizer state persists across iterations.

#[derive(Debug)]
pub struct EmbeddingTable {
    pub weight: Matrix,
    grad: Matrix,
    m: Matrix,
    v: Matrix,
    t: usize,
    last_idx: Vec<usize>,
}

impl EmbeddingTable {
    pub fn new(cardinality: usize, embedding_dim: usize) -> Self {
        Self::with_init(cardinality, embedding_dim, Init::default())
    }

    pub fn with_init(cardinality: usize, embedding_dim: usize, init: Init) -> Self {
        let weight = init.table(cardinality, embedding_dim);
        let grad = Matrix::zeros(cardinality, embedding_dim);
        let m = Matrix::zeros(cardinality, embedding_dim);
        let v = Matrix::zeros(cardinality, embedding_dim);
        Self {
            weight,
            grad,
            m,
            v,
            t: 0,
            last_idx: Vec::new(),
        }
    }

    pub fn cardinality(&self) -> usize {
        self.weight.rows
    }

    pub fn embedding_dim(&self) -> usize {
        self.weight.cols
    }

    /// Read one weight row per index.  Indices must lie in
    /// `[0, cardinality)`; this is not validated in release builds.
    pub fn gather(&self, indices: &[usize]) -> Matrix {
        math::inc_gathers();
        let dim = self.weight.cols;
        let mut out = Matrix::zeros(indices.len(), dim);
        for (r, &idx) in indices.iter().enumerate() {
            debug_assert!(
                idx < self.weight.rows,
                "category index {idx} out of range for cardinality {}",
                self.weight.rows
            );
            out.row_mut(r).copy_from_slice(self.weight.row(idx));
        }
        out
    }

    /// Gather that caches the indices for a subsequent [`backward`](Self::backward).
    pub fn forward_train(&mut self, indices: &[usize]) -> Matrix {
        self.last_idx = indices.to_vec();
        self.gather(indices)
    }

    /// Accumulate `grad_out` (one row per cached index) into the gradient
    /// rows addressed by the last training forward.
    pub fn backward(&mut self, grad_out: &Matrix) {
        assert_eq!(grad_out.rows, self.last_idx.len());
        assert_eq!(grad_out.cols, self.weight.cols);
        for (r, &idx) in self.last_idx.iter().enumerate() {
            let src = grad_out.row(r);
            let dst = self.grad.row_mut(idx);
            for (d, s) in dst.iter_mut().zip(src.iter()) {
                *d += s;
            }
        }
    }

    pub fn zero_grad(&mut self) {
        self.grad = Matrix::zeros(self.grad.rows, self.grad.cols);
    }

    pub fn sgd_step(&mut self, lr: f32, weight_decay: f32) {
        for i in 0..self.grad.data.len() {
            let g = self.grad.data[i] + weight_decay * self.weight.data[i];
            self.weight.data[i] -= lr * g;
        }
    }

    pub fn adam_step(&mut self, lr: f32, beta1: f32, beta2: f32, eps: f32, weight_decay: f32) {
        self.t += 1;
        for i in 0..self.grad.data.len() {
            let g = self.grad.data[i] + weight_decay * self.weight.data[i];
            self.m.data[i] = beta1 * self.m.data[i] + (1.0 - beta1) * g;
            self.v.data[i] = beta2 * self.v.data[i] + (1.0 - beta2) * g * g;
            let m_hat = self.m.data[i] / (1.0 - beta1.powi(self.t as i32));
            let v_hat = self.v.data[i] / (1.0 - beta2.powi(self.t as i32));
            self.weight.data[i] -= lr * m_hat / (v_hat.sqrt() + eps);
        }
    }

    #[cfg(test)]
    pub(crate) fn grad_row(&self, r: usize) -> &[f32] {
        self.grad.row(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gather_reads_rows() {
        let mut e = EmbeddingTable::with_init(3, 2, Init::Constant(0.0));
        e.weight = Matrix::from_vec(3, 2, vec![0.0, 0.1, 1.0, 1.1, 2.0, 2.1]);
        let out = e.gather(&[2, 0]);
        assert_eq!(out.row(0), &[2.0, 2.1]);
        assert_eq!(out.row(1), &[0.0, 0.1]);
    }

    #[test]
    fn backward_scatter_adds_into_looked_up_rows() {
        let mut e = EmbeddingTable::with_init(4, 2, Init::Constant(0.0));
        e.forward_train(&[1, 3, 1]);
        let grad_out = Matrix::from_vec(3, 2, vec![1.0, 1.0, 0.5, 0.5, 1.0, 1.0]);
        e.backward(&grad_out);
        assert_eq!(e.grad_row(0), &[0.0, 0.0]);
        assert_eq!(e.grad_row(1), &[2.0, 2.0]);
        assert_eq!(e.grad_row(2), &[0.0, 0.0]);
        assert_eq!(e.grad_row(3), &[0.5, 0.5]);
    }

    #[test]
    fn adam_step_only_touches_rows_with_gradient() {
        let mut e = EmbeddingTable::with_init(2, 1, Init::Constant(1.0));
        e.forward_train(&[0]);
        e.backward(&Matrix::from_vec(1, 1, vec![2.0]));
        e.adam_step(0.1, 0.9, 0.999, 1e-8, 0.0);
        assert!(e.weight.get(0, 0) < 1.0);
        assert_eq!(e.weight.get(1, 0), 1.0);
    }

    #[test]
    fn sgd_step_moves_weights_against_gradient() {
        let mut e = EmbeddingTable::with_init(2, 1, Init::Constant(1.0));
        e.forward_train(&[0]);
        e.backward(&Matrix::from_vec(1, 1, vec![2.0]));
        e.sgd_step(0.5, 0.0);
        assert_eq!(e.weight.get(0, 0), 0.0);
        assert_eq!(e.weight.get(1, 0), 1.0);
    }
}
