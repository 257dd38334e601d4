/// N-dimensional tensor backed by a flat `Vec<f32>`.
///
/// The tensor stores its shape explicitly allowing operations on
/// higher-rank data.  Embedding tables live in the 2-D
/// [`Matrix`](crate::math::Matrix) type; the embedder flattens leading axes
/// into rows at that boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    /// Tensor elements in row-major order.
    pub data: Vec<f32>,
    /// Sizes for each dimension.
    pub shape: Vec<usize>,
}

impl Tensor {
    /// Create a new tensor from raw parts.  The number of elements in `data`
    /// must match the product of the requested `shape`.
    pub fn new(data: Vec<f32>, shape: Vec<usize>) -> Self {
        assert_eq!(data.len(), shape.iter().product::<usize>());
        Tensor { data, shape }
    }

    pub fn zeros(shape: Vec<usize>) -> Self {
        let len: usize = shape.iter().product();
        Tensor {
            data: vec![0.0; len],
            shape,
        }
    }

    /// Compute the flat index for a multi-dimensional coordinate.
    fn offset(&self, idx: &[usize]) -> usize {
        assert_eq!(idx.len(), self.shape.len());
        let mut stride = 1;
        let mut off = 0usize;
        for (i, &dim) in self.shape.iter().rev().enumerate() {
            let id = idx[self.shape.len() - 1 - i];
            assert!(id < dim, "index out of bounds");
            off += id * stride;
            stride *= dim;
        }
        off
    }

    /// Basic immutable indexing.
    pub fn get(&self, idx: &[usize]) -> f32 {
        let off = self.offset(idx);
        self.data[off]
    }

    /// Mutable indexing support.
    pub fn set(&mut self, idx: &[usize], value: f32) {
        let off = self.offset(idx);
        self.data[off] = value;
    }

    /// Length of the trailing axis.
    pub fn last_dim(&self) -> usize {
        *self.shape.last().unwrap_or(&0)
    }

    /// Repeat a `(batch, k)` tensor `t` times along a new middle axis,
    /// producing `(batch, t, k)`.  Every time step sees the same values.
    pub fn repeat_over_time(&self, t: usize) -> Tensor {
        assert_eq!(self.shape.len(), 2, "repeat_over_time expects rank 2");
        let (batch, k) = (self.shape[0], self.shape[1]);
        let mut out = Vec::with_capacity(batch * t * k);
        for b in 0..batch {
            let row = &self.data[b * k..(b + 1) * k];
            for _ in 0..t {
                out.extend_from_slice(row);
            }
        }
        Tensor {
            data: out,
            shape: vec![batch, t, k],
        }
    }

    /// Collapse a `(batch, t, k)` tensor to `(batch, k)` by summing over the
    /// time axis.  Adjoint of [`repeat_over_time`](Self::repeat_over_time).
    pub fn sum_over_time(&self) -> Tensor {
        assert_eq!(self.shape.len(), 3, "sum_over_time expects rank 3");
        let (batch, t, k) = (self.shape[0], self.shape[1], self.shape[2]);
        let mut out = vec![0.0; batch * k];
        for b in 0..batch {
            for s in 0..t {
                let base = (b * t + s) * k;
                for j in 0..k {
                    out[b * k + j] += self.data[base + j];
                }
            }
        }
        Tensor {
            data: out,
            shape: vec![batch, k],
        }
    }

    /// Concatenate tensors along the trailing axis.  All inputs must share
    /// the same leading axes.
    pub fn concat_last(parts: &[&Tensor]) -> Tensor {
        assert!(!parts.is_empty());
        let lead = &parts[0].shape[..parts[0].shape.len() - 1];
        let rows: usize = lead.iter().product();
        let widths: Vec<usize> = parts
            .iter()
            .map(|p| {
                assert_eq!(&p.shape[..p.shape.len() - 1], lead, "leading axes differ");
                p.last_dim()
            })
            .collect();
        let total: usize = widths.iter().sum();
        let mut out = Vec::with_capacity(rows * total);
        for r in 0..rows {
            for (p, &w) in parts.iter().zip(widths.iter()) {
                out.extend_from_slice(&p.data[r * w..(r + 1) * w]);
            }
        }
        let mut shape = lead.to_vec();
        shape.push(total);
        Tensor { data: out, shape }
    }

    /// Slice a width-`width` band starting at `start` out of the trailing
    /// axis, keeping all leading axes.
    pub fn slice_last(&self, start: usize, width: usize) -> Tensor {
        let last = self.last_dim();
        assert!(start + width <= last, "slice exceeds trailing axis");
        let rows = self.data.len() / last;
        let mut out = Vec::with_capacity(rows * width);
        for r in 0..rows {
            let base = r * last + start;
            out.extend_from_slice(&self.data[base..base + width]);
        }
        let mut shape = self.shape.clone();
        *shape.last_mut().unwrap() = width;
        Tensor { data: out, shape }
    }
}

/// Integer-valued tensor holding category indices.
///
/// Mirrors [`Tensor`] but stores `usize` values; the last axis enumerates
/// categorical features, every leading axis is batch-like.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexTensor {
    pub data: Vec<usize>,
    pub shape: Vec<usize>,
}

impl IndexTensor {
    pub fn new(data: Vec<usize>, shape: Vec<usize>) -> Self {
        assert_eq!(data.len(), shape.iter().product::<usize>());
        IndexTensor { data, shape }
    }

    pub fn last_dim(&self) -> usize {
        *self.shape.last().unwrap_or(&0)
    }

    /// Reinterpret raw category values as real-valued features.  Used when a
    /// categorical group is supplied without an embedder.
    pub fn to_real(&self) -> Tensor {
        Tensor {
            data: self.data.iter().map(|&v| v as f32).collect(),
            shape: self.shape.clone(),
        }
    }
}
