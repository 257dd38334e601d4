use std::sync::atomic::{AtomicUsize, Ordering};

static GATHER_OPS: AtomicUsize = AtomicUsize::new(0);

pub fn reset_gather_ops() {
    GATHER_OPS.store(0, Ordering::SeqCst);
}

pub fn gather_ops_count() -> usize {
    GATHER_OPS.load(Ordering::SeqCst)
}

pub(crate) fn inc_gathers() {
    GATHER_OPS.fetch_add(1, Ordering::SeqCst);
}

/// Dense row-major matrix used as embedding-table storage.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f32>,
}

impl Matrix {
    pub fn zeros(r: usize, c: usize) -> Self {
        Matrix {
            rows: r,
            cols: c,
            data: vec![0.0; r * c],
        }
    }

    pub fn from_vec(r: usize, c: usize, v: Vec<f32>) -> Self {
        assert_eq!(v.len(), r * c);
        Matrix {
            rows: r,
            cols: c,
            data: v,
        }
    }

    pub fn get(&self, r: usize, c: usize) -> f32 {
        self.data[r * self.cols + c]
    }

    pub fn set(&mut self, r: usize, c: usize, v: f32) {
        self.data[r * self.cols + c] = v;
    }

    pub fn row(&self, r: usize) -> &[f32] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn row_mut(&mut self, r: usize) -> &mut [f32] {
        &mut self.data[r * self.cols..(r + 1) * self.cols]
    }

    /// Overwrite every element with `v`.
    pub fn fill(&mut self, v: f32) {
        for x in self.data.iter_mut() {
            *x = v;
        }
    }
}
