use std::cell::RefCell;
use std::rc::Rc;

use super::feature_embedder::FeatureEmbedder;
use crate::error::FeatureError;
use crate::tensor::{IndexTensor, Tensor};

/// Non-owning handle to a [`FeatureEmbedder`].  An embedder may be referenced
/// by several assemblers at once; optimizer updates to its tables are visible
/// to every holder.
pub type SharedEmbedder = Rc<RefCell<FeatureEmbedder>>;

/// One forward call's worth of feature groups.  Every group is individually
/// optional; any non-empty subset may be supplied.
#[derive(Default)]
pub struct AssemblerInput<'a> {
    /// `(batch, num_static_cat_features)` category indices.
    pub static_cat: Option<&'a IndexTensor>,
    /// `(batch, num_static_real_features)`.
    pub static_real: Option<&'a Tensor>,
    /// `(batch, T, num_dynamic_cat_features)` category indices.
    pub dynamic_cat: Option<&'a IndexTensor>,
    /// `(batch, T, num_dynamic_real_features)`.
    pub dynamic_real: Option<&'a Tensor>,
}

/// Combines static and dynamic, categorical and real feature groups into one
/// `(batch, T, feature)` tensor for a downstream sequence model.
///
/// Static groups are broadcast across the time axis by pure repetition;
/// categorical groups are embedded when the matching embedder is configured
/// and otherwise passed through as raw real values.  The feature axis is
/// always partitioned in the fixed order
/// `[static_cat, static_real, dynamic_cat, dynamic_real]`, absent groups
/// contributing zero width.
///
/// The assembler owns no trainable parameters; all tables belong to the
/// referenced embedders.
pub struct FeatureAssembler {
    t: usize,
    embed_static: Option<SharedEmbedder>,
    embed_dynamic: Option<SharedEmbedder>,
    // group widths of the last training forward, for backward routing
    last_widths: [usize; 4],
}

impl FeatureAssembler {
    pub fn new(
        t: usize,
        embed_static: Option<SharedEmbedder>,
        embed_dynamic: Option<SharedEmbedder>,
    ) -> Result<Self, FeatureError> {
        if t == 0 {
            return Err(FeatureError::Config(
                "time axis length T must be positive".into(),
            ));
        }
        Ok(Self {
            t,
            embed_static,
            embed_dynamic,
            last_widths: [0; 4],
        })
    }

    /// Configured time-axis length.
    pub fn time_len(&self) -> usize {
        self.t
    }

    /// Trainable tensors reachable through this assembler: one table per
    /// feature of each referenced embedder, nothing of its own.
    pub fn num_parameters(&self) -> usize {
        let count = |e: &Option<SharedEmbedder>| {
            e.as_ref().map_or(0, |e| e.borrow().num_parameters())
        };
        count(&self.embed_static) + count(&self.embed_dynamic)
    }

    fn check_rank(name: &str, shape: &[usize], rank: usize) -> Result<(), FeatureError> {
        if shape.len() != rank {
            return Err(FeatureError::Shape(format!(
                "{name} must have rank {rank}, got shape {shape:?}"
            )));
        }
        Ok(())
    }

    fn check_batch(name: &str, batch: &mut Option<usize>, b: usize) -> Result<(), FeatureError> {
        match *batch {
            Some(expected) if expected != b => Err(FeatureError::Shape(format!(
                "{name} has batch size {b}, expected {expected}"
            ))),
            _ => {
                *batch = Some(b);
                Ok(())
            }
        }
    }

    fn check_time(&self, name: &str, t: usize) -> Result<(), FeatureError> {
        if t != self.t {
            return Err(FeatureError::Shape(format!(
                "{name} has time axis {t}, assembler is configured for T = {}",
                self.t
            )));
        }
        Ok(())
    }

    fn assemble(
        &self,
        input: &AssemblerInput<'_>,
        train: bool,
    ) -> Result<(Tensor, [usize; 4]), FeatureError> {
        if input.static_cat.is_none()
            && input.static_real.is_none()
            && input.dynamic_cat.is_none()
            && input.dynamic_real.is_none()
        {
            return Err(FeatureError::Config(
                "no feature groups supplied, nothing to assemble".into(),
            ));
        }

        let mut batch = None;
        let mut parts: Vec<Tensor> = Vec::with_capacity(4);
        let mut widths = [0usize; 4];

        if let Some(sc) = input.static_cat {
            Self::check_rank("static_cat", &sc.shape, 2)?;
            Self::check_batch("static_cat", &mut batch, sc.shape[0])?;
            let embedded = Self::embed(&self.embed_static, sc, train)?;
            widths[0] = embedded.last_dim();
            parts.push(embedded.repeat_over_time(self.t));
        }
        if let Some(sr) = input.static_real {
            Self::check_rank("static_real", &sr.shape, 2)?;
            Self::check_batch("static_real", &mut batch, sr.shape[0])?;
            widths[1] = sr.last_dim();
            parts.push(sr.repeat_over_time(self.t));
        }
        if let Some(dc) = input.dynamic_cat {
            Self::check_rank("dynamic_cat", &dc.shape, 3)?;
            Self::check_batch("dynamic_cat", &mut batch, dc.shape[0])?;
            self.check_time("dynamic_cat", dc.shape[1])?;
            let embedded = Self::embed(&self.embed_dynamic, dc, train)?;
            widths[2] = embedded.last_dim();
            parts.push(embedded);
        }
        if let Some(dr) = input.dynamic_real {
            Self::check_rank("dynamic_real", &dr.shape, 3)?;
            Self::check_batch("dynamic_real", &mut batch, dr.shape[0])?;
            self.check_time("dynamic_real", dr.shape[1])?;
            widths[3] = dr.last_dim();
            parts.push(dr.clone());
        }

        let refs: Vec<&Tensor> = parts.iter().collect();
        Ok((Tensor::concat_last(&refs), widths))
    }

    /// Embed a categorical group, or pass the raw category values through as
    /// real features when no embedder is configured for the group.
    fn embed(
        embedder: &Option<SharedEmbedder>,
        x: &IndexTensor,
        train: bool,
    ) -> Result<Tensor, FeatureError> {
        match embedder {
            Some(e) if train => e.borrow_mut().forward_train(x),
            Some(e) => e.borrow().forward(x),
            None => Ok(x.to_real()),
        }
    }

    /// Assemble one batch into a `(batch, T, total_feature_width)` tensor.
    pub fn forward(&self, input: &AssemblerInput<'_>) -> Result<Tensor, FeatureError> {
        self.assemble(input, false).map(|(out, _)| out)
    }

    /// Assemble while recording group widths and caching embedder lookups so
    /// a later [`backward`](Self::backward) can route gradients.
    pub fn forward_train(&mut self, input: &AssemblerInput<'_>) -> Result<Tensor, FeatureError> {
        let (out, widths) = self.assemble(input, true)?;
        self.last_widths = widths;
        Ok(out)
    }

    /// Split `grad` (shaped like the last training forward's output) along
    /// the feature axis and route the categorical slices to the referenced
    /// embedders.  Static slices are summed over the time axis first, the
    /// adjoint of the broadcast.  Slices of real or passthrough groups carry
    /// no trainable parameters here and are dropped.
    pub fn backward(&mut self, grad: &Tensor) {
        assert_eq!(grad.shape.len(), 3, "gradient must be (batch, T, feature)");
        assert_eq!(
            grad.last_dim(),
            self.last_widths.iter().sum::<usize>(),
            "gradient width does not match last forward"
        );
        let [w_sc, w_sr, w_dc, _] = self.last_widths;
        if w_sc > 0 {
            if let Some(e) = &self.embed_static {
                let slice = grad.slice_last(0, w_sc).sum_over_time();
                e.borrow_mut().backward(&slice);
            }
        }
        if w_dc > 0 {
            if let Some(e) = &self.embed_dynamic {
                let slice = grad.slice_last(w_sc + w_sr, w_dc);
                e.borrow_mut().backward(&slice);
            }
        }
    }
}
