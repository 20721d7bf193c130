// ============================================================
// Layer 4 — Sinusoidal Position Encoding
// ============================================================
// Each body-part sequence gets a fixed sinusoidal table added
// to it before it leaves the data pipeline:
//
//   pe[t, 2i]   = sin(t / 10000^(2i/d))
//   pe[t, 2i+1] = cos(t / 10000^(2i/d))
//
// Body-part widths are not always even. With an odd d the
// last channel (index d-1) is a sine with exponent (d-1)/d.
//
// Applying the table to an input (seq_len, feature_dim) adds
// pe[..seq_len, ..feature_dim]. Rows or channels beyond the
// table are left untouched.
//
// Reference: Vaswani et al. (2017) Attention Is All You Need

use ndarray::{s, Array2};
use std::{borrow::Cow, collections::HashMap};

const BASE: f64 = 10_000.0;

/// Precomputed `(max_len, d_model)` sinusoidal table.
#[derive(Debug, Clone)]
pub struct PositionEncoder {
    table: Array2<f32>,
}

impl PositionEncoder {
    pub fn new(d_model: usize, max_len: usize) -> Self {
        let d = d_model as f64;
        // Channels [0, even_dim) alternate sin/cos in pairs.
        let even_dim = if d_model % 2 == 0 { d_model } else { d_model - 1 };

        let table = Array2::from_shape_fn((max_len, d_model), |(t, c)| {
            let t = t as f64;
            let value = if c < even_dim {
                let div = BASE.powf((c - c % 2) as f64 / d);
                if c % 2 == 0 { (t / div).sin() } else { (t / div).cos() }
            } else {
                // odd width: trailing sine channel
                (t / BASE.powf((d_model - 1) as f64 / d)).sin()
            };
            value as f32
        });

        Self { table }
    }

    pub fn d_model(&self) -> usize {
        self.table.ncols()
    }

    pub fn max_len(&self) -> usize {
        self.table.nrows()
    }

    pub fn table(&self) -> &Array2<f32> {
        &self.table
    }

    /// `x + pe[..rows, ..cols]`.
    pub fn apply(&self, x: &Array2<f32>) -> Array2<f32> {
        let rows = x.nrows().min(self.max_len());
        let cols = x.ncols().min(self.d_model());

        let mut out = x.clone();
        let mut region = out.slice_mut(s![..rows, ..cols]);
        region += &self.table.slice(s![..rows, ..cols]);
        out
    }
}

// ─── PositionTables ───────────────────────────────────────────────────────────
/// Read-only cache of encoders for a fixed `max_len`, one per width.
#[derive(Debug, Clone)]
pub struct PositionTables {
    max_len:  usize,
    encoders: HashMap<usize, PositionEncoder>,
}

impl PositionTables {
    pub fn new(widths: impl IntoIterator<Item = usize>, max_len: usize) -> Self {
        let encoders = widths
            .into_iter()
            .map(|w| (w, PositionEncoder::new(w, max_len)))
            .collect();
        Self { max_len, encoders }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Cached encoder for `width`, or a freshly built one when the width
    /// was not known up front.
    pub fn encoder(&self, width: usize) -> Cow<'_, PositionEncoder> {
        match self.encoders.get(&width) {
            Some(enc) => Cow::Borrowed(enc),
            None => Cow::Owned(PositionEncoder::new(width, self.max_len)),
        }
    }

    pub fn apply(&self, x: &Array2<f32>) -> Array2<f32> {
        self.encoder(x.ncols()).apply(x)
    }
}
