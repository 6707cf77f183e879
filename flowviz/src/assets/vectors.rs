use crate::foundation::error::{FlowvizError, FlowvizResult};

/// Discriminator value of the samples the visualizer keeps.
pub const RETAINED_SOURCE: i64 = 1;

/// One motion vector anchored at a source pixel.
///
/// `dx`/`dy` are taken as given and never re-derived from the endpoints.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VectorSample {
    pub source: i64,
    pub src_x: f64,
    pub src_y: f64,
    pub dst_x: f64,
    pub dst_y: f64,
    pub dx: f64,
    pub dy: f64,
    /// Cell width associated with the sample.
    pub width: f64,
    /// Cell height associated with the sample.
    pub height: f64,
}

impl VectorSample {
    /// `true` when the sample carries no displacement.
    pub fn is_still(&self) -> bool {
        self.dx == 0.0 && self.dy == 0.0
    }

    /// `dx² + dy²`; the squared metric is what magnitudes are normalized against.
    pub fn squared_displacement(&self) -> f64 {
        self.dx * self.dx + self.dy * self.dy
    }

    /// Angle from source to destination pixel, in radians.
    pub fn direction(&self) -> f64 {
        (self.dst_y - self.src_y).atan2(self.dst_x - self.src_x)
    }
}

/// Parse one frame's vector file (a JSON array of records) and keep `source == 1` samples.
///
/// Record order is preserved.
pub fn decode_vector_samples(bytes: &[u8]) -> FlowvizResult<Vec<VectorSample>> {
    let samples: Vec<VectorSample> = serde_json::from_slice(bytes)
        .map_err(|e| FlowvizError::vector_format(e.to_string()))?;
    Ok(samples
        .into_iter()
        .filter(|s| s.source == RETAINED_SOURCE)
        .collect())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/vectors.rs"]
mod tests;
