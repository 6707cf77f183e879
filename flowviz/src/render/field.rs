use crate::assets::raster::RasterImage;
use crate::assets::vectors::VectorSample;
use crate::config::RenderOptions;
use crate::foundation::core::{Affine, BezPath, Point, Rect, Rgba8, Vec2};
use crate::foundation::error::FlowvizResult;
use crate::render::surface::DrawingSurface;

/// Paint used in trail mode to fade previous frames' strokes.
pub const TRAIL_FADE: Rgba8 = Rgba8::new(255, 255, 255, 26);
/// Stroke color when debug mode replaces pixel sampling.
pub const DEBUG_STROKE: Rgba8 = Rgba8::BLACK;
/// Source → destination overlay drawn in debug mode.
pub const GROUND_TRUTH_STROKE: Rgba8 = Rgba8::RED;
pub const STROKE_WIDTH: f64 = 1.0;
/// Arrowhead leg length, independent of magnitude.
pub const ARROWHEAD_SIZE: f64 = 5.0;

/// What one render call drew.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Vectors drawn on the vector layer.
    pub vectors: usize,
    /// Samples skipped because they carry no displacement.
    pub still: usize,
    /// Ground-truth overlays drawn (debug mode only).
    pub overlays: usize,
}

/// `max(dx² + dy²)` over every sample of every frame.
pub fn max_squared_displacement<F: AsRef<[VectorSample]>>(frames: &[F]) -> f64 {
    frames
        .iter()
        .flat_map(|frame| frame.as_ref().iter())
        .fold(0.0, |max, s| max.max(s.squared_displacement()))
}

/// `(dx² + dy²) / max_distance`, or `0` when the dataset has no usable maximum.
pub fn normalized_magnitude(sample: &VectorSample, max_distance: f64) -> f64 {
    if !has_usable_max(max_distance) {
        return 0.0;
    }
    let m = sample.squared_displacement() / max_distance;
    if m.is_finite() { m } else { 0.0 }
}

fn has_usable_max(max_distance: f64) -> bool {
    max_distance.is_finite() && max_distance > 0.0
}

/// Draws a frame on the image layer and its motion vectors on the vector layer.
pub struct VectorFieldRenderer<S> {
    options: RenderOptions,
    max_distance: f64,
    image_layer: S,
    vector_layer: S,
}

impl<S: DrawingSurface> VectorFieldRenderer<S> {
    /// `max_distance` is the dataset-wide [`max_squared_displacement`].
    pub fn new(options: RenderOptions, max_distance: f64, image_layer: S, vector_layer: S) -> Self {
        if max_distance <= 0.0 {
            tracing::info!("dataset has no motion, vectors will not be drawn");
        }
        Self {
            options,
            max_distance,
            image_layer,
            vector_layer,
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }

    pub fn image_layer(&self) -> &S {
        &self.image_layer
    }

    pub fn vector_layer(&self) -> &S {
        &self.vector_layer
    }

    pub fn render(
        &mut self,
        frame: &RasterImage,
        vectors: &[VectorSample],
    ) -> FlowvizResult<RenderStats> {
        self.image_layer.put_image(frame, Point::ORIGIN)?;
        self.image_layer.present()?;

        if self.options.stacked {
            self.vector_layer.clear();
        } else {
            let (w, h) = self.vector_layer.size();
            self.vector_layer
                .fill_rect(Rect::new(0.0, 0.0, f64::from(w), f64::from(h)), TRAIL_FADE);
        }

        let mut stats = RenderStats::default();
        for sample in vectors {
            if sample.is_still() {
                stats.still += 1;
                continue;
            }
            if self.draw_vector(sample) {
                stats.vectors += 1;
            }
            // The overlay is a vector stroke too; a dataset without motion draws none.
            if self.options.debug && has_usable_max(self.max_distance) {
                let mut truth = BezPath::new();
                truth.move_to((sample.src_x, sample.src_y));
                truth.line_to((sample.dst_x, sample.dst_y));
                self.vector_layer
                    .stroke_path(&truth, GROUND_TRUTH_STROKE, STROKE_WIDTH);
                stats.overlays += 1;
            }
        }

        self.vector_layer.present()?;
        Ok(stats)
    }

    fn draw_vector(&mut self, sample: &VectorSample) -> bool {
        let direction = sample.direction();
        let magnitude = normalized_magnitude(sample, self.max_distance);
        let length = magnitude * sample.width.min(sample.height);
        if !(length.is_finite() && length > 0.0) {
            return false;
        }

        let color = if self.options.debug {
            DEBUG_STROKE
        } else {
            self.image_layer
                .sample_pixel(sample.src_x, sample.src_y)
                .map_or(Rgba8::BLACK, Rgba8::to_opaque)
        };

        if self.options.arrows {
            let anchor = Vec2::new(
                sample.src_x + sample.width / 2.0,
                sample.src_y + sample.height / 2.0,
            );
            self.vector_layer
                .set_transform(Affine::translate(anchor) * Affine::rotate(direction));
            self.vector_layer
                .stroke_path(&arrow_path(length), color, STROKE_WIDTH);
            self.vector_layer.reset_transform();
        } else {
            let mut path = BezPath::new();
            path.move_to((sample.src_x, sample.src_y));
            path.line_to((
                sample.src_x + length * direction.cos(),
                sample.src_y + length * direction.sin(),
            ));
            self.vector_layer.stroke_path(&path, color, STROKE_WIDTH);
        }
        true
    }
}

/// Shaft along +x from the origin plus a two-leg head at its tip.
fn arrow_path(length: f64) -> BezPath {
    let mut path = BezPath::new();
    path.move_to((0.0, 0.0));
    path.line_to((length, 0.0));
    path.move_to((length - ARROWHEAD_SIZE, -ARROWHEAD_SIZE));
    path.line_to((length, 0.0));
    path.line_to((length - ARROWHEAD_SIZE, ARROWHEAD_SIZE));
    path
}

#[cfg(test)]
#[path = "../../tests/unit/render/field.rs"]
mod tests;
