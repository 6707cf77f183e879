use crate::assets::raster::RasterImage;
use crate::foundation::core::{Affine, BezPath, Point, Rect, Rgba8};
use crate::foundation::error::FlowvizResult;

/// The drawing operations the vector-field renderer needs from a graphics backend.
///
/// Drawing calls may be buffered; [`DrawingSurface::present`] commits them and
/// [`DrawingSurface::sample_pixel`] always observes committed content.
pub trait DrawingSurface {
    /// Width and height in pixels.
    fn size(&self) -> (u32, u32);

    /// Replace the pixels under `image` placed at `origin` (no blending).
    fn put_image(&mut self, image: &RasterImage, origin: Point) -> FlowvizResult<()>;

    /// Reset every pixel to transparent black.
    fn clear(&mut self);

    /// Blend a solid rectangle over the current content.
    fn fill_rect(&mut self, rect: Rect, color: Rgba8);

    /// Stroke `path` with a solid color.
    fn stroke_path(&mut self, path: &BezPath, color: Rgba8, width: f64);

    /// Color of the pixel containing `(x, y)`, `None` outside the surface.
    fn sample_pixel(&mut self, x: f64, y: f64) -> Option<Rgba8>;

    /// Transform applied to subsequent fills and strokes.
    fn set_transform(&mut self, transform: Affine);

    /// Back to the identity transform.
    fn reset_transform(&mut self) {
        self.set_transform(Affine::IDENTITY);
    }

    /// Commit buffered drawing.
    fn present(&mut self) -> FlowvizResult<()>;
}
