use crate::assets::raster::RasterImage;
use crate::foundation::core::{Affine, BezPath, Point, Rect, Rgba8, Rgba8Premul};
use crate::foundation::error::{FlowvizError, FlowvizResult};
use crate::render::composite::composite_layer;
use crate::render::surface::DrawingSurface;

/// CPU raster surface powered by `vello_cpu`.
///
/// Fills and strokes are recorded into a render context and composited over the existing pixels
/// on [`DrawingSurface::present`], so content persists across frames until cleared.
pub struct CpuSurface {
    width: u16,
    height: u16,
    pixmap: vello_cpu::Pixmap,
    ctx: Option<vello_cpu::RenderContext>,
    transform: Affine,
}

impl CpuSurface {
    pub fn new(width: u32, height: u32) -> FlowvizResult<Self> {
        if width == 0 || height == 0 {
            return Err(FlowvizError::validation("surface width and height must be > 0"));
        }
        let width_u16: u16 = width
            .try_into()
            .map_err(|_| FlowvizError::validation("surface width exceeds u16"))?;
        let height_u16: u16 = height
            .try_into()
            .map_err(|_| FlowvizError::validation("surface height exceeds u16"))?;

        Ok(Self {
            width: width_u16,
            height: height_u16,
            pixmap: vello_cpu::Pixmap::new(width_u16, height_u16),
            ctx: None,
            transform: Affine::IDENTITY,
        })
    }

    /// Committed pixels, premultiplied RGBA8, row-major.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    /// Committed pixel at integer coordinates.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8Premul> {
        if x >= u32::from(self.width) || y >= u32::from(self.height) {
            return None;
        }
        let i = (y as usize * usize::from(self.width) + x as usize) * 4;
        let px = &self.data()[i..i + 4];
        Some(Rgba8Premul {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        })
    }

    fn ctx(&mut self) -> &mut vello_cpu::RenderContext {
        let (width, height) = (self.width, self.height);
        let ctx = self
            .ctx
            .get_or_insert_with(|| vello_cpu::RenderContext::new(width, height));
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx
    }
}

impl DrawingSurface for CpuSurface {
    fn size(&self) -> (u32, u32) {
        (u32::from(self.width), u32::from(self.height))
    }

    fn put_image(&mut self, image: &RasterImage, origin: Point) -> FlowvizResult<()> {
        self.present()?;

        let (sw, sh) = (i64::from(self.width), i64::from(self.height));
        let (ox, oy) = (origin.x.floor() as i64, origin.y.floor() as i64);
        let (iw, ih) = (i64::from(image.width()), i64::from(image.height()));

        let x0 = ox.max(0);
        let x1 = (ox + iw).min(sw);
        if x0 >= x1 {
            return Ok(());
        }

        let src = image.pixels();
        let dst = self.pixmap.data_as_u8_slice_mut();
        for y in oy.max(0)..(oy + ih).min(sh) {
            let src_row = (y - oy) as usize * iw as usize;
            let dst_row = y as usize * sw as usize;
            for x in x0..x1 {
                let s = (src_row + (x - ox) as usize) * 4;
                let d = (dst_row + x as usize) * 4;
                let px = Rgba8::new(src[s], src[s + 1], src[s + 2], src[s + 3]).premultiply();
                dst[d..d + 4].copy_from_slice(&px.to_array());
            }
        }
        Ok(())
    }

    fn clear(&mut self) {
        // Buffered drawing would land under a cleared surface; drop it.
        self.ctx = None;
        clear_pixmap(&mut self.pixmap, Rgba8Premul::transparent().to_array());
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba8) {
        let transform = affine_to_cpu(self.transform);
        let ctx = self.ctx();
        ctx.set_transform(transform);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            color.r, color.g, color.b, color.a,
        ));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(rect.x0, rect.y0, rect.x1, rect.y1));
    }

    fn stroke_path(&mut self, path: &BezPath, color: Rgba8, width: f64) {
        let transform = affine_to_cpu(self.transform);
        let cpu_path = bezpath_to_cpu(path);
        let ctx = self.ctx();
        ctx.set_transform(transform);
        ctx.set_stroke(vello_cpu::kurbo::Stroke::new(width));
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            color.r, color.g, color.b, color.a,
        ));
        ctx.stroke_path(&cpu_path);
    }

    fn sample_pixel(&mut self, x: f64, y: f64) -> Option<Rgba8> {
        if self.present().is_err() || !x.is_finite() || !y.is_finite() {
            return None;
        }
        let (x, y) = (x.floor(), y.floor());
        if x < 0.0 || y < 0.0 {
            return None;
        }
        self.pixel(x as u32, y as u32).map(Rgba8Premul::to_straight)
    }

    fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
    }

    fn present(&mut self) -> FlowvizResult<()> {
        let Some(mut ctx) = self.ctx.take() else {
            return Ok(());
        };
        let mut layer = vello_cpu::Pixmap::new(self.width, self.height);
        ctx.flush();
        ctx.render_to_pixmap(&mut layer);
        composite_layer(self.pixmap.data_as_u8_slice_mut(), layer.data_as_u8_slice())
    }
}

fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap, rgba: [u8; 4]) {
    let data = pixmap.data_as_u8_slice_mut();
    for px in data.chunks_exact_mut(4) {
        px.copy_from_slice(&rgba);
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
