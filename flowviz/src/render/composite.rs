use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::{FlowvizError, FlowvizResult};

/// `src + dst * (1 - src.a)` on premultiplied pixels.
pub(crate) fn src_over(dst: Rgba8Premul, src: Rgba8Premul) -> Rgba8Premul {
    match src.a {
        255 => src,
        0 => dst,
        a => {
            let keep = 255 - a;
            let blend = |s: u8, d: u8| s.saturating_add(scale(d, keep));
            Rgba8Premul {
                r: blend(src.r, dst.r),
                g: blend(src.g, dst.g),
                b: blend(src.b, dst.b),
                a: blend(src.a, dst.a),
            }
        }
    }
}

/// Blend a freshly rendered layer onto committed pixels. Both buffers are premultiplied RGBA8
/// of the same surface size.
pub(crate) fn composite_layer(committed: &mut [u8], layer: &[u8]) -> FlowvizResult<()> {
    if committed.len() != layer.len() || !committed.len().is_multiple_of(4) {
        return Err(FlowvizError::render(format!(
            "layer of {} bytes cannot be composited onto {} bytes",
            layer.len(),
            committed.len()
        )));
    }
    for (dst, src) in committed.chunks_exact_mut(4).zip(layer.chunks_exact(4)) {
        let out = src_over(pixel(dst), pixel(src));
        dst.copy_from_slice(&out.to_array());
    }
    Ok(())
}

fn pixel(px: &[u8]) -> Rgba8Premul {
    Rgba8Premul {
        r: px[0],
        g: px[1],
        b: px[2],
        a: px[3],
    }
}

fn scale(c: u8, f: u8) -> u8 {
    ((u32::from(c) * u32::from(f) + 127) / 255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
