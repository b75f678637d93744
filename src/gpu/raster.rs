//! Software GPU: executes a finished ordering table into a framebuffer
//!
//! No depth buffer. Primitives are drawn in table order, so correctness
//! depends on the depth keys chosen while building the frame.

use super::frame::FrameSlot;
use super::primitive::{MaskMode, Primitive, TextureRef, Uv};
use super::vram::{unpack_rgb15, Vram, STP_BIT};
use crate::gte::{Rgb, ScreenXY};

/// Consumer of completed frames
pub trait DisplaySink {
    /// Draw the presenting slot; returns once the frame is complete
    fn present(&mut self, frame: &FrameSlot);
}

/// RGBA8 framebuffer for software rendering
pub struct Framebuffer {
    pub pixels: Vec<u8>,
    pub width: usize,
    pub height: usize,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![0; width * height * 4],
            width,
            height,
        }
    }

    pub fn clear(&mut self, color: Rgb) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&[color.r, color.g, color.b, 255]);
        }
    }

    pub fn get_pixel(&self, x: usize, y: usize) -> Rgb {
        let idx = (y * self.width + x) * 4;
        Rgb::new(self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2])
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, color: Rgb) {
        if x < self.width && y < self.height {
            let idx = (y * self.width + x) * 4;
            self.pixels[idx..idx + 4].copy_from_slice(&[color.r, color.g, color.b, 255]);
        }
    }
}

/// One corner of a triangle being rasterised
#[derive(Debug, Clone, Copy)]
struct Corner {
    xy: ScreenXY,
    rgb: Rgb,
    uv: Option<Uv>,
}

/// Barycentric weights of `(px, py)`, or `None` for a degenerate triangle
fn barycentric(px: f32, py: f32, v1: ScreenXY, v2: ScreenXY, v3: ScreenXY) -> Option<[f32; 3]> {
    let (x1, y1) = (v1.x as f32, v1.y as f32);
    let (x2, y2) = (v2.x as f32, v2.y as f32);
    let (x3, y3) = (v3.x as f32, v3.y as f32);

    let d = (y2 - y3) * (x1 - x3) + (x3 - x2) * (y1 - y3);
    if d.abs() < 0.0001 {
        return None;
    }

    let u = ((y2 - y3) * (px - x3) + (x3 - x2) * (py - y3)) / d;
    let v = ((y3 - y1) * (px - x3) + (x1 - x3) * (py - y3)) / d;
    Some([u, v, 1.0 - u - v])
}

fn lerp_channel(w: &[f32; 3], a: u8, b: u8, c: u8) -> u8 {
    (w[0] * a as f32 + w[1] * b as f32 + w[2] * c as f32).clamp(0.0, 255.0) as u8
}

/// Texture colour modulated by vertex colour; 128 is neutral
fn modulate(texel: Rgb, shade: Rgb) -> Rgb {
    let m = |t: u8, s: u8| ((t as u32 * s as u32) >> 7).min(255) as u8;
    Rgb::new(m(texel.r, shade.r), m(texel.g, shade.g), m(texel.b, shade.b))
}

/// Back/2 + front/2
fn blend_half(back: Rgb, front: Rgb) -> Rgb {
    let h = |b: u8, f: u8| (b / 2) + (f / 2);
    Rgb::new(h(back.r, front.r), h(back.g, front.g), h(back.b, front.b))
}

pub struct SoftGpu {
    pub framebuffer: Framebuffer,
    pub vram: Vram,
    mask: MaskMode,
    /// Polygons drawn during the last `present`
    pub drawn: usize,
}

impl SoftGpu {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            framebuffer: Framebuffer::new(width, height),
            vram: Vram::new(),
            mask: MaskMode::Normal,
            drawn: 0,
        }
    }

    pub fn draw(&mut self, prim: &Primitive) {
        if let Primitive::Mask(mode) = prim {
            self.mask = *mode;
            return;
        }

        let corners: Vec<Corner> = prim
            .vertices()
            .into_iter()
            .map(|(xy, rgb, uv)| Corner { xy, rgb, uv })
            .collect();
        let tex = prim.texture().filter(|t| !t.is_none());
        let semi = prim.is_semi_trans();

        self.rasterize_triangle([corners[0], corners[1], corners[2]], tex, semi);
        if corners.len() == 4 {
            self.rasterize_triangle([corners[1], corners[3], corners[2]], tex, semi);
        }
        self.drawn += 1;
    }

    fn rasterize_triangle(&mut self, c: [Corner; 3], tex: Option<TextureRef>, semi_trans: bool) {
        let fb_w = self.framebuffer.width as i32;
        let fb_h = self.framebuffer.height as i32;

        let min_x = c.iter().map(|k| k.xy.x as i32).min().unwrap_or(0).max(0);
        let max_x = c.iter().map(|k| k.xy.x as i32).max().unwrap_or(-1).min(fb_w - 1);
        let min_y = c.iter().map(|k| k.xy.y as i32).min().unwrap_or(0).max(0);
        let max_y = c.iter().map(|k| k.xy.y as i32).max().unwrap_or(-1).min(fb_h - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let Some(w) = barycentric(x as f32, y as f32, c[0].xy, c[1].xy, c[2].xy) else {
                    return;
                };

                const ERR: f32 = -0.0001;
                if w[0] < ERR || w[1] < ERR || w[2] < ERR {
                    continue;
                }

                let shade = Rgb::new(
                    lerp_channel(&w, c[0].rgb.r, c[1].rgb.r, c[2].rgb.r),
                    lerp_channel(&w, c[0].rgb.g, c[1].rgb.g, c[2].rgb.g),
                    lerp_channel(&w, c[0].rgb.b, c[1].rgb.b, c[2].rgb.b),
                );

                let mut color = shade;
                if let Some(tex) = tex {
                    let uv = |k: usize| c[k].uv.unwrap_or_default();
                    let sample = Uv::new(
                        lerp_channel(&w, uv(0).u, uv(1).u, uv(2).u),
                        lerp_channel(&w, uv(0).v, uv(1).v, uv(2).v),
                    );
                    let texel = self.vram.texel(tex, sample);
                    if texel == 0 {
                        continue;
                    }
                    if self.mask == MaskMode::FromSource && texel & STP_BIT == 0 {
                        continue;
                    }
                    color = modulate(unpack_rgb15(texel), shade);
                }

                if semi_trans {
                    color = blend_half(self.framebuffer.get_pixel(x as usize, y as usize), color);
                }
                self.framebuffer.set_pixel(x as usize, y as usize, color);
            }
        }
    }
}

impl DisplaySink for SoftGpu {
    fn present(&mut self, frame: &FrameSlot) {
        self.framebuffer.clear(frame.clear_color);
        self.mask = MaskMode::Normal;
        self.drawn = 0;
        for (_, prim) in frame.ot.iter(&frame.arena) {
            self.draw(prim);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::{encode_clut, encode_tpage, PixelMode, PolySpec};

    fn flat(xy: &[ScreenXY], rgb: Rgb, semi_trans: bool) -> Primitive {
        Primitive::polygon(&PolySpec {
            xy,
            rgb: &[rgb],
            texture: None,
            smooth: false,
            semi_trans,
        })
    }

    fn big_tri() -> [ScreenXY; 3] {
        [ScreenXY::new(0, 0), ScreenXY::new(30, 0), ScreenXY::new(0, 30)]
    }

    fn submit(slot: &mut FrameSlot, prim: Primitive, key: usize) {
        let h = slot.arena.alloc(prim).unwrap();
        slot.ot.insert(h, key, &mut slot.arena);
    }

    #[test]
    fn test_near_overdraws_far_regardless_of_submission() {
        let mut slot = FrameSlot::new(16, 4096, Rgb::BLACK);
        let red = Rgb::new(255, 0, 0);
        let blue = Rgb::new(0, 0, 255);
        submit(&mut slot, flat(&big_tri(), blue, false), 2);
        submit(&mut slot, flat(&big_tri(), red, false), 10);

        let mut gpu = SoftGpu::new(32, 32);
        gpu.present(&slot);
        assert_eq!(gpu.framebuffer.get_pixel(5, 5), blue);
        assert_eq!(gpu.framebuffer.get_pixel(31, 31), Rgb::BLACK);
        assert_eq!(gpu.drawn, 2);
    }

    #[test]
    fn test_quad_covers_both_halves() {
        let mut slot = FrameSlot::new(4, 4096, Rgb::BLACK);
        let xy = [
            ScreenXY::new(2, 2),
            ScreenXY::new(20, 2),
            ScreenXY::new(2, 20),
            ScreenXY::new(20, 20),
        ];
        submit(&mut slot, flat(&xy, Rgb::WHITE, false), 0);
        let mut gpu = SoftGpu::new(32, 32);
        gpu.present(&slot);
        assert_eq!(gpu.framebuffer.get_pixel(4, 4), Rgb::WHITE);
        assert_eq!(gpu.framebuffer.get_pixel(18, 18), Rgb::WHITE);
        assert_eq!(gpu.framebuffer.get_pixel(25, 25), Rgb::BLACK);
    }

    #[test]
    fn test_semi_transparent_averages() {
        let mut slot = FrameSlot::new(4, 4096, Rgb::new(200, 100, 0));
        submit(&mut slot, flat(&big_tri(), Rgb::new(0, 100, 200), true), 0);
        let mut gpu = SoftGpu::new(32, 32);
        gpu.present(&slot);
        assert_eq!(gpu.framebuffer.get_pixel(3, 3), Rgb::new(100, 100, 100));
    }

    #[test]
    fn test_texture_transparency_and_mask_mode() {
        let mut gpu = SoftGpu::new(32, 32);
        let tpage = encode_tpage(PixelMode::Direct15, 0, 320, 0);
        let tex = TextureRef::new(tpage, encode_clut(0, 480));

        let textured = |texel_x: u8| {
            let uv = [Uv::new(texel_x, 0); 3];
            Primitive::polygon(&PolySpec {
                xy: &big_tri(),
                rgb: &[Rgb::GRAY],
                texture: Some((&uv, tex)),
                smooth: false,
                semi_trans: false,
            })
        };
        // Texel 0 transparent, texel 1 opaque without STP, texel 2 opaque with STP
        gpu.vram.upload(320, 0, 3, &[0x0000, 0x001F, 0x8000 | 0x03E0]);

        gpu.framebuffer.clear(Rgb::BLACK);
        gpu.draw(&textured(0));
        assert_eq!(gpu.framebuffer.get_pixel(3, 3), Rgb::BLACK);

        gpu.draw(&textured(1));
        assert_eq!(gpu.framebuffer.get_pixel(3, 3), Rgb::new(248, 0, 0));

        gpu.framebuffer.clear(Rgb::BLACK);
        gpu.draw(&Primitive::Mask(MaskMode::FromSource));
        gpu.draw(&textured(1));
        assert_eq!(gpu.framebuffer.get_pixel(3, 3), Rgb::BLACK);
        gpu.draw(&textured(2));
        assert_eq!(gpu.framebuffer.get_pixel(3, 3), Rgb::new(0, 248, 0));
    }

    #[test]
    fn test_modulate_neutral_at_128() {
        let t = Rgb::new(10, 200, 255);
        assert_eq!(modulate(t, Rgb::GRAY), t);
        assert_eq!(modulate(t, Rgb::WHITE), Rgb::new(19, 255, 255));
    }
}
