//! Headless double-buffered RGB surface
//!
//! Drawing goes to a back buffer; `present` swaps it to the front buffer that
//! `read_pixels` reads from.

use contracts::{DisplaySurface, ImageView, Viewport};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct SoftwareSurface {
    width: u32,
    height: u32,
    back: Vec<u8>,
    front: Vec<u8>,
    fullscreen: bool,
    presented: u64,
}

impl SoftwareSurface {
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * 3;
        Self {
            width,
            height,
            back: vec![0; len],
            front: vec![0; len],
            fullscreen: false,
            presented: 0,
        }
    }

    /// Number of `present` calls so far
    pub fn presented(&self) -> u64 {
        self.presented
    }

    /// Presented frame as RGB rows, top row first
    pub fn front_rgb(&self) -> &[u8] {
        &self.front
    }
}

impl DisplaySurface for SoftwareSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.back.fill(0);
    }

    /// Nearest-neighbour stretch of `image` into `viewport`, clipped to the surface
    fn upload(&mut self, viewport: Viewport, image: ImageView<'_>) {
        let (cols, rows) = (image.dims.cols as usize, image.dims.rows as usize);
        let stride = image.dims.stride as usize;
        if cols == 0 || rows == 0 || image.data.len() < stride * (rows - 1) + cols * 3 {
            debug!(cols, rows, len = image.data.len(), "upload skipped, image too small");
            return;
        }

        let x_end = (viewport.x + viewport.width).min(self.width) as usize;
        let y_end = (viewport.y + viewport.height).min(self.height) as usize;
        let (vx, vy) = (viewport.x as usize, viewport.y as usize);
        let (vw, vh) = (viewport.width as usize, viewport.height as usize);
        let surface_stride = self.width as usize * 3;

        for y in vy..y_end {
            let src_row = (y - vy) * rows / vh;
            let src = &image.data[src_row * stride..];
            let dst = &mut self.back[y * surface_stride..(y + 1) * surface_stride];
            for x in vx..x_end {
                let src_col = (x - vx) * cols / vw;
                dst[x * 3..x * 3 + 3].copy_from_slice(&src[src_col * 3..src_col * 3 + 3]);
            }
        }
    }

    fn present(&mut self) {
        self.front.copy_from_slice(&self.back);
        self.presented += 1;
    }

    fn toggle_fullscreen(&mut self) -> bool {
        self.fullscreen = !self.fullscreen;
        self.fullscreen
    }

    fn read_pixels(&self) -> Vec<u8> {
        let stride = self.width as usize * 3;
        let mut out = Vec::with_capacity(self.front.len());
        for row in self.front.chunks_exact(stride).rev() {
            for px in row.chunks_exact(3) {
                out.extend_from_slice(&[px[2], px[1], px[0]]);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::FrameDims;

    #[test]
    fn test_upload_stretches_into_viewport() {
        let mut surface = SoftwareSurface::new(4, 2);
        // 1x1 red image fills the left half
        let red = [255u8, 0, 0];
        surface.upload(
            Viewport {
                x: 0,
                y: 0,
                width: 2,
                height: 2,
            },
            ImageView {
                dims: FrameDims::rgb(1, 1),
                data: &red,
            },
        );
        surface.present();
        let rgb = surface.front_rgb();
        assert_eq!(&rgb[0..3], &[255, 0, 0]);
        assert_eq!(&rgb[3..6], &[255, 0, 0]);
        assert_eq!(&rgb[6..9], &[0, 0, 0]);
        assert_eq!(&rgb[12..15], &[255, 0, 0]);
        assert_eq!(surface.presented(), 1);
    }

    #[test]
    fn test_read_pixels_is_bgr_bottom_up() {
        let mut surface = SoftwareSurface::new(1, 2);
        let top_then_bottom = [1u8, 2, 3, 4, 5, 6];
        surface.upload(
            Viewport {
                x: 0,
                y: 0,
                width: 1,
                height: 2,
            },
            ImageView {
                dims: FrameDims::rgb(1, 2),
                data: &top_then_bottom,
            },
        );
        surface.present();
        assert_eq!(surface.read_pixels(), vec![6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_clear_only_affects_back_buffer() {
        let mut surface = SoftwareSurface::new(1, 1);
        let white = [255u8; 3];
        let vp = Viewport {
            x: 0,
            y: 0,
            width: 1,
            height: 1,
        };
        surface.upload(vp, ImageView { dims: FrameDims::rgb(1, 1), data: &white });
        surface.present();
        surface.clear();
        assert_eq!(surface.front_rgb(), &[255, 255, 255]);
        surface.present();
        assert_eq!(surface.front_rgb(), &[0, 0, 0]);
    }

    #[test]
    fn test_fullscreen_toggle() {
        let mut surface = SoftwareSurface::new(2, 2);
        assert!(surface.toggle_fullscreen());
        assert!(!surface.toggle_fullscreen());
        assert_eq!(surface.size(), (2, 2));
    }
}
