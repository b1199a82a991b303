use crate::palette::{self, Rgb};

/// A heap-owned image of palette indices, rows packed at `stride == width`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedImage {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl IndexedImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.width
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub(super) fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y * self.width + x])
    }

    pub fn rgb(&self, x: usize, y: usize) -> Option<Rgb> {
        self.pixel(x, y).map(palette::color)
    }

    /// Expands to XRGB8888 little-endian bytes, each pixel repeated `scale` times
    /// in both directions. Row stride of the result is `width * scale * 4`.
    pub fn to_xrgb8888(&self, scale: usize) -> Vec<u8> {
        let scale = scale.max(1);
        let out_width = self.width * scale;
        let mut out = Vec::with_capacity(out_width * self.height * scale * 4);
        let mut line = Vec::with_capacity(out_width * 4);

        for row in self.pixels.chunks_exact(self.width.max(1)) {
            line.clear();
            for &index in row {
                let bytes = palette::color(index).to_xrgb8888().to_le_bytes();
                for _ in 0..scale {
                    line.extend_from_slice(&bytes);
                }
            }
            for _ in 0..scale {
                out.extend_from_slice(&line);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xrgb_expansion_scales() {
        let mut image = IndexedImage::new(2, 1);
        image.pixels_mut().copy_from_slice(&[1, 15]);

        let out = image.to_xrgb8888(2);
        assert_eq!(out.len(), 2 * 2 * 2 * 4);
        // blue, blue, white, white on both lines
        let blue = [0xAB, 0x00, 0x00, 0x00];
        let white = [0xFF, 0xFF, 0xFF, 0x00];
        for line in out.chunks_exact(16) {
            assert_eq!(&line[0..4], &blue);
            assert_eq!(&line[4..8], &blue);
            assert_eq!(&line[8..12], &white);
            assert_eq!(&line[12..16], &white);
        }
    }

    #[test]
    fn pixel_bounds() {
        let image = IndexedImage::new(3, 2);
        assert_eq!(image.pixel(2, 1), Some(0));
        assert_eq!(image.pixel(3, 0), None);
        assert_eq!(image.rgb(0, 0), Some(Rgb::new(0, 0, 0)));
    }
}
