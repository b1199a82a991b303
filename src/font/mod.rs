//! Glyph tables: 256 fixed-height bitmaps, one byte per scanline.
//!
//! The built-in table is the VGA 8x16 code page 437 set. A table can also be
//! loaded from a raw dump (`256 * height` bytes, as extracted from a video
//! BIOS) or from a PSF1 console font.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::debug;

mod vga8x16;

pub const GLYPH_COUNT: usize = 256;
pub const MAX_GLYPH_HEIGHT: usize = 32;

const PSF1_MAGIC: [u8; 2] = [0x36, 0x04];
const PSF1_MODE_512: u8 = 0x01;
const PSF1_HEADER_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphTable {
    height: usize,
    data: Cow<'static, [u8]>,
}

impl GlyphTable {
    pub fn builtin() -> Self {
        Self {
            height: 16,
            data: Cow::Borrowed(&vga8x16::VGA_8X16[..]),
        }
    }

    /// Raw dump: glyphs back to back, height inferred from the length.
    pub fn from_raw(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() || bytes.len() % GLYPH_COUNT != 0 {
            return Err(anyhow!(
                "raw font size {} is not a multiple of {GLYPH_COUNT} glyphs",
                bytes.len()
            ));
        }
        let height = bytes.len() / GLYPH_COUNT;
        check_height(height)?;
        Ok(Self {
            height,
            data: Cow::Owned(bytes),
        })
    }

    /// PSF1 console font. 512-glyph fonts keep only the first 256 glyphs.
    pub fn from_psf1(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < PSF1_HEADER_LEN || bytes[..2] != PSF1_MAGIC {
            return Err(anyhow!("missing PSF1 header"));
        }
        let mode = bytes[2];
        let height = bytes[3] as usize;
        check_height(height)?;

        let stored = if mode & PSF1_MODE_512 != 0 { 512 } else { GLYPH_COUNT };
        let body = &bytes[PSF1_HEADER_LEN..];
        if body.len() < stored * height {
            return Err(anyhow!(
                "PSF1 font truncated: {} glyph bytes, expected {}",
                body.len(),
                stored * height
            ));
        }

        Ok(Self {
            height,
            data: Cow::Owned(body[..GLYPH_COUNT * height].to_vec()),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes =
            fs::read(path).with_context(|| format!("read font {}", path.display()))?;
        let table = if bytes.starts_with(&PSF1_MAGIC) {
            Self::from_psf1(&bytes)
        } else {
            Self::from_raw(bytes)
        }
        .with_context(|| format!("parse font {}", path.display()))?;

        debug!(path = %path.display(), height = table.height, "loaded glyph table");
        Ok(table)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Scanlines of glyph `code`. Codes past the table yield an empty slice.
    pub fn glyph(&self, code: u8) -> &[u8] {
        let start = code as usize * self.height;
        self.data.get(start..start + self.height).unwrap_or(&[])
    }

    /// One scanline; anything outside the table reads as blank.
    pub fn row(&self, code: u8, y: usize) -> u8 {
        self.glyph(code).get(y).copied().unwrap_or(0)
    }
}

impl Default for GlyphTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn check_height(height: usize) -> Result<()> {
    if !(1..=MAX_GLYPH_HEIGHT).contains(&height) {
        return Err(anyhow!(
            "glyph height {height} outside 1..={MAX_GLYPH_HEIGHT}"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_all_glyphs() {
        let table = GlyphTable::builtin();
        assert_eq!(table.height(), 16);
        assert_eq!(table.glyph(0).len(), 16);
        assert_eq!(table.glyph(255).len(), 16);
    }

    #[test]
    fn builtin_shapes() {
        let table = GlyphTable::builtin();
        assert!(table.glyph(b' ').iter().all(|&row| row == 0));
        assert!(table.glyph(0xDB).iter().all(|&row| row == 0xFF));
        assert!(table.glyph(b'A').iter().any(|&row| row != 0));
        // left half block lights the four left-most pixels
        assert_eq!(table.row(0xDD, 5), 0xF0);
    }

    #[test]
    fn row_out_of_range_is_blank() {
        let table = GlyphTable::builtin();
        assert_eq!(table.row(0xDB, 16), 0);
        assert_eq!(table.row(0xDB, 15), 0xFF);
    }

    #[test]
    fn raw_infers_height() {
        let mut bytes = vec![0u8; GLYPH_COUNT * 8];
        bytes[b'x' as usize * 8 + 3] = 0x42;
        let table = GlyphTable::from_raw(bytes).unwrap();
        assert_eq!(table.height(), 8);
        assert_eq!(table.row(b'x', 3), 0x42);
    }

    #[test]
    fn raw_rejects_bad_sizes() {
        assert!(GlyphTable::from_raw(vec![]).is_err());
        assert!(GlyphTable::from_raw(vec![0; 1000]).is_err());
        assert!(GlyphTable::from_raw(vec![0; GLYPH_COUNT * 64]).is_err());
    }

    #[test]
    fn psf1_keeps_first_256_glyphs() {
        let mut bytes = vec![0x36, 0x04, PSF1_MODE_512, 14];
        let mut body = vec![0u8; 512 * 14];
        body[255 * 14] = 0x81;
        body[256 * 14] = 0xFF;
        bytes.extend_from_slice(&body);

        let table = GlyphTable::from_psf1(&bytes).unwrap();
        assert_eq!(table.height(), 14);
        assert_eq!(table.row(255, 0), 0x81);
    }

    #[test]
    fn psf1_rejects_truncated_body() {
        let mut bytes = vec![0x36, 0x04, 0, 16];
        bytes.extend_from_slice(&[0u8; 100]);
        assert!(GlyphTable::from_psf1(&bytes).is_err());
        assert!(GlyphTable::from_psf1(&[0x36]).is_err());
    }
}
