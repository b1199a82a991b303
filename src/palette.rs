/// A true-color palette entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Packs as `0x00RRGGBB`, the layout of `wl_shm` XRGB8888.
    pub const fn to_xrgb8888(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    fn distance(self, other: Rgb) -> u32 {
        let dr = self.r.abs_diff(other.r) as u32;
        let dg = self.g.abs_diff(other.g) as u32;
        let db = self.b.abs_diff(other.b) as u32;
        dr * dr + dg * dg + db * db
    }
}

/// The 16-color EGA/VGA text palette, indexed by 4-bit color index.
pub const PALETTE: [Rgb; 16] = [
    Rgb::new(0x00, 0x00, 0x00),
    Rgb::new(0x00, 0x00, 0xAB),
    Rgb::new(0x00, 0xAB, 0x00),
    Rgb::new(0x00, 0xAB, 0xAB),
    Rgb::new(0xAB, 0x00, 0x00),
    Rgb::new(0xAB, 0x00, 0xAB),
    Rgb::new(0xAB, 0x57, 0x00),
    Rgb::new(0xAB, 0xAB, 0xAB),
    Rgb::new(0x57, 0x57, 0x57),
    Rgb::new(0x57, 0x57, 0xFF),
    Rgb::new(0x57, 0xFF, 0x57),
    Rgb::new(0x57, 0xFF, 0xFF),
    Rgb::new(0xFF, 0x57, 0x57),
    Rgb::new(0xFF, 0x57, 0xFF),
    Rgb::new(0xFF, 0xFF, 0x57),
    Rgb::new(0xFF, 0xFF, 0xFF),
];

/// Looks up a palette index; only the low 4 bits are significant.
pub const fn color(index: u8) -> Rgb {
    PALETTE[(index & 0x0F) as usize]
}

/// Index of the palette entry closest to `rgb`. Ties resolve to the lower index.
pub fn nearest(rgb: Rgb) -> u8 {
    let mut best = 0;
    let mut best_distance = u32::MAX;
    for (index, entry) in PALETTE.iter().enumerate() {
        let distance = entry.distance(rgb);
        if distance < best_distance {
            best = index as u8;
            best_distance = distance;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_xrgb() {
        assert_eq!(color(6).to_xrgb8888(), 0x00AB5700);
        assert_eq!(color(15).to_xrgb8888(), 0x00FFFFFF);
        assert_eq!(color(0x1F), color(15));
    }

    #[test]
    fn nearest_finds_exact_entries() {
        for (index, entry) in PALETTE.iter().enumerate() {
            assert_eq!(nearest(*entry) as usize, index);
        }
        assert_eq!(nearest(Rgb::new(0xF0, 0xF0, 0xF0)), 15);
        assert_eq!(nearest(Rgb::new(0x10, 0x00, 0x00)), 0);
    }
}
