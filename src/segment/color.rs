//! Class color tables.

/// Packed `0xAARRGGBB` color per class.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColorTable {
    colors: Vec<u32>,
}

/// Pascal VOC palette for its 21 classes, background first.
const PASCAL_VOC: [u32; 21] = [
    0xFF00_0000,
    0xFF80_0000,
    0xFF00_8000,
    0xFF80_8000,
    0xFF00_0080,
    0xFF80_0080,
    0xFF00_8080,
    0xFF80_8080,
    0xFF40_0000,
    0xFFC0_0000,
    0xFF40_8000,
    0xFFC0_8000,
    0xFF40_0080,
    0xFFC0_0080,
    0xFF40_8080,
    0xFFC0_8080,
    0xFF00_4000,
    0xFF80_4000,
    0xFF00_C000,
    0xFF80_C000,
    0xFF00_4080,
];

impl ColorTable {
    /// Creates a table from packed colors indexed by class.
    pub fn new(colors: Vec<u32>) -> Self {
        Self { colors }
    }

    /// The Pascal VOC segmentation palette.
    pub fn pascal_voc() -> Self {
        Self::new(PASCAL_VOC.to_vec())
    }

    /// Returns the number of colors.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Returns true if the table has no colors.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Returns the color for `class`, if present.
    pub fn get(&self, class: usize) -> Option<u32> {
        self.colors.get(class).copied()
    }

    /// Color lookup for classes already checked against the table length.
    #[inline]
    pub(crate) fn color(&self, class: usize) -> u32 {
        self.colors[class]
    }
}

/// Expands packed `0xAARRGGBB` colors into `R, G, B, A` bytes.
pub fn argb_to_rgba(colors: &[u32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(colors.len() * 4);
    for &color in colors {
        out.push((color >> 16) as u8);
        out.push((color >> 8) as u8);
        out.push(color as u8);
        out.push((color >> 24) as u8);
    }
    out
}
