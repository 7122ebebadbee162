//! Bidirectional mapping between RGBA colours and colour indices
//!
//! Indices are handed out in first-seen order, so a row-major scan of the same
//! image always produces the same mapping. Colours are keyed on their RGB
//! channels only: pixels that differ just in alpha share one index, stored
//! opaque, matching the `#rrggbb` form of the colour map.

use std::collections::HashMap;

use crate::spatial::pattern::ColorIndex;

/// RGBA colour, one byte per channel
pub type Rgba = [u8; 4];

/// Colour index allocator used by the presentation layers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorPalette {
    colors: Vec<Rgba>,
    indices: HashMap<Rgba, ColorIndex>,
}

impl ColorPalette {
    /// Create an empty palette
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `color`, allocating the next free index for a new colour
    pub fn index_or_insert(&mut self, color: Rgba) -> ColorIndex {
        let color = opaque(color);
        if let Some(&index) = self.indices.get(&color) {
            return index;
        }
        let index = self.colors.len() as ColorIndex;
        self.colors.push(color);
        self.indices.insert(color, index);
        index
    }

    /// Index of a known colour
    pub fn index_of(&self, color: Rgba) -> Option<ColorIndex> {
        self.indices.get(&opaque(color)).copied()
    }

    /// Colour of a known index
    pub fn color(&self, index: ColorIndex) -> Option<Rgba> {
        self.colors.get(index as usize).copied()
    }

    /// `#rrggbb` rendering of a known index
    pub fn hex(&self, index: ColorIndex) -> Option<String> {
        self.color(index).map(to_hex)
    }

    /// Number of distinct colours
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Whether no colour has been seen
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Colours in index order
    pub fn colors(&self) -> &[Rgba] {
        &self.colors
    }

    /// `(index, colour)` pairs in index order
    pub fn entries(&self) -> impl Iterator<Item = (ColorIndex, Rgba)> + '_ {
        self.colors
            .iter()
            .enumerate()
            .map(|(index, color)| (index as ColorIndex, *color))
    }
}

/// Same colour with full alpha
pub const fn opaque(color: Rgba) -> Rgba {
    let [r, g, b, _] = color;
    [r, g, b, u8::MAX]
}

/// `#rrggbb` rendering of a colour; alpha is dropped
pub fn to_hex(color: Rgba) -> String {
    let [r, g, b, _] = color;
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Parse `#rrggbb` or `#rgb` into an opaque colour
pub fn parse_hex(text: &str) -> Option<Rgba> {
    let digits = text.trim().strip_prefix('#')?;
    let channel = |pair: &str| u8::from_str_radix(pair, 16).ok();

    match digits.len() {
        6 => Some([
            channel(digits.get(0..2)?)?,
            channel(digits.get(2..4)?)?,
            channel(digits.get(4..6)?)?,
            u8::MAX,
        ]),
        3 => {
            let mut rgba = [0, 0, 0, u8::MAX];
            for (slot, offset) in rgba.iter_mut().zip(0..3) {
                let nibble = channel(digits.get(offset..=offset)?)?;
                *slot = nibble * 17;
            }
            Some(rgba)
        }
        _ => None,
    }
}
