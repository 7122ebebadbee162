//! PNG loading into pixel maps and pattern outline rendering

use std::path::Path;

use image::{Rgba, RgbaImage};

use crate::analysis::palette::{ColorPalette, to_hex};
use crate::io::configuration::{OUTLINE_WIDTH, VISUALIZATION_PIXEL_SIZE};
use crate::io::error::{AlgorithmError, Result};
use crate::spatial::grid::Grid;
use crate::spatial::pattern::{ColorIndex, Direction, Pattern, PatternType, Position};

/// Outline colour of single-pixel patterns
pub const SINGLE_OUTLINE: [u8; 4] = [231, 76, 60, 255];
/// Outline colour of horizontal runs
pub const HORIZONTAL_OUTLINE: [u8; 4] = [46, 204, 113, 255];
/// Outline colour of vertical runs
pub const VERTICAL_OUTLINE: [u8; 4] = [52, 152, 219, 255];

const BACKGROUND: [u8; 4] = [255, 255, 255, 255];
const CELL_PADDING: u32 = 1;

/// Coloured pixels of a source image on an art-pixel canvas
#[derive(Debug, Clone, PartialEq)]
pub struct PixelMap {
    /// Canvas width in art pixels
    pub width: usize,
    /// Canvas height in art pixels
    pub height: usize,
    /// Every non-transparent art pixel with its colour index
    pub pixels: Vec<(Position, ColorIndex)>,
    /// Colours of the indices used in `pixels`
    pub palette: ColorPalette,
    /// Source pixels per art pixel along each axis
    pub scale: u32,
}

impl PixelMap {
    /// Load a PNG; fully transparent pixels are left empty
    ///
    /// With `detect_scale`, an image upscaled by an integer factor is reduced
    /// back to one canvas pixel per art pixel.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file at the given path cannot be opened or read
    /// - The file is not a valid image format
    pub fn from_png_file<P: AsRef<Path>>(path: P, detect_scale: bool) -> Result<Self> {
        let path_buf = path.as_ref().to_path_buf();
        let img = image::open(&path_buf).map_err(|e| AlgorithmError::ImageLoad {
            path: path_buf,
            source: e,
        })?;
        Ok(Self::from_rgba_image(&img.to_rgba8(), detect_scale))
    }

    /// Build a pixel map from decoded RGBA data
    pub fn from_rgba_image(img: &RgbaImage, detect_scale: bool) -> Self {
        let scale = if detect_scale {
            detect_block_size(img)
        } else {
            1
        };

        let width = img.width() / scale;
        let height = img.height() / scale;
        let mut palette = ColorPalette::new();
        let mut pixels = Vec::new();

        // Row-major scan keeps colour indices stable across runs
        for y in 0..height {
            for x in 0..width {
                let Some(pixel) = img.get_pixel_checked(x * scale, y * scale) else {
                    continue;
                };
                if is_transparent(pixel) {
                    continue;
                }
                let color = palette.index_or_insert(pixel.0);
                pixels.push((Position::new(x as i32, y as i32), color));
            }
        }

        Self {
            width: width as usize,
            height: height as usize,
            pixels,
            palette,
            scale,
        }
    }

    /// Keep only the pixels of one colour, which becomes index 0
    ///
    /// Alpha is ignored when matching, like everywhere else in the palette.
    ///
    /// # Errors
    ///
    /// Returns an error if no pixel has the colour
    pub fn retain_color(self, color: [u8; 4]) -> Result<Self> {
        let Some(kept) = self.palette.index_of(color) else {
            return Err(AlgorithmError::InvalidSourceData {
                reason: format!("no pixel has the colour {}", to_hex(color)),
            });
        };

        let mut palette = ColorPalette::new();
        let index = palette.index_or_insert(color);
        let pixels = self
            .pixels
            .into_iter()
            .filter(|&(_, c)| c == kept)
            .map(|(position, _)| (position, index))
            .collect();

        Ok(Self {
            pixels,
            palette,
            ..self
        })
    }

    /// Initial all-single grid of the coloured pixels
    ///
    /// # Errors
    ///
    /// Returns an error if a pixel cannot be placed on the canvas
    pub fn to_grid(&self) -> Result<Grid> {
        Grid::from_pixel_grid(self.pixels.iter().copied(), self.width, self.height)
    }
}

const fn is_transparent(pixel: &Rgba<u8>) -> bool {
    pixel.0[3] == 0
}

/// Side length of the art pixels of an integer-upscaled image
///
/// The candidate is the largest solid square at the first non-transparent
/// pixel (capped at half the shorter side). It is only accepted if both
/// dimensions are multiples of it and every aligned block is solid; smaller
/// candidates are tried next, down to 1.
pub fn detect_block_size(img: &RgbaImage) -> u32 {
    let (width, height) = img.dimensions();
    let Some((start_x, start_y)) = img
        .enumerate_pixels()
        .find(|(_, _, pixel)| !is_transparent(pixel))
        .map(|(x, y, _)| (x, y))
    else {
        return 1;
    };

    let limit = width.min(height) / 2;
    let mut candidate = 1;
    while candidate < limit && is_solid_block(img, start_x, start_y, candidate + 1) {
        candidate += 1;
    }

    (2..=candidate)
        .rev()
        .find(|&size| {
            width % size == 0
                && height % size == 0
                && (0..height / size).all(|by| {
                    (0..width / size).all(|bx| is_solid_block(img, bx * size, by * size, size))
                })
        })
        .unwrap_or(1)
}

fn is_solid_block(img: &RgbaImage, x: u32, y: u32, size: u32) -> bool {
    let Some(first) = img.get_pixel_checked(x, y) else {
        return false;
    };
    (0..size).all(|dy| {
        (0..size).all(|dx| {
            img.get_pixel_checked(x + dx, y + dy)
                .is_some_and(|pixel| pixel == first)
        })
    })
}

/// Outline colour of a pattern shape
pub const fn outline_color(pattern_type: PatternType) -> [u8; 4] {
    match pattern_type {
        PatternType::Single => SINGLE_OUTLINE,
        PatternType::Horizontal => HORIZONTAL_OUTLINE,
        PatternType::Vertical => VERTICAL_OUTLINE,
    }
}

/// Render every pattern in its colour with a type-coloured outline
pub fn render_pattern_outlines(grid: &Grid, palette: &ColorPalette, pixel_size: u32) -> RgbaImage {
    let pixel_size = pixel_size.max(1);
    let mut img = RgbaImage::from_pixel(
        grid.width() as u32 * pixel_size,
        grid.height() as u32 * pixel_size,
        Rgba(BACKGROUND),
    );

    for pattern in grid.patterns() {
        let fill = palette.color(pattern.color()).unwrap_or(BACKGROUND);
        for pos in pattern.pixels() {
            fill_cell(&mut img, pos, pixel_size, CELL_PADDING, fill);
        }
        draw_outline(&mut img, pattern, pixel_size);
    }

    img
}

fn fill_cell(img: &mut RgbaImage, pos: Position, pixel_size: u32, padding: u32, color: [u8; 4]) {
    let (Ok(x), Ok(y)) = (u32::try_from(pos.x), u32::try_from(pos.y)) else {
        return;
    };
    let padding = padding.min(pixel_size / 2);
    for dy in padding..pixel_size - padding {
        for dx in padding..pixel_size - padding {
            if let Some(pixel) = img.get_pixel_mut_checked(x * pixel_size + dx, y * pixel_size + dy) {
                *pixel = Rgba(color);
            }
        }
    }
}

// Strokes the cell edges that face outside the pattern
fn draw_outline(img: &mut RgbaImage, pattern: &Pattern, pixel_size: u32) {
    let color = Rgba(outline_color(pattern.pattern_type()));
    let stroke = OUTLINE_WIDTH.min(pixel_size);

    for pos in pattern.pixels() {
        let (Ok(x), Ok(y)) = (u32::try_from(pos.x), u32::try_from(pos.y)) else {
            continue;
        };
        let (left, top) = (x * pixel_size, y * pixel_size);

        for direction in Direction::ALL {
            let (dx, dy) = direction.delta();
            if pattern.contains(pos.offset(dx, dy)) {
                continue;
            }
            let (x_range, y_range) = match direction {
                Direction::Up => (left..left + pixel_size, top..top + stroke),
                Direction::Down => (
                    left..left + pixel_size,
                    top + pixel_size - stroke..top + pixel_size,
                ),
                Direction::Left => (left..left + stroke, top..top + pixel_size),
                Direction::Right => (
                    left + pixel_size - stroke..left + pixel_size,
                    top..top + pixel_size,
                ),
            };
            for py in y_range {
                for px in x_range.clone() {
                    if let Some(pixel) = img.get_pixel_mut_checked(px, py) {
                        *pixel = color;
                    }
                }
            }
        }
    }
}

/// Save the pattern outline rendering as a PNG
///
/// # Errors
///
/// Returns an error if:
/// - The parent directory cannot be created
/// - The image cannot be saved to the specified path
pub fn export_pattern_visualization(
    grid: &Grid,
    palette: &ColorPalette,
    output_path: &Path,
) -> Result<()> {
    let img = render_pattern_outlines(grid, palette, VISUALIZATION_PIXEL_SIZE);

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| AlgorithmError::FileSystem {
            path: parent.to_path_buf(),
            operation: "create directory",
            source: e,
        })?;
    }

    img.save(output_path)
        .map_err(|e| AlgorithmError::ImageExport {
            path: output_path.to_path_buf(),
            source: e,
        })?;

    Ok(())
}
