use crate::models::Book;
use rand::Rng;
use serde::Serialize;

/// Rendered spine height bounds in pixels.
pub const MIN_HEIGHT: u32 = 50;
pub const MAX_HEIGHT: u32 = 110;
/// Rendered spine width bounds in pixels.
pub const MIN_WIDTH: u32 = 12;
pub const MAX_WIDTH: u32 = 32;

/// Estimated thickness in centimeters per page, for books without dimensions.
const PAGES_TO_THICKNESS: f64 = 0.0075;

/// On-screen geometry and styling for one book spine.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Spine {
    pub height: u32,
    pub width: u32,
    pub color: Option<String>,
    /// Five-star books get a marker on the shelf.
    pub starred: bool,
}

impl Spine {
    /// Derive a spine from book metadata.
    ///
    /// Missing dimensions fall back to plausible random values, so pass a
    /// seeded generator when layouts need to be reproducible.
    pub fn new(book: &Book, rng: &mut impl Rng) -> Self {
        let dims = book.dimensions.as_ref();
        Spine {
            height: compute_height(dims.and_then(|d| d.height), rng),
            width: compute_width(dims.and_then(|d| d.thickness), book.pages, rng),
            color: book.spine_color.clone(),
            starred: book.review.rating == Some(5),
        }
    }

    /// Horizontal margin freed up when this spine leans by `tilt_degrees`.
    pub fn margin(&self, tilt_degrees: f64) -> f64 {
        compute_margin(self.height, self.width, tilt_degrees)
    }
}

/// Pixel height from a physical height in cm; random 16-25 cm when unknown.
pub fn compute_height(height_cm: Option<f64>, rng: &mut impl Rng) -> u32 {
    let cm = match height_cm {
        Some(height) if height > 0.0 => height,
        _ => f64::from(rng.gen_range(16..=25u32)),
    };
    scale_to_pixels(cm, MIN_HEIGHT, MAX_HEIGHT)
}

/// Pixel width from thickness in cm, estimated from the page count when the
/// thickness is unknown and random (0.5-2 cm) when both are missing.
pub fn compute_width(thickness_cm: Option<f64>, pages: Option<u32>, rng: &mut impl Rng) -> u32 {
    let cm = match thickness_cm {
        Some(thickness) if thickness > 0.0 => thickness,
        _ => match pages {
            Some(pages) if pages > 0 => f64::from(pages) * PAGES_TO_THICKNESS,
            _ => f64::from(rng.gen_range(1..=4u32)) / 2.0,
        },
    };
    scale_to_pixels(cm, MIN_WIDTH, MAX_WIDTH)
}

fn scale_to_pixels(cm: f64, min: u32, max: u32) -> u32 {
    ((cm * 4.0).round() as i64).clamp(i64::from(min), i64::from(max)) as u32
}

/// Horizontal room gained by tilting a spine of the given pixel size.
///
/// A tilted spine projects `height * cos(90deg - tilt) + width * cos(tilt)`
/// onto the shelf; half of the excess over the upright width is margin on
/// each side.
pub fn compute_margin(height: u32, width: u32, tilt_degrees: f64) -> f64 {
    let tilt = tilt_degrees.abs();
    let projected = f64::from(height) * (90.0 - tilt).to_radians().cos()
        + f64::from(width) * tilt.to_radians().cos();
    (projected - f64::from(width)) / 2.0
}
