use image::DynamicImage;
use image::imageops::FilterType;
use kmeans_colors::get_kmeans;
use palette::{FromColor, Hsv, Srgb};
use std::path::Path;
use thiserror::Error;

/// Clusters used when picking a spine color from a cover.
pub const DEFAULT_CLUSTER_COUNT: usize = 3;
/// Covers are resampled to this edge length before clustering.
const SAMPLE_EDGE: u32 = 100;
const KMEANS_MAX_ITERATIONS: usize = 20;
const KMEANS_CONVERGENCE: f32 = 0.0025;
/// Fixed seed so repeated runs pick the same color for the same cover.
const KMEANS_SEED: u64 = 0;

/// Brightness ceiling for text rendered in a spine color.
const TEXT_BRIGHTNESS_TARGET: u32 = 100;

#[derive(Debug, Error)]
pub enum ColorError {
    #[error("failed to read cover image: {0}")]
    Image(#[from] image::ImageError),
}

/// Cluster the image's pixels and return the `count` dominant colors.
///
/// The image is first resized to 100x100 so the runtime does not depend on
/// the cover resolution. Requires `count >= 1`.
pub fn dominant_colors(image: &DynamicImage, count: usize) -> Vec<Srgb<f32>> {
    let sample = image.resize_exact(SAMPLE_EDGE, SAMPLE_EDGE, FilterType::Triangle);
    let pixels: Vec<Srgb<f32>> = sample
        .to_rgb8()
        .pixels()
        .map(|px| {
            Srgb::new(
                f32::from(px[0]) / 255.0,
                f32::from(px[1]) / 255.0,
                f32::from(px[2]) / 255.0,
            )
        })
        .collect();
    let result = get_kmeans(
        count,
        KMEANS_MAX_ITERATIONS,
        KMEANS_CONVERGENCE,
        false,
        &pixels,
        KMEANS_SEED,
    );
    result.centroids
}

/// Pick the most saturated-and-bright palette entry, as a hex string.
///
/// Ties keep the earlier palette entry. Returns `None` only for an empty
/// palette.
pub fn select_spine_color(palette: &[Srgb<f32>]) -> Option<String> {
    let mut best: Option<(f32, Srgb<f32>)> = None;
    for &candidate in palette {
        let hsv = Hsv::from_color(candidate);
        let score = hsv.saturation * hsv.value;
        match best {
            Some((top, _)) if score <= top => {}
            _ => best = Some((score, candidate)),
        }
    }
    best.map(|(_, color)| format_hex(color))
}

/// Spine color for a decoded cover. Requires `cluster_count >= 1`.
pub fn spine_color(image: &DynamicImage, cluster_count: usize) -> String {
    let palette = dominant_colors(image, cluster_count);
    select_spine_color(&palette).expect("cluster_count >= 1 yields a non-empty palette")
}

/// Spine color straight from a cover file on disk.
pub fn spine_color_from_path<P: AsRef<Path>>(
    path: P,
    cluster_count: usize,
) -> Result<String, ColorError> {
    let image = image::open(path)?;
    Ok(spine_color(&image, cluster_count))
}

/// `#rrggbb` for a float color, channels clamped to 0-255.
pub fn format_hex(color: Srgb<f32>) -> String {
    let r = (color.red * 255.0).clamp(0.0, 255.0) as u8;
    let g = (color.green * 255.0).clamp(0.0, 255.0) as u8;
    let b = (color.blue * 255.0).clamp(0.0, 255.0) as u8;
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Parse `#rrggbb` into channels; `None` for anything else.
pub fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
    let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
    let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Darken a spine color until text in it stays readable.
///
/// Perceived brightness is the usual `(299 r + 587 g + 114 b) / 1000`; colors
/// above the target get the excess subtracted from every channel, flooring at
/// zero. Colors at or below the target come back unchanged.
pub fn darken_for_text(hex: &str) -> Option<String> {
    let (r, g, b) = parse_hex(hex)?;
    let brightness =
        (u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114) as f64 / 1000.0;
    if brightness as u32 <= TEXT_BRIGHTNESS_TARGET {
        return Some(format!("#{r:02x}{g:02x}{b:02x}"));
    }
    // brightness is at most 255, so the excess always fits a channel
    let excess = (brightness as u32 - TEXT_BRIGHTNESS_TARGET) as u8;
    Some(format!(
        "#{:02x}{:02x}{:02x}",
        r.saturating_sub(excess),
        g.saturating_sub(excess),
        b.saturating_sub(excess)
    ))
}
