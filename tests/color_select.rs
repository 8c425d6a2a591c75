use image::{DynamicImage, Rgb, RgbImage};
use palette::Srgb;
use shelf_rs::color::{
    DEFAULT_CLUSTER_COUNT, darken_for_text, dominant_colors, format_hex, parse_hex,
    select_spine_color, spine_color, spine_color_from_path,
};
use tempfile::tempdir;

fn solid(r: u8, g: u8, b: u8, size: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(size, size, Rgb([r, g, b])))
}

#[test]
fn format_hex_clamps_channels() {
    assert_eq!(format_hex(Srgb::new(1.0, 0.0, 0.0)), "#ff0000");
    assert_eq!(format_hex(Srgb::new(0.0, 0.0, 0.0)), "#000000");
    assert_eq!(format_hex(Srgb::new(2.0, -1.0, 1.0)), "#ff00ff");
}

#[test]
fn parse_hex_accepts_only_full_hex_strings() {
    assert_eq!(parse_hex("#ff0080"), Some((255, 0, 128)));
    assert_eq!(parse_hex("ff0080"), None);
    assert_eq!(parse_hex("#fff"), None);
    assert_eq!(parse_hex("#gg0000"), None);
    assert_eq!(parse_hex("#ff00€0"), None);
}

#[test]
fn select_prefers_saturated_bright_colors() {
    let gray = Srgb::new(0.5, 0.5, 0.5);
    let dull_red = Srgb::new(0.3, 0.1, 0.1);
    let red = Srgb::new(1.0, 0.0, 0.0);
    let picked = select_spine_color(&[gray, dull_red, red]).unwrap();
    assert_eq!(picked, "#ff0000");
}

#[test]
fn select_breaks_ties_towards_the_first_entry() {
    // red and blue both have saturation 1 and value 1
    let red = Srgb::new(1.0, 0.0, 0.0);
    let blue = Srgb::new(0.0, 0.0, 1.0);
    assert_eq!(select_spine_color(&[red, blue]).unwrap(), "#ff0000");
    assert_eq!(select_spine_color(&[blue, red]).unwrap(), "#0000ff");
}

#[test]
fn select_of_empty_palette_is_none() {
    assert_eq!(select_spine_color(&[]), None);
}

#[test]
fn solid_cover_yields_its_own_color() {
    let cover = solid(200, 40, 40, 64);
    let palette = dominant_colors(&cover, DEFAULT_CLUSTER_COUNT);
    assert_eq!(palette.len(), DEFAULT_CLUSTER_COUNT);
    let hex = spine_color(&cover, DEFAULT_CLUSTER_COUNT);
    let (r, g, b) = parse_hex(&hex).unwrap();
    assert!(r.abs_diff(200) <= 3, "got {hex}");
    assert!(g.abs_diff(40) <= 3, "got {hex}");
    assert!(b.abs_diff(40) <= 3, "got {hex}");
}

#[test]
fn two_tone_cover_picks_one_of_its_tones() {
    let mut image = RgbImage::new(100, 100);
    for (x, _, px) in image.enumerate_pixels_mut() {
        *px = if x < 50 {
            Rgb([220, 20, 20])
        } else {
            Rgb([20, 20, 220])
        };
    }
    let hex = spine_color(&DynamicImage::ImageRgb8(image), DEFAULT_CLUSTER_COUNT);
    let (r, _, b) = parse_hex(&hex).unwrap();
    let reddish = r > 150 && b < 80;
    let bluish = b > 150 && r < 80;
    assert!(reddish || bluish, "expected a dominant tone, got {hex}");
}

#[test]
fn undecodable_cover_file_is_an_error() {
    let dir = tempdir().unwrap();
    let garbage = dir.path().join("cover.jpg");
    std::fs::write(&garbage, b"not an image at all").unwrap();
    assert!(spine_color_from_path(&garbage, DEFAULT_CLUSTER_COUNT).is_err());
    assert!(spine_color_from_path(dir.path().join("absent.jpg"), DEFAULT_CLUSTER_COUNT).is_err());

    let good = dir.path().join("good.png");
    solid(10, 200, 30, 32).save(&good).unwrap();
    let hex = spine_color_from_path(&good, DEFAULT_CLUSTER_COUNT).unwrap();
    assert!(parse_hex(&hex).is_some(), "got {hex}");
}

#[test]
fn repeated_extraction_picks_the_same_color() {
    let mut image = RgbImage::new(80, 80);
    for (x, y, px) in image.enumerate_pixels_mut() {
        *px = Rgb([(x * 3) as u8, (y * 2) as u8, 180]);
    }
    let cover = DynamicImage::ImageRgb8(image);
    let first = spine_color(&cover, DEFAULT_CLUSTER_COUNT);
    assert_eq!(spine_color(&cover, DEFAULT_CLUSTER_COUNT), first);
}

#[test]
fn darken_reaches_readable_brightness() {
    assert_eq!(darken_for_text("#ffffff").unwrap(), "#646464");
    // already dark colors pass through untouched
    assert_eq!(darken_for_text("#141414").unwrap(), "#141414");
    // (299*200 + 587*100 + 114*50) / 1000 = 124.2 -> subtract 24
    assert_eq!(darken_for_text("#c86432").unwrap(), "#b04c1a");
    assert_eq!(darken_for_text("red"), None);
}
