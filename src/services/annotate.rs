use crate::models::geometry::Region;
use chrono::Local;
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};
use std::path::{Path, PathBuf};

const MARKER_COLOR: Rgba<u8> = Rgba([0, 255, 0, 255]);
const STROKE: i32 = 4;

/// Draw the detection marker onto `img`: a circle around the matched region's
/// center with an arrow pointing at it from the upper right.
pub fn draw_marker(img: &mut RgbaImage, region: &Region) {
    let (cx, cy) = region.center();
    let radius = ((region.width().max(region.height()) as f64) * 0.8).max(8.0) as i32;

    for t in 0..STROKE {
        draw_hollow_circle_mut(img, (cx, cy), radius + t, MARKER_COLOR);
    }

    let r = radius as f32;
    let start = (cx as f32 + r * 1.5, cy as f32 - r * 1.5);
    let end = (cx as f32 + r * 0.3, cy as f32 - r * 0.3);
    draw_arrow(img, start, end);
}

fn draw_arrow(img: &mut RgbaImage, start: (f32, f32), end: (f32, f32)) {
    draw_line_segment_mut(img, start, end, MARKER_COLOR);

    // Arrow head: two short strokes swept back from the tip
    let (dx, dy) = (start.0 - end.0, start.1 - end.1);
    let len = (dx * dx + dy * dy).sqrt();
    if len < 1.0 {
        return;
    }
    let (ux, uy) = (dx / len, dy / len);
    let head_len = len * 0.3;

    for angle in [-0.45f32, 0.45f32] {
        let (sin, cos) = angle.sin_cos();
        let hx = (ux * cos - uy * sin) * head_len;
        let hy = (ux * sin + uy * cos) * head_len;
        draw_line_segment_mut(img, end, (end.0 + hx, end.1 + hy), MARKER_COLOR);
    }
}

/// Persist an annotated copy of the capture after a successful detection.
pub fn save_detection_image(
    capture: &DynamicImage,
    region: &Region,
    debug_dir: &Path,
) -> Result<PathBuf, String> {
    let mut img = capture.to_rgba8();
    draw_marker(&mut img, region);
    save_debug_image(DynamicImage::ImageRgba8(img), debug_dir, "detection")
}

/// Persist the untouched capture after a failed detection, for inspection.
pub fn save_no_match_image(capture: &DynamicImage, debug_dir: &Path) -> Result<PathBuf, String> {
    save_debug_image(capture.clone(), debug_dir, "NO_MATCH")
}

fn save_debug_image(image: DynamicImage, debug_dir: &Path, prefix: &str) -> Result<PathBuf, String> {
    std::fs::create_dir_all(debug_dir)
        .map_err(|e| format!("Failed to create debug directory: {}", e))?;

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let path = debug_dir.join(format!("{}_{}.png", prefix, timestamp));

    image
        .save(&path)
        .map_err(|e| format!("Failed to save debug image {:?}: {}", path, e))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_dir(tag: &str) -> PathBuf {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!("deskscribe-{}-{}-{}", tag, std::process::id(), id))
    }

    #[test]
    fn test_draw_marker_paints_green_pixels() {
        let mut img = RgbaImage::from_pixel(200, 200, Rgba([0, 0, 0, 255]));
        let region = Region::new(80, 80, 120, 120);
        draw_marker(&mut img, &region);

        let green = img.pixels().filter(|p| **p == MARKER_COLOR).count();
        assert!(green > 50, "expected marker pixels, got {}", green);
    }

    #[test]
    fn test_save_detection_image_writes_file() {
        let dir = test_dir("annotate");
        let capture = DynamicImage::new_rgba8(100, 100);
        let region = Region::new(40, 40, 60, 60);

        let path = save_detection_image(&capture, &region, &dir).unwrap();
        assert!(path.exists());
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("detection_"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_save_no_match_image_writes_plain_copy() {
        let dir = test_dir("no-match");
        let capture = DynamicImage::new_rgba8(100, 100);

        let path = save_no_match_image(&capture, &dir).unwrap();
        assert!(path.exists());
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("NO_MATCH_"));

        // Plain copy: pixel data unchanged
        let saved = image::open(&path).unwrap().to_rgba8();
        assert_eq!(saved.as_raw(), capture.to_rgba8().as_raw());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
