use crate::models::config::LocatorConfig;
use crate::models::geometry::Region;
use crate::models::locate::{MatchCandidate, MatchMode};
use crate::services::annotate;
use crate::services::detector::TextDetector;
use crate::services::matching;
use image::imageops::FilterType;
use image::DynamicImage;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Resized templates below this edge length carry too little signal to match
const MIN_TEMPLATE_SIZE: u32 = 10;

/// Candidate from one scale of the template search
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScaleCandidate {
    scale: f64,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    confidence: f64,
}

/// Finds a target's on-screen coordinate in a captured image.
///
/// Stateless across calls apart from its configuration: locating against an
/// unchanged capture with the same parameters yields the same result.
pub struct IconLocator {
    target_label: String,
    threshold: f64,
    scales: Vec<f64>,
    debug_dir: Option<PathBuf>,
}

impl IconLocator {
    pub fn new(target_label: &str, threshold: f64, scales: Vec<f64>) -> Self {
        Self {
            target_label: target_label.to_string(),
            threshold,
            scales,
            debug_dir: None,
        }
    }

    pub fn from_config(config: &LocatorConfig) -> Self {
        Self::new(
            &config.target_label,
            config.match_threshold,
            config.match_scales.clone(),
        )
    }

    /// Enable diagnostic captures: annotated on success, plain on failure
    pub fn with_debug_dir(mut self, debug_dir: PathBuf) -> Self {
        self.debug_dir = Some(debug_dir);
        self
    }

    /// Text mode: match the target label against detector output.
    ///
    /// Returns the FIRST region whose recognized text contains the label
    /// (case-insensitive), in detector output order. This is an intentional
    /// tie-break policy, not ranking by confidence: the earliest detection
    /// wins even when a later one scores higher.
    pub fn locate_text(
        &self,
        capture: &DynamicImage,
        detector: &dyn TextDetector,
    ) -> Result<Option<MatchCandidate>, String> {
        let regions = detector.detect(capture)?;
        let label = self.target_label.to_lowercase();

        let hit = regions
            .into_iter()
            .find(|r| r.text.to_lowercase().contains(&label));

        match hit {
            Some(region) => {
                let candidate = MatchCandidate {
                    region: region.region,
                    confidence: region.confidence,
                    mode: MatchMode::Text,
                };
                info!(
                    text = %region.text,
                    confidence = region.confidence,
                    center = ?candidate.center(),
                    "Found target label"
                );

                if let Some(dir) = &self.debug_dir {
                    if let Err(e) = annotate::save_detection_image(capture, &candidate.region, dir)
                    {
                        warn!("Failed to save detection image: {}", e);
                    }
                }
                Ok(Some(candidate))
            }
            None => {
                debug!(label = %self.target_label, "Label not found in capture");
                if let Some(dir) = &self.debug_dir {
                    if let Err(e) = annotate::save_no_match_image(capture, dir) {
                        warn!("Failed to save no-match image: {}", e);
                    }
                }
                Ok(None)
            }
        }
    }

    /// Template mode: multi-scale correlation search.
    ///
    /// Each configured scale resizes the template, skips it when it falls
    /// below the minimum size or exceeds the capture, and takes the global
    /// maximum of its correlation map as that scale's candidate. The single
    /// best candidate across scales wins (earlier scale on exact ties); the
    /// result is empty when the best confidence stays below the threshold.
    ///
    /// Single-shot search: when the template appears more than once, which
    /// instance wins is whichever produced the map's global maximum.
    pub fn locate_template(
        &self,
        capture: &DynamicImage,
        template: &DynamicImage,
    ) -> Option<MatchCandidate> {
        let capture_gray = capture.to_luma8();
        let template_gray = template.to_luma8();
        let capture_dims = (capture_gray.width(), capture_gray.height());

        let mut candidates = Vec::new();
        for &scale in &self.scales {
            let (width, height) =
                scaled_dims(template_gray.width(), template_gray.height(), scale);
            if !scale_is_valid((width, height), capture_dims) {
                debug!(scale, width, height, "Skipping out-of-range scale");
                continue;
            }

            let resized =
                image::imageops::resize(&template_gray, width, height, FilterType::Triangle);
            if let Some(point) = matching::correlate(&capture_gray, &resized) {
                candidates.push(ScaleCandidate {
                    scale,
                    x: point.x,
                    y: point.y,
                    width,
                    height,
                    confidence: point.confidence,
                });
            }
        }

        let best = pick_best(&candidates)?;
        if best.confidence < self.threshold {
            debug!(
                confidence = best.confidence,
                threshold = self.threshold,
                "Best template match below threshold"
            );
            return None;
        }

        let region = Region::from_origin(best.x as i32, best.y as i32, best.width, best.height);
        let candidate = MatchCandidate {
            region,
            confidence: best.confidence,
            mode: MatchMode::Template,
        };
        info!(
            scale = best.scale,
            confidence = best.confidence,
            center = ?candidate.center(),
            "Template match accepted"
        );
        Some(candidate)
    }
}

fn scaled_dims(width: u32, height: u32, scale: f64) -> (u32, u32) {
    ((width as f64 * scale) as u32, (height as f64 * scale) as u32)
}

/// A scale is searchable when the resized template is at least
/// MIN_TEMPLATE_SIZE in both dimensions and no larger than the capture.
fn scale_is_valid((width, height): (u32, u32), (cap_width, cap_height): (u32, u32)) -> bool {
    width >= MIN_TEMPLATE_SIZE
        && height >= MIN_TEMPLATE_SIZE
        && width <= cap_width
        && height <= cap_height
}

/// Highest-confidence candidate; earlier list position wins exact ties.
fn pick_best(candidates: &[ScaleCandidate]) -> Option<ScaleCandidate> {
    let mut best: Option<ScaleCandidate> = None;
    for candidate in candidates {
        match best {
            Some(b) if candidate.confidence <= b.confidence => {}
            _ => best = Some(*candidate),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::detector::TextRegion;
    use image::{GrayImage, Luma};

    struct MockDetector {
        regions: Vec<TextRegion>,
    }

    impl TextDetector for MockDetector {
        fn detect(&self, _image: &DynamicImage) -> Result<Vec<TextRegion>, String> {
            Ok(self.regions.clone())
        }
    }

    fn text_region(region: Region, text: &str, confidence: f64) -> TextRegion {
        TextRegion {
            region,
            text: text.to_string(),
            confidence,
        }
    }

    fn locator() -> IconLocator {
        IconLocator::new("Notepad", 0.7, vec![1.0, 0.8, 1.2, 0.6, 1.4])
    }

    fn noise_image(width: u32, height: u32, seed: u64) -> GrayImage {
        let mut state = seed;
        GrayImage::from_fn(width, height, |_, _| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            Luma([(state >> 33) as u8])
        })
    }

    #[test]
    fn test_text_mode_returns_labeled_center() {
        // Box ((100,100),(150,100),(150,140),(100,140)) recognized as
        // "Notepad Icon" must resolve to center (125, 120)
        let detector = MockDetector {
            regions: vec![
                text_region(Region::new(0, 0, 80, 20), "Recycle Bin", 0.99),
                text_region(Region::new(100, 100, 150, 140), "Notepad Icon", 0.91),
            ],
        };
        let capture = DynamicImage::new_rgba8(400, 300);

        let result = locator().locate_text(&capture, &detector).unwrap().unwrap();
        assert_eq!(result.center(), (125, 120));
        assert_eq!(result.confidence, 0.91);
        assert_eq!(result.mode, MatchMode::Text);
    }

    #[test]
    fn test_text_mode_first_match_wins_over_higher_confidence() {
        let detector = MockDetector {
            regions: vec![
                text_region(Region::new(10, 10, 60, 30), "notepad", 0.40),
                text_region(Region::new(200, 200, 260, 230), "Notepad", 0.99),
            ],
        };
        let capture = DynamicImage::new_rgba8(400, 300);

        let result = locator().locate_text(&capture, &detector).unwrap().unwrap();
        // First in detector order, never the later higher-confidence one
        assert_eq!(result.center(), (35, 20));
        assert_eq!(result.confidence, 0.40);
    }

    #[test]
    fn test_text_mode_is_case_insensitive_substring() {
        let detector = MockDetector {
            regions: vec![text_region(
                Region::new(50, 50, 100, 70),
                "NOTEPAD shortcut",
                0.8,
            )],
        };
        let capture = DynamicImage::new_rgba8(200, 200);

        let locator = IconLocator::new("notepad", 0.7, vec![1.0]);
        let result = locator.locate_text(&capture, &detector).unwrap();
        assert!(result.is_some());
    }

    #[test]
    fn test_text_mode_empty_when_no_label() {
        let detector = MockDetector {
            regions: vec![text_region(Region::new(0, 0, 50, 20), "Terminal", 0.95)],
        };
        let capture = DynamicImage::new_rgba8(200, 200);

        let result = locator().locate_text(&capture, &detector).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_text_mode_saves_debug_images() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "deskscribe-locator-{}-{}",
            std::process::id(),
            id
        ));

        let capture = DynamicImage::new_rgba8(200, 200);
        let with_debug = locator().with_debug_dir(dir.clone());

        // Success path writes an annotated capture
        let detector = MockDetector {
            regions: vec![text_region(Region::new(50, 50, 100, 70), "Notepad", 0.8)],
        };
        with_debug.locate_text(&capture, &detector).unwrap();

        // Failure path writes a plain capture
        let detector = MockDetector { regions: vec![] };
        with_debug.locate_text(&capture, &detector).unwrap();

        let names: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().any(|n| n.starts_with("detection_")));
        assert!(names.iter().any(|n| n.starts_with("NO_MATCH_")));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_template_mode_finds_embedded_patch() {
        let patch = noise_image(20, 20, 7);
        let mut capture = GrayImage::from_pixel(120, 90, Luma([128]));
        for (px, py, p) in patch.enumerate_pixels() {
            capture.put_pixel(40 + px, 30 + py, *p);
        }

        let result = locator()
            .locate_template(
                &DynamicImage::ImageLuma8(capture),
                &DynamicImage::ImageLuma8(patch),
            )
            .unwrap();

        // Center of the 20x20 box at (40, 30)
        assert_eq!(result.center(), (50, 40));
        assert!(result.confidence >= 0.7);
        assert_eq!(result.mode, MatchMode::Template);
    }

    #[test]
    fn test_template_mode_empty_below_threshold() {
        let capture = noise_image(100, 100, 3);
        let template = noise_image(16, 16, 99);

        let result = locator().locate_template(
            &DynamicImage::ImageLuma8(capture),
            &DynamicImage::ImageLuma8(template),
        );
        assert!(result.is_none());
    }

    #[test]
    fn test_template_mode_accepts_match_at_exact_threshold() {
        // A flat template correlates at exactly 0.0, which pins the
        // acceptance boundary: confidence equal to the threshold passes,
        // a threshold just above it rejects.
        let capture = noise_image(50, 50, 21);
        let template = GrayImage::from_pixel(12, 12, Luma([180]));

        let at_threshold = IconLocator::new("x", 0.0, vec![1.0]);
        let result = at_threshold
            .locate_template(
                &DynamicImage::ImageLuma8(capture.clone()),
                &DynamicImage::ImageLuma8(template.clone()),
            )
            .unwrap();
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.mode, MatchMode::Template);

        let above_threshold = IconLocator::new("x", 0.01, vec![1.0]);
        let result = above_threshold.locate_template(
            &DynamicImage::ImageLuma8(capture),
            &DynamicImage::ImageLuma8(template),
        );
        assert!(result.is_none());
    }

    #[test]
    fn test_template_mode_is_idempotent() {
        let patch = noise_image(16, 16, 5);
        let mut capture = noise_image(80, 60, 11);
        for (px, py, p) in patch.enumerate_pixels() {
            capture.put_pixel(20 + px, 10 + py, *p);
        }

        let capture = DynamicImage::ImageLuma8(capture);
        let template = DynamicImage::ImageLuma8(patch);
        let locator = locator();

        let first = locator.locate_template(&capture, &template);
        let second = locator.locate_template(&capture, &template);
        assert_eq!(first, second);
    }

    #[test]
    fn test_scale_filter_rejects_oversized_and_undersized() {
        // Upscaled template larger than the capture in either dimension
        assert!(!scale_is_valid((40, 20), (30, 30)));
        assert!(!scale_is_valid((20, 40), (30, 30)));
        // Below the 10 px minimum
        assert!(!scale_is_valid((9, 15), (100, 100)));
        assert!(!scale_is_valid((15, 9), (100, 100)));
        // Exactly at the bounds is searchable
        assert!(scale_is_valid((10, 10), (100, 100)));
        assert!(scale_is_valid((100, 100), (100, 100)));
    }

    #[test]
    fn test_no_valid_scale_yields_empty() {
        // 25x25 capture: scale 2.0 overflows it and scale 0.3 lands under
        // the 10 px minimum, leaving no searchable candidate
        let capture = noise_image(25, 25, 1);
        let template = noise_image(20, 20, 2);

        let locator = IconLocator::new("x", 0.7, vec![2.0, 0.3]);
        let result = locator.locate_template(
            &DynamicImage::ImageLuma8(capture),
            &DynamicImage::ImageLuma8(template),
        );
        assert!(result.is_none());
    }

    #[test]
    fn test_scaled_dims_truncate() {
        assert_eq!(scaled_dims(25, 25, 0.6), (15, 15));
        assert_eq!(scaled_dims(25, 25, 1.4), (35, 35));
        assert_eq!(scaled_dims(15, 15, 0.6), (9, 9));
    }

    #[test]
    fn test_pick_best_takes_maximum_across_scales() {
        let candidate = |scale, confidence| ScaleCandidate {
            scale,
            x: (scale * 100.0) as u32,
            y: 0,
            width: 10,
            height: 10,
            confidence,
        };

        // Per-scale maxima 0.55 @1.0, 0.72 @0.8, 0.40 @1.2: the 0.8 scale wins
        let candidates = vec![
            candidate(1.0, 0.55),
            candidate(0.8, 0.72),
            candidate(1.2, 0.40),
        ];
        let best = pick_best(&candidates).unwrap();
        assert_eq!(best.scale, 0.8);
        assert_eq!(best.confidence, 0.72);
        assert_eq!(best.x, 80);
    }

    #[test]
    fn test_pick_best_resolves_ties_by_list_order() {
        let candidate = |scale, confidence| ScaleCandidate {
            scale,
            x: 0,
            y: 0,
            width: 10,
            height: 10,
            confidence,
        };

        let candidates = vec![candidate(1.0, 0.8), candidate(0.8, 0.8)];
        assert_eq!(pick_best(&candidates).unwrap().scale, 1.0);

        assert!(pick_best(&[]).is_none());
    }
}
