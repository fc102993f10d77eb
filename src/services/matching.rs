use image::GrayImage;
use rayon::prelude::*;

/// Global maximum of a correlation map: location plus confidence in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchPoint {
    /// Top-left corner of the best template alignment
    pub x: u32,
    pub y: u32,
    pub confidence: f64,
}

/// Summed-area table over pixel values and squared values.
///
/// Lets every candidate alignment compute its patch sum and sum of squares
/// in constant time, leaving only the cross term as a per-pixel loop.
struct IntegralImage {
    width: usize,
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
}

impl IntegralImage {
    fn new(image: &GrayImage) -> Self {
        let (w, h) = (image.width() as usize, image.height() as usize);
        let stride = w + 1;
        let mut sum = vec![0.0; stride * (h + 1)];
        let mut sum_sq = vec![0.0; stride * (h + 1)];

        for y in 0..h {
            for x in 0..w {
                let v = image.get_pixel(x as u32, y as u32)[0] as f64;
                let idx = (y + 1) * stride + (x + 1);
                sum[idx] = v + sum[idx - 1] + sum[idx - stride] - sum[idx - stride - 1];
                sum_sq[idx] =
                    v * v + sum_sq[idx - 1] + sum_sq[idx - stride] - sum_sq[idx - stride - 1];
            }
        }

        Self {
            width: stride,
            sum,
            sum_sq,
        }
    }

    /// Sum and sum of squares over the box with top-left (x, y) and size w x h
    fn box_sums(&self, x: usize, y: usize, w: usize, h: usize) -> (f64, f64) {
        let stride = self.width;
        let (x2, y2) = (x + w, y + h);
        let s = self.sum[y2 * stride + x2] - self.sum[y * stride + x2]
            - self.sum[y2 * stride + x]
            + self.sum[y * stride + x];
        let sq = self.sum_sq[y2 * stride + x2] - self.sum_sq[y * stride + x2]
            - self.sum_sq[y2 * stride + x]
            + self.sum_sq[y * stride + x];
        (s, sq)
    }
}

/// Normalized cross-correlation of `template` over every alignment in `image`.
///
/// Both images are zero-meaned per alignment, so uniform brightness offsets
/// do not affect the score. Returns the confidence map's global maximum
/// (first occurrence in row-major order), or None when the template does not
/// fit inside the image. Confidence is clamped to [0, 1]; degenerate
/// alignments (flat template or flat patch) score 0.
pub fn correlate(image: &GrayImage, template: &GrayImage) -> Option<MatchPoint> {
    let (iw, ih) = (image.width() as usize, image.height() as usize);
    let (tw, th) = (template.width() as usize, template.height() as usize);

    if tw == 0 || th == 0 || tw > iw || th > ih {
        return None;
    }

    let n = (tw * th) as f64;

    // Zero-meaned template and its energy, shared by every alignment
    let t_mean = template.pixels().map(|p| p[0] as f64).sum::<f64>() / n;
    let t_centered: Vec<f64> = template.pixels().map(|p| p[0] as f64 - t_mean).collect();
    let t_energy: f64 = t_centered.iter().map(|v| v * v).sum();

    if t_energy <= f64::EPSILON {
        // Flat template correlates with nothing
        return Some(MatchPoint {
            x: 0,
            y: 0,
            confidence: 0.0,
        });
    }

    let integral = IntegralImage::new(image);
    let raw = image.as_raw();

    // Best alignment per result row, computed in parallel
    let row_bests: Vec<(u32, f64)> = (0..=(ih - th))
        .into_par_iter()
        .map(|y| {
            let mut best_x = 0u32;
            let mut best_conf = f64::NEG_INFINITY;

            for x in 0..=(iw - tw) {
                let (p_sum, p_sum_sq) = integral.box_sums(x, y, tw, th);
                let p_energy = p_sum_sq - p_sum * p_sum / n;

                let confidence = if p_energy <= f64::EPSILON {
                    0.0
                } else {
                    // Cross term: sum over template of T'(i,j) * I(x+i, y+j).
                    // The patch mean drops out because T' sums to zero.
                    let mut cross = 0.0;
                    for j in 0..th {
                        let row = (y + j) * iw + x;
                        let t_row = j * tw;
                        for i in 0..tw {
                            cross += t_centered[t_row + i] * raw[row + i] as f64;
                        }
                    }
                    (cross / (t_energy * p_energy).sqrt()).clamp(0.0, 1.0)
                };

                if confidence > best_conf {
                    best_conf = confidence;
                    best_x = x as u32;
                }
            }

            (best_x, best_conf)
        })
        .collect();

    // Row-major first occurrence wins on exact ties
    let mut best = MatchPoint {
        x: 0,
        y: 0,
        confidence: f64::NEG_INFINITY,
    };
    for (y, (x, confidence)) in row_bests.into_iter().enumerate() {
        if confidence > best.confidence {
            best = MatchPoint {
                x,
                y: y as u32,
                confidence,
            };
        }
    }

    Some(best)
}
