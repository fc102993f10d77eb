use crate::models::geometry::Region;
use crate::services::screen::ScreenCapture;
use base64::{engine::general_purpose, Engine as _};
use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// One detected text region: enclosing box, recognized text, OCR certainty
#[derive(Debug, Clone, PartialEq)]
pub struct TextRegion {
    pub region: Region,
    pub text: String,
    pub confidence: f64,
}

/// Text-detection engine abstraction.
///
/// Implementations return regions in their own, implementation-defined order.
/// Callers must not assume the list is sorted by confidence.
pub trait TextDetector: Send + Sync {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<TextRegion>, String>;
}

#[derive(Serialize)]
struct ImageRequest {
    image_base64: String,
}

/// Single text box from the OCR sidecar
#[derive(Deserialize, Debug)]
struct TextBox {
    /// 4 corner points [[x1,y1], [x2,y2], [x3,y3], [x4,y4]]
    #[serde(rename = "box")]
    bbox: Vec<[f64; 2]>,
    text: String,
    score: f64,
}

#[derive(Deserialize)]
struct OcrResponse {
    boxes: Vec<TextBox>,
}

/// Text detector that talks to a local OCR HTTP sidecar
pub struct HttpTextDetector {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpTextDetector {
    pub fn new(base_url: &str) -> Result<Self, String> {
        // Full-screen OCR can take a while on CPU
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Check if the OCR sidecar is reachable
    pub fn health_check(&self) -> Result<(), String> {
        let url = format!("{}/health", self.base_url);
        self.client
            .get(&url)
            .send()
            .map_err(|e| format!("OCR server health check failed: {}", e))?;
        Ok(())
    }

    fn encode_image(image: &DynamicImage) -> Result<String, String> {
        let buffer = ScreenCapture::image_to_png_bytes(image)?;
        Ok(general_purpose::STANDARD.encode(&buffer))
    }
}

impl TextDetector for HttpTextDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<TextRegion>, String> {
        let image_base64 = Self::encode_image(image)?;
        let url = format!("{}/ocr", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&ImageRequest { image_base64 })
            .send()
            .map_err(|e| format!("OCR request failed: {}", e))?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(format!("OCR server error: {}", error_text));
        }

        let data: OcrResponse = response
            .json()
            .map_err(|e| format!("Failed to parse OCR response: {}", e))?;

        // Preserve the server's output order; the locator's first-match rule
        // depends on it.
        data.boxes
            .iter()
            .map(|b| {
                Ok(TextRegion {
                    region: Region::from_quad(&b.bbox)?,
                    text: b.text.clone(),
                    confidence: b.score,
                })
            })
            .collect()
    }
}
