use image::DynamicImage;
use xcap::Monitor;

/// Thread-safe wrapper for xcap::Monitor.
///
/// SAFETY: Monitor is a handle to OS display resources. The underlying
/// HMONITOR (Windows) or equivalent handles are thread-safe at the OS level,
/// xcap synchronizes internally, and we only use the handle for read-only
/// capture operations.
#[derive(Clone)]
struct SendSyncMonitor(Monitor);

unsafe impl Send for SendSyncMonitor {}
unsafe impl Sync for SendSyncMonitor {}

/// Screen capture provider backed by xcap
pub struct ScreenCapture {
    monitor: SendSyncMonitor,
    scale_factor: f64,
}

impl ScreenCapture {
    /// Create a capture provider for the primary monitor
    pub fn new() -> Result<Self, String> {
        let monitor = Monitor::all()
            .map_err(|e| format!("Failed to get monitors: {}", e))?
            .into_iter()
            .find(|m| m.is_primary().unwrap_or(false))
            .ok_or("No primary monitor found")?;

        // xcap captures physical pixels; the pointer moves in logical
        // coordinates. On 125% display scaling the two differ by 1.25.
        let scale_factor = monitor.scale_factor().unwrap_or(1.0) as f64;

        Ok(Self {
            monitor: SendSyncMonitor(monitor),
            scale_factor,
        })
    }

    /// Physical-to-logical ratio of the captured monitor (1.0 when unscaled)
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Convert a capture-space (physical pixel) point to the logical
    /// coordinates the pointer operates in.
    pub fn to_logical(&self, x: i32, y: i32) -> (i32, i32) {
        physical_to_logical(x, y, self.scale_factor)
    }

    /// Capture the entire screen
    pub fn capture_full(&self) -> Result<DynamicImage, String> {
        let rgba_image = self
            .monitor
            .0
            .capture_image()
            .map_err(|e| format!("Failed to capture screen: {}", e))?;

        Ok(DynamicImage::ImageRgba8(rgba_image))
    }

    /// Capture a `width` x `height` box centered on the logical point (x, y),
    /// clamped to the screen edges. Used to cut reference templates out of
    /// the live screen.
    pub fn capture_around(&self, x: i32, y: i32, width: u32, height: u32) -> Result<DynamicImage, String> {
        let full = self.capture_full()?;

        // Pointer coordinates are logical; the capture is physical
        let x = (x as f64 * self.scale_factor).round() as i32;
        let y = (y as f64 * self.scale_factor).round() as i32;

        let left = (x - width as i32 / 2).max(0) as u32;
        let top = (y - height as i32 / 2).max(0) as u32;
        let left = left.min(full.width().saturating_sub(width));
        let top = top.min(full.height().saturating_sub(height));

        Ok(full.crop_imm(
            left,
            top,
            width.min(full.width()),
            height.min(full.height()),
        ))
    }

    /// Monitor dimensions in physical pixels
    pub fn dimensions(&self) -> Result<(u32, u32), String> {
        let width = self
            .monitor
            .0
            .width()
            .map_err(|e| format!("Failed to get width: {}", e))?;
        let height = self
            .monitor
            .0
            .height()
            .map_err(|e| format!("Failed to get height: {}", e))?;

        Ok((width, height))
    }

    /// Encode an image as PNG bytes for transmission
    pub fn image_to_png_bytes(image: &DynamicImage) -> Result<Vec<u8>, String> {
        let mut buf = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .map_err(|e| format!("Failed to encode image: {}", e))?;
        Ok(buf)
    }
}

/// Map a physical-pixel point to logical coordinates by dividing out the
/// display scale factor, rounding to the nearest pixel.
pub fn physical_to_logical(x: i32, y: i32, scale_factor: f64) -> (i32, i32) {
    (
        (x as f64 / scale_factor).round() as i32,
        (y as f64 / scale_factor).round() as i32,
    )
}
