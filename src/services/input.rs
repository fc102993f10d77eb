use enigo::{Button, Coordinate, Direction, Enigo, Keyboard, Mouse, Settings};
use std::time::Duration;
use tracing::warn;

pub use enigo::Key;

/// Quadratic ease-in-out: accelerate through the first half of the motion,
/// decelerate through the second. Input and output are both in [0, 1].
pub fn ease_in_out_quad(t: f64) -> f64 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        -2.0 * t * t + 4.0 * t - 1.0
    }
}

/// Mouse/keyboard simulation backed by enigo.
///
/// All operations block; the surrounding automation is strictly sequential.
pub struct InputDriver {
    enigo: Enigo,
    move_duration: Duration,
    move_steps: u32,
}

impl InputDriver {
    pub fn new() -> Result<Self, String> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| format!("Failed to initialize input driver: {}", e))?;

        Ok(Self {
            enigo,
            move_duration: Duration::from_millis(1000),
            move_steps: 50,
        })
    }

    /// Current pointer position in screen coordinates
    pub fn cursor_position(&self) -> Result<(i32, i32), String> {
        self.enigo
            .location()
            .map_err(|e| format!("Failed to read cursor position: {}", e))
    }

    /// Glide the pointer to (x, y) along an eased path instead of jumping,
    /// so the target application sees a plausible mouse motion.
    pub fn move_smooth(&mut self, x: i32, y: i32) -> Result<(), String> {
        let (start_x, start_y) = self.cursor_position()?;
        let step_delay = self.move_duration / self.move_steps;

        for step in 1..=self.move_steps {
            let t = ease_in_out_quad(step as f64 / self.move_steps as f64);
            let ix = start_x + ((x - start_x) as f64 * t) as i32;
            let iy = start_y + ((y - start_y) as f64 * t) as i32;

            self.enigo
                .move_mouse(ix, iy, Coordinate::Abs)
                .map_err(|e| format!("Failed to move mouse: {}", e))?;
            std::thread::sleep(step_delay);
        }

        std::thread::sleep(Duration::from_millis(100));
        Ok(())
    }

    pub fn click(&mut self) -> Result<(), String> {
        self.enigo
            .button(Button::Left, Direction::Click)
            .map_err(|e| format!("Failed to click: {}", e))
    }

    pub fn double_click(&mut self) -> Result<(), String> {
        self.click()?;
        std::thread::sleep(Duration::from_millis(80));
        self.click()
    }

    /// Hold `modifier`, tap `key`, release `modifier`. The release runs even
    /// when the tap fails, so a stuck modifier never leaks into later input.
    pub fn hotkey(&mut self, modifier: Key, key: Key) -> Result<(), String> {
        self.enigo
            .key(modifier, Direction::Press)
            .map_err(|e| format!("Failed to press modifier: {}", e))?;

        let tap = self
            .enigo
            .key(key, Direction::Click)
            .map_err(|e| format!("Failed to press key: {}", e));

        let release = self
            .enigo
            .key(modifier, Direction::Release)
            .map_err(|e| format!("Failed to release modifier: {}", e));

        tap.and(release)
    }

    pub fn press_key(&mut self, key: Key) -> Result<(), String> {
        self.enigo
            .key(key, Direction::Click)
            .map_err(|e| format!("Failed to press key: {}", e))
    }

    /// Enter text in one shot; fall back to per-character typing when the
    /// bulk path fails.
    pub fn type_text(&mut self, text: &str) -> Result<(), String> {
        match self.enigo.text(text) {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("Bulk text entry failed ({}), falling back to typing", e);
                self.type_text_slow(text)
            }
        }
    }

    /// Per-character fallback: newlines become Enter presses, characters the
    /// backend cannot produce degrade to a space so the layout survives.
    fn type_text_slow(&mut self, text: &str) -> Result<(), String> {
        for ch in text.chars() {
            let result = if ch == '\n' {
                self.enigo.key(Key::Return, Direction::Click)
            } else {
                self.enigo.text(&ch.to_string())
            };

            if result.is_err() {
                let _ = self.enigo.text(" ");
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_endpoints() {
        assert_eq!(ease_in_out_quad(0.0), 0.0);
        assert_eq!(ease_in_out_quad(1.0), 1.0);
        assert_eq!(ease_in_out_quad(0.5), 0.5);
    }

    #[test]
    fn test_ease_is_monotonic() {
        let mut prev = 0.0;
        for i in 1..=100 {
            let value = ease_in_out_quad(i as f64 / 100.0);
            assert!(value >= prev, "not monotonic at {}", i);
            prev = value;
        }
    }

    #[test]
    fn test_ease_slow_start_fast_middle() {
        // Ease-in: the first tenth covers less ground than a linear ramp
        assert!(ease_in_out_quad(0.1) < 0.1);
        // Ease-out: the last tenth also covers less than linear
        assert!(ease_in_out_quad(0.9) > 0.9);
    }

    #[test]
    fn test_input_driver_creation() {
        // Needs a display; skip gracefully in headless CI
        if InputDriver::new().is_err() {
            println!("Skipping test - no display available");
        }
    }
}
