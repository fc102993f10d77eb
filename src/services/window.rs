use crate::models::geometry::Region;
use std::time::Duration;
use tracing::debug;
use xcap::Window;

/// Look for a visible window whose title contains `title_fragment` and
/// return its screen region.
pub fn find_window(title_fragment: &str) -> Option<Region> {
    let windows = Window::all().ok()?;

    windows.into_iter().find_map(|window| {
        let title = window.title().unwrap_or_default();
        if !title.contains(title_fragment) {
            return None;
        }

        let x = window.x().unwrap_or(0);
        let y = window.y().unwrap_or(0);
        let width = window.width().unwrap_or(0);
        let height = window.height().unwrap_or(0);
        Some(Region::from_origin(x, y, width, height))
    })
}

/// Bounded poll for the window to appear: `attempts` checks spaced by
/// `interval`. A readiness signal the environment actually exposes, used in
/// place of a blind fixed sleep; still an approximation of true readiness.
pub async fn wait_for_window(
    title_fragment: &str,
    attempts: u32,
    interval: Duration,
) -> Option<Region> {
    for attempt in 1..=attempts {
        if let Some(region) = find_window(title_fragment) {
            debug!(title = title_fragment, attempt, "Window appeared");
            return Some(region);
        }
        if attempt < attempts {
            tokio::time::sleep(interval).await;
        }
    }

    debug!(title = title_fragment, attempts, "Window never appeared");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_window_unknown_title() {
        // Either no display (enumeration fails) or no such window; both are None
        assert!(find_window("deskscribe-window-that-cannot-exist-7f3a").is_none());
    }

    #[test]
    fn test_wait_for_window_gives_up_after_attempts() {
        let start = std::time::Instant::now();
        let result = tokio_test::block_on(wait_for_window(
            "deskscribe-window-that-cannot-exist-7f3a",
            3,
            Duration::from_millis(10),
        ));

        assert!(result.is_none());
        // Two inter-attempt waits, not three
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
