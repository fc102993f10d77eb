use crate::models::config::AppConfig;
use crate::models::locate::{MatchCandidate, MatchMode};
use crate::models::post::Post;
use crate::services::detector::{HttpTextDetector, TextDetector};
use crate::services::input::{InputDriver, Key};
use crate::services::locator::IconLocator;
use crate::services::outputs;
use crate::services::posts::PostClient;
use crate::services::retry;
use crate::services::screen::ScreenCapture;
use crate::services::window;
use image::DynamicImage;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Outcome of one processed post
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ItemOutcome {
    Completed,
    /// Icon never found within the retry budget; the item was skipped
    DetectionFailed,
    /// An input-simulation step failed mid-sequence; the editor was
    /// force-closed and the run moved on
    StepFailed(String),
}

/// Result of a whole batch run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// (post id, outcome) per item, in processing order
    pub outcomes: Vec<(u64, ItemOutcome)>,
    /// Placeholder data stood in for the live API
    pub used_fallback: bool,
}

impl RunSummary {
    pub fn completed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| *o == ItemOutcome::Completed)
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| *o == ItemOutcome::DetectionFailed)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, ItemOutcome::StepFailed(_)))
            .count()
    }
}

/// Sequential batch driver: fetch posts, then for each one open the target
/// app via its icon, type the post, and walk the save dialog.
pub struct AutomationPipeline {
    config: AppConfig,
    screen: ScreenCapture,
    input: InputDriver,
    locator: Arc<IconLocator>,
    detector: Option<Arc<dyn TextDetector>>,
    template: Option<Arc<DynamicImage>>,
    posts: PostClient,
}

impl AutomationPipeline {
    pub fn new(config: AppConfig) -> Result<Self, String> {
        let screen = ScreenCapture::new()?;
        let input = InputDriver::new()?;
        let posts = PostClient::new(&config.api)?;

        let locator = Arc::new(
            IconLocator::from_config(&config.locator)
                .with_debug_dir(config.output.debug_dir.clone()),
        );

        // Resolve the matching backend up front so a bad configuration
        // fails before any input is simulated.
        let (detector, template): (Option<Arc<dyn TextDetector>>, Option<Arc<DynamicImage>>) =
            match config.locator.mode {
                MatchMode::Text => {
                    let detector = HttpTextDetector::new(&config.locator.ocr_server_url)?;
                    (Some(Arc::new(detector)), None)
                }
                MatchMode::Template => {
                    let template = image::open(&config.locator.template_path).map_err(|e| {
                        format!(
                            "Failed to load template image {:?}: {}",
                            config.locator.template_path, e
                        )
                    })?;
                    (None, Some(Arc::new(template)))
                }
            };

        Ok(Self {
            config,
            screen,
            input,
            locator,
            detector,
            template,
            posts,
        })
    }

    /// Run the whole batch. Individual item failures are recorded and
    /// skipped; only setup-level problems abort the run.
    pub async fn run(&mut self) -> Result<RunSummary, String> {
        outputs::prepare_target_dir(&self.config.output.target_dir)?;

        let fetched = self.posts.fetch().await;
        if fetched.used_fallback {
            warn!("Using placeholder data due to API failure");
        }
        if fetched.posts.is_empty() {
            info!("No posts to process");
            return Ok(RunSummary {
                outcomes: Vec::new(),
                used_fallback: fetched.used_fallback,
            });
        }

        let total = fetched.posts.len();
        let mut outcomes = Vec::with_capacity(total);

        for (index, post) in fetched.posts.iter().enumerate() {
            info!(
                item = index + 1,
                total,
                post_id = post.id,
                "Processing post"
            );

            let outcome = self.process_post(post).await;
            match &outcome {
                ItemOutcome::Completed => info!(post_id = post.id, "Post completed"),
                ItemOutcome::DetectionFailed => {
                    warn!(post_id = post.id, "Icon not found, post skipped")
                }
                ItemOutcome::StepFailed(e) => {
                    warn!(post_id = post.id, "Automation step failed: {}", e)
                }
            }
            outcomes.push((post.id, outcome));
        }

        let summary = RunSummary {
            outcomes,
            used_fallback: fetched.used_fallback,
        };
        info!(
            completed = summary.completed(),
            skipped = summary.skipped(),
            failed = summary.failed(),
            "Automation run finished"
        );
        Ok(summary)
    }

    async fn process_post(&mut self, post: &Post) -> ItemOutcome {
        let this = &*self;
        let candidate = retry::with_retry(
            this.config.retry.detect_attempts,
            Duration::from_millis(this.config.retry.detect_retry_delay_ms),
            || this.locate_icon(),
        )
        .await;

        let Some(candidate) = candidate else {
            return ItemOutcome::DetectionFailed;
        };

        match self.drive_editor(post, candidate).await {
            Ok(()) => ItemOutcome::Completed,
            Err(e) => {
                self.force_close_editor();
                ItemOutcome::StepFailed(e)
            }
        }
    }

    /// One detection attempt: capture the screen and run the configured
    /// matching mode off the async runtime (correlation and OCR both block).
    async fn locate_icon(&self) -> Option<MatchCandidate> {
        let capture = match self.screen.capture_full() {
            Ok(capture) => capture,
            Err(e) => {
                warn!("Screen capture failed: {}", e);
                return None;
            }
        };

        let locator = Arc::clone(&self.locator);
        match self.config.locator.mode {
            MatchMode::Text => {
                let detector = Arc::clone(self.detector.as_ref()?);
                let result = tokio::task::spawn_blocking(move || {
                    locator.locate_text(&capture, detector.as_ref())
                })
                .await;

                match result {
                    Ok(Ok(candidate)) => candidate,
                    Ok(Err(e)) => {
                        warn!("Text detection failed: {}", e);
                        None
                    }
                    Err(e) => {
                        warn!("Detection task panicked: {}", e);
                        None
                    }
                }
            }
            MatchMode::Template => {
                let template = Arc::clone(self.template.as_ref()?);
                let result = tokio::task::spawn_blocking(move || {
                    locator.locate_template(&capture, &template)
                })
                .await;

                result.unwrap_or_else(|e| {
                    warn!("Matching task panicked: {}", e);
                    None
                })
            }
        }
    }

    /// Open the app under the matched icon, type the post, save it through
    /// the save dialog, and close the app again.
    async fn drive_editor(&mut self, post: &Post, candidate: MatchCandidate) -> Result<(), String> {
        // The match center is in capture (physical) pixels; the pointer
        // moves in logical coordinates.
        let (px, py) = candidate.center();
        let (x, y) = self.screen.to_logical(px, py);

        info!(x, y, scale = self.screen.scale_factor(), "Opening icon");
        self.input.move_smooth(x, y)?;
        self.input.double_click()?;
        tokio::time::sleep(Duration::from_secs(1)).await;

        let window = window::wait_for_window(
            &self.config.window_title,
            self.config.retry.window_poll_attempts,
            Duration::from_millis(self.config.retry.window_poll_interval_ms),
        )
        .await;

        match window {
            Some(region) => {
                // Focus the editor by clicking inside it
                let (wx, wy) = region.center();
                self.input.move_smooth(wx, wy)?;
                self.input.click()?;
            }
            None => {
                warn!(
                    title = %self.config.window_title,
                    "Editor window not seen, proceeding anyway"
                );
            }
        }
        tokio::time::sleep(Duration::from_secs(1)).await;

        info!(chars = post.file_content().len(), "Writing content");
        self.input.type_text(&post.file_content())?;
        tokio::time::sleep(Duration::from_millis(200)).await;

        info!("Saving file");
        self.input.hotkey(Key::Control, Key::Unicode('s'))?;
        tokio::time::sleep(Duration::from_millis(2500)).await;

        let path = outputs::post_output_path(&self.config.output.target_dir, post);
        outputs::remove_stale_output(&path);

        // Replace whatever the dialog pre-filled with the full path
        self.input.hotkey(Key::Control, Key::Unicode('a'))?;
        tokio::time::sleep(Duration::from_millis(200)).await;
        self.input.type_text(&path.to_string_lossy())?;
        tokio::time::sleep(Duration::from_millis(800)).await;

        self.input.press_key(Key::Return)?;
        tokio::time::sleep(Duration::from_secs(2)).await;
        // A second Enter clears an overwrite prompt if one appeared
        self.input.press_key(Key::Return)?;
        tokio::time::sleep(Duration::from_secs(1)).await;

        info!("Closing editor");
        self.input.hotkey(Key::Alt, Key::F4)?;
        tokio::time::sleep(Duration::from_millis(1500)).await;
        // Decline any "save changes?" prompt left behind
        self.input.press_key(Key::Unicode('n'))?;
        tokio::time::sleep(Duration::from_millis(800)).await;

        Ok(())
    }

    /// Best-effort close after a failed step, so the next item starts from
    /// a clean desktop. Errors here are swallowed on purpose.
    fn force_close_editor(&mut self) {
        let _ = self.input.hotkey(Key::Alt, Key::F4);
        std::thread::sleep(Duration::from_millis(500));
        let _ = self.input.press_key(Key::Unicode('n'));
    }

    /// Check that the OCR sidecar answers, when text mode is configured
    pub async fn check_detector(&self) -> Result<(), String> {
        if self.config.locator.mode != MatchMode::Text {
            return Ok(());
        }
        let url = self.config.locator.ocr_server_url.clone();
        tokio::task::spawn_blocking(move || HttpTextDetector::new(&url)?.health_check())
            .await
            .map_err(|e| format!("Health check task failed: {}", e))?
    }
}
