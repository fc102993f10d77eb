use crate::models::post::Post;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Full path the editor is told to save `post` under
pub fn post_output_path(target_dir: &Path, post: &Post) -> PathBuf {
    target_dir.join(post.file_name())
}

/// Make sure the output directory exists before the save dialog needs it
pub fn prepare_target_dir(target_dir: &Path) -> Result<(), String> {
    std::fs::create_dir_all(target_dir)
        .map_err(|e| format!("Failed to create output directory {:?}: {}", target_dir, e))
}

/// Delete a leftover file at `path` so the save dialog can rewrite it
/// without tripping an overwrite prompt. Best-effort: a failed delete is
/// logged and the automation proceeds.
pub fn remove_stale_output(path: &Path) -> bool {
    if !path.exists() {
        return false;
    }

    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!(?path, "Removed stale output file");
            true
        }
        Err(e) => {
            warn!(?path, "Failed to remove stale output file: {}", e);
            false
        }
    }
}
