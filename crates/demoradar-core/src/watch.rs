//! Wait for a fresh replay to appear in a directory.
//!
//! Used when the bridge is started before the match: instead of naming a
//! replay up front, it watches the recording directory and picks up the
//! newest matching file created after startup.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, info, warn};

use crate::retry::FixedDelayRetry;

/// Poll `dir` until a file with `extension` modified after `since`
/// appears, then wait `settle` and return its path.
///
/// Directory read errors are logged and retried. Never returns without
/// a file.
pub async fn wait_for_new_source(
    dir: &Path,
    extension: &str,
    since: SystemTime,
    poll: FixedDelayRetry,
    settle: Duration,
) -> PathBuf {
    info!(
        dir = %dir.display(),
        extension,
        "waiting for a new replay source"
    );

    loop {
        match newest_since(dir, extension, since).await {
            Ok(Some(path)) => {
                info!(
                    path = %path.display(),
                    settle_ms = settle.as_millis(),
                    "new replay source detected"
                );
                if !settle.is_zero() {
                    tokio::time::sleep(settle).await;
                }
                return path;
            }
            Ok(None) => debug!(dir = %dir.display(), "no new replay source yet"),
            Err(e) => warn!(dir = %dir.display(), error = %e, "cannot read replay directory"),
        }
        poll.wait().await;
    }
}

/// The most recently modified regular file in `dir` whose extension
/// matches `extension` (case-insensitive) and whose modification time is
/// strictly after `since`.
///
/// # Errors
///
/// Returns the I/O error if the directory cannot be listed.
pub async fn newest_since(
    dir: &Path,
    extension: &str,
    since: SystemTime,
) -> std::io::Result<Option<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut newest: Option<(SystemTime, PathBuf)> = None;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let matches_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if !matches_extension {
            continue;
        }

        // Entries can vanish between listing and stat; skip them.
        let Ok(metadata) = entry.metadata().await else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        let Ok(modified) = metadata.modified() else {
            continue;
        };

        let is_newer = newest.as_ref().is_none_or(|(best, _)| modified > *best);
        if modified > since && is_newer {
            newest = Some((modified, path));
        }
    }

    Ok(newest.map(|(_, path)| path))
}
