//! Grabber subprocess launcher
//!
//! Spawns one grabber run, enforces the wall-clock kill timer and validates
//! the artifact it leaves behind. The outcome is a plain success flag; the
//! reasons are logged here and retry policy lives in the scheduler.

use crate::config::GrabberSettings;
use crate::models::Site;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Run the grabber for one site and validate its artifact.
///
/// Returns `true` iff the subprocess exited zero within the wall clock and
/// the artifact contains at least `min_programmes` programme records.
pub async fn launch(
    site: &Site,
    out_path: &Path,
    settings: &GrabberSettings,
    cancel: &CancellationToken,
) -> bool {
    let mut cmd = Command::new(&settings.program);
    cmd.args(&settings.leading_args);
    cmd.arg("--site").arg(site.as_str());
    cmd.arg("--output").arg(out_path);
    if let Some(days) = settings.days {
        cmd.arg("--days").arg(days.to_string());
    }
    cmd.arg("--maxConnections")
        .arg(settings.max_connections.to_string());
    if let Some(delay) = settings.delay_ms {
        cmd.arg("--delay").arg(delay.to_string());
        cmd.env("DELAY", delay.to_string());
    }
    if let Some(timeout) = settings.timeout_ms {
        cmd.arg("--timeout").arg(timeout.to_string());
        cmd.env("TIMEOUT", timeout.to_string());
    }
    cmd.stdout(Stdio::null());
    cmd.stderr(Stdio::null());
    cmd.kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            warn!(site = %site, error = %e, "failed to spawn grabber");
            return false;
        }
    };

    let status = tokio::select! {
        _ = cancel.cancelled() => {
            let _ = child.start_kill();
            let _ = child.wait().await;
            warn!(site = %site, "grabber cancelled");
            return false;
        }
        waited = tokio::time::timeout(settings.wall_clock, child.wait()) => match waited {
            Err(_) => {
                warn!(site = %site, wall_clock = ?settings.wall_clock, "grabber exceeded wall clock, killing");
                let _ = child.start_kill();
                let _ = child.wait().await;
                return false;
            }
            Ok(Err(e)) => {
                warn!(site = %site, error = %e, "failed to wait on grabber");
                return false;
            }
            Ok(Ok(status)) => status,
        },
    };

    if !status.success() {
        warn!(site = %site, ?status, "grabber exited with failure");
        discard_artifact(out_path).await;
        return false;
    }

    let content = match tokio::fs::read_to_string(out_path).await {
        Ok(content) => content,
        Err(e) => {
            warn!(site = %site, error = %e, "grabber exited zero but artifact is unreadable");
            return false;
        }
    };

    let programmes = count_programmes(&content);
    if programmes < settings.min_programmes {
        warn!(
            site = %site,
            programmes,
            min = settings.min_programmes,
            "artifact below programme threshold, discarding"
        );
        discard_artifact(out_path).await;
        return false;
    }

    debug!(site = %site, programmes, "grab succeeded");
    true
}

/// Structural programme count: occurrences of the opening token, not a parse.
fn count_programmes(content: &str) -> usize {
    content.matches("<programme ").count()
}

async fn discard_artifact(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(file = %path.display(), error = %e, "could not remove invalid artifact");
        }
    }
}
