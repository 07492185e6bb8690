// Opens rendered images in the desktop viewer, throttling rapid launches

use anyhow::{Context, Result};
use std::io;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

/// Minimum gap between two launches; openers drop requests that arrive too quickly
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct Viewer {
    delay: Duration,
    next_allowed: Option<Instant>,
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY)
    }
}

impl Viewer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_allowed: None,
        }
    }

    /// Time left before another launch is allowed
    pub fn pending_delay(&self, now: Instant) -> Option<Duration> {
        self.next_allowed
            .filter(|next| *next > now)
            .map(|next| next - now)
    }

    /// Launch the platform opener for `path` in the background
    pub fn open(&mut self, path: &Path) -> Result<()> {
        self.open_with(path, |p| open::that_detached(p))
    }

    fn open_with(&mut self, path: &Path, launch: impl FnOnce(&Path) -> io::Result<()>) -> Result<()> {
        if let Some(wait) = self.pending_delay(Instant::now()) {
            tracing::info!(?wait, "delaying viewer launch to avoid flooding");
            thread::sleep(wait);
        }

        tracing::debug!(path = %path.display(), "launching viewer");
        launch(path)
            .with_context(|| format!("Failed to launch viewer for '{}'", path.display()))?;

        self.mark_launched(Instant::now());
        Ok(())
    }

    fn mark_launched(&mut self, at: Instant) {
        self.next_allowed = Some(at + self.delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_delay_before_first_launch() {
        let viewer = Viewer::default();
        assert_eq!(viewer.pending_delay(Instant::now()), None);
    }

    #[test]
    fn test_delay_after_launch() {
        let mut viewer = Viewer::new(Duration::from_millis(500));
        let launched = Instant::now();
        viewer.mark_launched(launched);

        let wait = viewer.pending_delay(launched + Duration::from_millis(200)).unwrap();
        assert_eq!(wait, Duration::from_millis(300));
        assert_eq!(viewer.pending_delay(launched + Duration::from_millis(500)), None);
    }

    #[test]
    fn test_second_launch_waits_for_throttle() {
        let mut viewer = Viewer::new(Duration::from_millis(50));
        let path = Path::new("graph.png");
        let mut launched = Vec::new();

        viewer
            .open_with(path, |p| {
                launched.push((p.to_path_buf(), Instant::now()));
                Ok(())
            })
            .unwrap();
        viewer
            .open_with(path, |p| {
                launched.push((p.to_path_buf(), Instant::now()));
                Ok(())
            })
            .unwrap();

        assert_eq!(launched.len(), 2);
        assert_eq!(launched[0].0, path);
        assert!(launched[1].1 - launched[0].1 >= Duration::from_millis(50));
    }

    #[test]
    fn test_failed_launch_is_not_throttled() {
        let mut viewer = Viewer::default();
        let result = viewer.open_with(Path::new("graph.png"), |_| {
            Err(io::Error::new(io::ErrorKind::NotFound, "no opener"))
        });
        assert!(result.unwrap_err().to_string().contains("Failed to launch viewer"));
        assert_eq!(viewer.pending_delay(Instant::now()), None);
    }

    #[test]
    fn test_throttle_is_per_viewer() {
        let mut first = Viewer::default();
        let second = Viewer::default();
        let now = Instant::now();
        first.mark_launched(now);
        assert!(first.pending_delay(now).is_some());
        assert!(second.pending_delay(now).is_none());
    }
}
