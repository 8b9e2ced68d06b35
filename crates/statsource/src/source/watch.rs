//! Watch — wakeups for the live tail.
//!
//! Notifications only shorten the wait; the tail always falls back to the
//! poll interval, so a platform without a working watcher still progresses.

use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub struct LogWatch {
    // Dropping the watcher stops notifications.
    _watcher: Option<RecommendedWatcher>,
    notifications: Option<mpsc::UnboundedReceiver<Result<Event, notify::Error>>>,
    file_name: String,
}

impl LogWatch {
    /// Watch `dir` for changes to `file_name`. Failure to set up the watcher
    /// is logged and leaves plain polling.
    pub fn new(dir: &Path, file_name: &str) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let watcher = notify::recommended_watcher(move |result| {
            if sender.send(result).is_err() {
                debug!("log watcher notification receiver dropped");
            }
        })
        .and_then(|mut watcher| {
            watcher.watch(dir, RecursiveMode::NonRecursive)?;
            Ok(watcher)
        });

        match watcher {
            Ok(watcher) => Self {
                _watcher: Some(watcher),
                notifications: Some(receiver),
                file_name: file_name.to_string(),
            },
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "log watcher unavailable, polling only");
                Self::polling(file_name)
            }
        }
    }

    pub fn polling(file_name: &str) -> Self {
        Self {
            _watcher: None,
            notifications: None,
            file_name: file_name.to_string(),
        }
    }

    /// Wait until the watched file changes or `poll` elapses.
    pub async fn wait(&mut self, poll: Duration) {
        let Some(receiver) = self.notifications.as_mut() else {
            tokio::time::sleep(poll).await;
            return;
        };

        let deadline = tokio::time::Instant::now() + poll;
        loop {
            match tokio::time::timeout_at(deadline, receiver.recv()).await {
                Err(_) => return,
                Ok(None) => {
                    warn!("log watcher stopped, polling only");
                    self.notifications = None;
                    tokio::time::sleep_until(deadline).await;
                    return;
                }
                Ok(Some(Ok(event))) if is_relevant(&event, &self.file_name) => {
                    // Collapse a burst of writes into one wakeup.
                    while receiver.try_recv().is_ok() {}
                    return;
                }
                Ok(Some(Ok(_))) => {}
                Ok(Some(Err(err))) => warn!(error = %err, "log watcher error"),
            }
        }
    }
}

fn is_relevant(event: &Event, file_name: &str) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        && event
            .paths
            .iter()
            .any(|path| path.file_name() == Some(OsStr::new(file_name)))
}
