//! Timed polling for long-running provider tasks.
//!
//! Queries the task status every five seconds until a terminal label or
//! the deadline. Status-query errors are swallowed -- they only cost
//! wall-clock budget, never correctness.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::client::MiniMaxClient;
use crate::error::ProviderError;

/// Fixed tick interval between status queries.
const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// One observation of a provider task.
#[derive(Debug, Clone, Default)]
pub struct TaskStatus {
    /// Provider status label ("Queueing", "Processing", "Success", ...).
    pub status: String,
    /// Indirect file reference that needs a second lookup for a URL.
    pub file_id: Option<String>,
    /// Direct download URL, when the provider returns one inline.
    pub download_url: Option<String>,
}

/// Terminal result of a successful poll.
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub download_url: Option<String>,
}

/// Source of task status observations. Implemented by [`MiniMaxClient`];
/// a stub implementation drives the poller tests.
#[async_trait]
pub trait TaskStatusSource {
    async fn task_status(&self, task_id: &str) -> Result<TaskStatus, ProviderError>;
    async fn resolve_file_url(&self, file_id: &str) -> Result<String, ProviderError>;
}

#[async_trait]
impl TaskStatusSource for MiniMaxClient {
    async fn task_status(&self, task_id: &str) -> Result<TaskStatus, ProviderError> {
        let response = self.get_task_status(task_id).await?;
        Ok(TaskStatus {
            status: response.status,
            file_id: if response.file_id.is_empty() {
                None
            } else {
                Some(response.file_id)
            },
            download_url: if response.file.download_url.is_empty() {
                None
            } else {
                Some(response.file.download_url)
            },
        })
    }

    async fn resolve_file_url(&self, file_id: &str) -> Result<String, ProviderError> {
        self.retrieve_file_url(file_id).await
    }
}

/// Whether a status label means the task finished successfully.
fn is_terminal_success(status: &str) -> bool {
    matches!(status, "Success" | "Completed")
}

/// Whether a status label means the task failed.
fn is_terminal_failure(status: &str) -> bool {
    matches!(status, "Failed" | "Error")
}

/// Poll `task_id` until a terminal state or the deadline.
///
/// - Unrecognized labels keep polling.
/// - Query errors are logged and skipped.
/// - On success with an indirect `file_id`, performs one extra lookup to
///   resolve the final download URL.
/// - Exceeding `timeout` returns [`ProviderError::Timeout`].
pub async fn wait_for_completion<S: TaskStatusSource + Sync>(
    source: &S,
    task_id: &str,
    timeout: Duration,
) -> Result<TaskOutcome, ProviderError> {
    let deadline = Instant::now() + timeout;
    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    // The first tick completes immediately; consume it so queries start
    // one interval after the task was submitted.
    ticker.tick().await;

    loop {
        ticker.tick().await;

        if Instant::now() > deadline {
            return Err(ProviderError::Timeout);
        }

        let status = match source.task_status(task_id).await {
            Ok(status) => status,
            Err(e) => {
                tracing::debug!(task_id, error = %e, "Status query failed; will retry");
                continue;
            }
        };

        tracing::debug!(task_id, status = %status.status, "Task status");

        if is_terminal_success(&status.status) {
            let download_url = match status.file_id {
                Some(file_id) => Some(source.resolve_file_url(&file_id).await?),
                None => status.download_url,
            };
            return Ok(TaskOutcome { download_url });
        }

        if is_terminal_failure(&status.status) {
            return Err(ProviderError::JobFailed {
                message: format!("task ended in status {}", status.status),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use assert_matches::assert_matches;

    use super::*;

    /// Stub that replays a scripted sequence of status observations,
    /// repeating the last one once the script runs out.
    struct ScriptedSource {
        script: Mutex<Vec<Result<TaskStatus, ProviderError>>>,
        resolved_url: Option<String>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<TaskStatus, ProviderError>>) -> Self {
            let mut script = script;
            script.reverse();
            Self {
                script: Mutex::new(script),
                resolved_url: None,
            }
        }

        fn with_resolved_url(mut self, url: &str) -> Self {
            self.resolved_url = Some(url.to_string());
            self
        }
    }

    fn status(label: &str) -> TaskStatus {
        TaskStatus {
            status: label.to_string(),
            ..Default::default()
        }
    }

    #[async_trait]
    impl TaskStatusSource for ScriptedSource {
        async fn task_status(&self, _task_id: &str) -> Result<TaskStatus, ProviderError> {
            let mut script = self.script.lock().unwrap();
            match script.pop() {
                Some(next) => next,
                None => Ok(status("Processing")),
            }
        }

        async fn resolve_file_url(&self, _file_id: &str) -> Result<String, ProviderError> {
            Ok(self.resolved_url.clone().expect("no resolved URL scripted"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn resolves_after_pending_ticks() {
        let source = ScriptedSource::new(vec![
            Ok(status("Queueing")),
            Ok(status("Processing")),
            Ok(TaskStatus {
                status: "Success".to_string(),
                download_url: Some("https://cdn.example/video.mp4".to_string()),
                ..Default::default()
            }),
        ]);

        let outcome = wait_for_completion(&source, "task-1", Duration::from_secs(300))
            .await
            .expect("task should succeed");
        assert_eq!(
            outcome.download_url.as_deref(),
            Some("https://cdn.example/video.mp4")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn indirect_file_id_is_resolved() {
        let source = ScriptedSource::new(vec![Ok(TaskStatus {
            status: "Completed".to_string(),
            file_id: Some("file-9".to_string()),
            ..Default::default()
        })])
        .with_resolved_url("https://cdn.example/resolved.mp4");

        let outcome = wait_for_completion(&source, "task-2", Duration::from_secs(300))
            .await
            .expect("task should succeed");
        assert_eq!(
            outcome.download_url.as_deref(),
            Some("https://cdn.example/resolved.mp4")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_failure_label_fails_the_poll() {
        let source = ScriptedSource::new(vec![Ok(status("Failed"))]);

        let err = wait_for_completion(&source, "task-3", Duration::from_secs(300))
            .await
            .unwrap_err();
        assert_matches!(err, ProviderError::JobFailed { .. });
    }

    #[tokio::test(start_paused = true)]
    async fn query_errors_are_swallowed() {
        let source = ScriptedSource::new(vec![
            Err(ProviderError::JobFailed {
                message: "transient".to_string(),
            }),
            Ok(status("Success")),
        ]);

        let outcome = wait_for_completion(&source, "task-4", Duration::from_secs(300))
            .await
            .expect("poll should survive a query error");
        assert_eq!(outcome.download_url, None);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_yields_timeout() {
        // Script never reaches a terminal state.
        let source = ScriptedSource::new(vec![]);

        let err = wait_for_completion(&source, "task-5", Duration::from_secs(12))
            .await
            .unwrap_err();
        assert_matches!(err, ProviderError::Timeout);
    }
}
