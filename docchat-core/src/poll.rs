use crate::SessionError;
use llm::{FileProvider, FileState, RemoteFile};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How long to wait for an uploaded file to finish processing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: 300,
        }
    }
}

impl From<&config::Settings> for PollPolicy {
    fn from(settings: &config::Settings) -> Self {
        Self {
            interval: settings.poll_interval(),
            max_attempts: settings.max_poll_attempts,
        }
    }
}

/// Poll the file status until it leaves `Processing`.
///
/// The first status check happens immediately. Returns the active file, or
/// `UploadFailed` for any other terminal state.
pub async fn wait_for_active<P>(
    files: &P,
    name: &str,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<RemoteFile, SessionError>
where
    P: FileProvider + Sync + ?Sized,
{
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        let file = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SessionError::Cancelled),
            result = files.get_file(name) => result.map_err(SessionError::request_failed)?,
        };

        match file.state {
            FileState::Processing => {
                tracing::debug!(file = name, attempts, "File still processing");
            }
            FileState::Active => {
                tracing::info!(file = name, attempts, "File is active");
                return Ok(file);
            }
            state => {
                tracing::warn!(file = name, %state, "File processing did not succeed");
                return Err(SessionError::UploadFailed {
                    file: file.name,
                    reason: file.error,
                });
            }
        }

        if attempts >= policy.max_attempts {
            return Err(SessionError::PollTimeout {
                file: name.to_string(),
                attempts,
            });
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SessionError::Cancelled),
            _ = tokio::time::sleep(policy.interval) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeState;

    fn policy(max_attempts: u32) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(1),
            max_attempts,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_until_active() {
        let state = FakeState::new();
        state.push_states([FileState::Processing, FileState::Processing, FileState::Active]);
        let provider = state.provider();

        let started = tokio::time::Instant::now();
        let file = wait_for_active(&provider, "files/doc-1", &policy(10), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(file.state, FileState::Active);
        assert_eq!(state.calls_named("get_file"), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_state_on_nth_poll() {
        let state = FakeState::new();
        state.push_states([FileState::Processing, FileState::Processing, FileState::Failed]);
        let provider = state.provider();

        let err = wait_for_active(&provider, "files/doc-1", &policy(10), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::UploadFailed { ref file, .. } if file == "files/doc-1"));
        assert_eq!(state.calls_named("get_file"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unspecified_state_is_failure() {
        let state = FakeState::new();
        state.push_states([FileState::Unspecified]);
        let provider = state.provider();

        let err = wait_for_active(&provider, "files/doc-1", &policy(10), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::UploadFailed { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let state = FakeState::new();
        state.push_states(std::iter::repeat(FileState::Processing).take(20));
        let provider = state.provider();

        let err = wait_for_active(&provider, "files/doc-1", &policy(4), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::PollTimeout { attempts: 4, .. }));
        assert_eq!(state.calls_named("get_file"), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_waiting() {
        let state = FakeState::new();
        state.push_states(std::iter::repeat(FileState::Processing).take(100));
        let provider = state.provider();
        let cancel = CancellationToken::new();

        let canceller = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(2500)).await;
                cancel.cancel();
            })
        };

        let err = wait_for_active(&provider, "files/doc-1", &policy(100), &cancel)
            .await
            .unwrap_err();
        canceller.await.unwrap();

        assert!(matches!(err, SessionError::Cancelled));
        assert_eq!(state.calls_named("get_file"), 3);
    }

    #[tokio::test]
    async fn test_status_error_is_request_failure() {
        let state = FakeState::new();
        state.fail_status("404 Not Found");
        let provider = state.provider();

        let err = wait_for_active(&provider, "files/gone", &policy(3), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::RequestFailed(msg) if msg.contains("404")));
    }
}
