use crate::error::DelegateError;
use crate::protocol::ProgressStatus;
use crate::FormatService;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_polls: usize,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            max_polls: 240,
        }
    }
}

/// Polls `job_id` until the service reports a terminal status. Every
/// snapshot, terminal or not, is passed to `on_update`.
pub async fn poll_progress<S, F>(
    service: &S,
    job_id: &str,
    cfg: &PollConfig,
    mut on_update: F,
) -> Result<ProgressStatus, DelegateError>
where
    S: FormatService,
    F: FnMut(&ProgressStatus),
{
    for poll in 0..cfg.max_polls {
        if poll > 0 {
            tokio::time::sleep(cfg.interval).await;
        }
        let status = service.progress(job_id).await?;
        tracing::debug!(
            job_id,
            processed = status.items_processed,
            total = status.total_items,
            status = %status.status,
            "export progress"
        );
        on_update(&status);
        if status.is_terminal() {
            return Ok(status);
        }
    }
    Err(DelegateError::PollLimit {
        polls: cfg.max_polls,
    })
}
