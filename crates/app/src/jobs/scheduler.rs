use std::future::Future;
use std::time::Duration;

use tokio::time::{interval, sleep};
use tracing::{error, warn};

use crate::jobs::JobError;

const RETRY_BACKOFF: Duration = Duration::from_secs(30);

pub async fn run_interval<F, Fut>(
    name: &'static str,
    interval_duration: Duration,
    mut job: F,
) -> Result<(), JobError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), JobError>>,
{
    let mut ticker = interval(interval_duration);
    loop {
        ticker.tick().await;
        match job().await {
            Ok(()) => {}
            Err(err) if err.is_fatal() => {
                error!(error = %err, job = name, "job stopped");
                return Err(err);
            }
            Err(err) => {
                warn!(error = %err, job = name, "job execution failed");
                sleep(RETRY_BACKOFF).await;
            }
        }
    }
}
