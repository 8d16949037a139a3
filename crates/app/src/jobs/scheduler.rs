use std::future::Future;
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval, sleep};
use tracing::warn;

use crate::jobs::JobError;

const FAILURE_BACKOFF: Duration = Duration::from_secs(30);

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
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires immediately; the startup sync is left to the user.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        if let Err(err) = job().await {
            warn!(error = %err, job = name, "job execution failed");
            sleep(FAILURE_BACKOFF).await;
        }
    }
}
