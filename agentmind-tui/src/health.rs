//! Background backend readiness monitor with retry backoff.

use crate::config::HealthConfig;
use crate::events::TuiEvent;
use agentmind_client::AgentTransport;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Poll readiness until `shutdown` fires or the UI loop goes away.
///
/// While the backend is unavailable the delay grows from `initial_ms` by
/// `multiplier` up to `max_ms`; once ready it polls every `interval_ms`.
pub fn spawn_health_monitor(
    transport: Arc<dyn AgentTransport>,
    config: HealthConfig,
    sender: mpsc::Sender<TuiEvent>,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut backoff = config.initial_ms;
        let mut last = None;
        loop {
            let ready = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                ready = transport.health() => ready,
            };

            if last != Some(ready) {
                tracing::info!(ready, "Backend readiness changed");
                last = Some(ready);
            }
            if sender.send(TuiEvent::Health(ready)).await.is_err() {
                break;
            }

            let delay = if ready {
                backoff = config.initial_ms;
                config.interval_ms
            } else {
                let delay = jittered_backoff(backoff, config.jitter_ms);
                backoff = next_backoff(backoff, &config);
                delay
            };

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(Duration::from_millis(delay)) => {}
            }
        }
    })
}

pub fn next_backoff(current_ms: u64, config: &HealthConfig) -> u64 {
    let next = (current_ms as f64 * config.multiplier) as u64;
    next.clamp(config.initial_ms, config.max_ms)
}

fn jittered_backoff(base_ms: u64, jitter_ms: u64) -> u64 {
    if jitter_ms == 0 {
        return base_ms;
    }
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_nanos(0))
        .subsec_nanos() as u64;
    base_ms.saturating_add(nanos % jitter_ms)
}
