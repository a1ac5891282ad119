//! Real-time play against the async match host.
//!
//! Same policies as the batch runner, but the match advances on the host's
//! wall clock and each policy acts through [`MatchHandle::with_side`].

use std::time::Duration;

use broadside_core::config::TICK_DURATION_MS;
use broadside_core::prelude::*;
use broadside_runtime::{HostConfig, MatchHandle, MatchHost, Result, MIN_TICK_PERIOD};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::broadcast::Receiver;
use tokio::time;

use crate::loader::MatchData;
use crate::policy::{Policy, PolicyKind};

/// Settings for a live match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    /// Simulation speed multiplier; 1.0 is real time.
    pub speed: f64,
    /// Stop after this many ticks.
    pub max_ticks: Tick,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            max_ticks: crate::runner::DEFAULT_MAX_TICKS,
        }
    }
}

impl LiveConfig {
    /// Wall-clock period of one tick at this speed.
    pub fn tick_period(&self) -> Duration {
        let base = Duration::from_millis(u64::from(TICK_DURATION_MS));
        if self.speed > 0.0 && self.speed.is_finite() {
            base.div_f64(self.speed).max(MIN_TICK_PERIOD)
        } else {
            base
        }
    }
}

/// Play one match on the async host.
///
/// Every event the host publishes is passed to `on_event` in order. Returns
/// the final snapshot.
///
/// # Errors
///
/// Any [`broadside_runtime::RuntimeError`] raised while talking to the host.
pub async fn run_live(
    data: &MatchData,
    kinds: PerSide<PolicyKind>,
    seed: u64,
    config: LiveConfig,
    mut on_event: impl FnMut(&MatchEvent),
) -> Result<MatchSnapshot> {
    let host_config = HostConfig {
        tick_period: config.tick_period(),
        auto_start: true,
        ..HostConfig::default()
    };
    let tick_period = host_config.tick_period;
    let handle = MatchHost::spawn(host_config, data.config.clone(), data.catalog.clone())?;
    let mut events = handle.subscribe();
    let mut policies: PerSide<Option<Box<dyn Policy>>> = PerSide::from_fn(|side| {
        let side_seed = seed.wrapping_mul(2).wrapping_add(side.index() as u64);
        Some(kinds[side].build(&data.catalog, side_seed))
    });
    tracing::info!(seed, speed = config.speed, "Live match started");

    let mut ticker = time::interval(tick_period);
    let snapshot = loop {
        ticker.tick().await;
        for side in Side::ALL {
            if let Some(policy) = policies[side].take() {
                policies[side] = Some(act(&handle, side, policy).await?);
            }
        }

        loop {
            match events.try_recv() {
                Ok(event) => on_event(&event),
                Err(TryRecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Event subscriber lagged");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }

        let snapshot = handle.snapshot().await?;
        if snapshot.state != MatchState::Playing || snapshot.now >= config.max_ticks {
            break snapshot;
        }
    };

    handle.shutdown().await?;
    // The channel closes once the host and this handle have both dropped
    drop(handle);
    drain_remaining(&mut events, &mut on_event).await;
    tracing::info!(tick = snapshot.now, winner = ?snapshot.winner, "Live match finished");
    Ok(snapshot)
}

async fn act(
    handle: &MatchHandle,
    side: Side,
    policy: Box<dyn Policy>,
) -> Result<Box<dyn Policy>> {
    handle
        .with_side(side, move |port| {
            let mut policy = policy;
            policy.act(port);
            policy
        })
        .await
}

async fn drain_remaining(
    events: &mut Receiver<MatchEvent>,
    on_event: &mut impl FnMut(&MatchEvent),
) {
    loop {
        match events.recv().await {
            Ok(event) => on_event(&event),
            Err(RecvError::Lagged(missed)) => {
                tracing::warn!(missed, "Event subscriber lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
