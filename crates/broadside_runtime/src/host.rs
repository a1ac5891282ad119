//! The match host task and its handle.

use std::time::Duration;

use broadside_core::prelude::*;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{self, MissedTickBehavior};

use crate::{HostConfig, Result, RuntimeError};

type SideJob = Box<dyn FnOnce(&mut MatchContext) + Send>;

/// Shortest tick period the host will run at.
pub const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

enum Command {
    Start(oneshot::Sender<broadside_core::error::Result<()>>),
    Pause(oneshot::Sender<broadside_core::error::Result<()>>),
    Resume(oneshot::Sender<broadside_core::error::Result<()>>),
    Play {
        side: Side,
        card: CardId,
        lane: LaneIndex,
        target: Option<UnitId>,
        reply: oneshot::Sender<std::result::Result<PlayOutcome, ActionError>>,
    },
    Launch {
        side: Side,
        lane: LaneIndex,
        reply: oneshot::Sender<std::result::Result<UnitId, ActionError>>,
    },
    Snapshot(oneshot::Sender<MatchSnapshot>),
    Run(SideJob),
    Shutdown,
}

/// Owns a match and drives it on a fixed wall-clock cadence.
pub struct MatchHost {
    config: HostConfig,
    ctx: MatchContext,
    commands: mpsc::Receiver<Command>,
    events: broadcast::Sender<MatchEvent>,
}

impl MatchHost {
    /// Build a match and spawn its host on the current tokio runtime.
    ///
    /// The host stops on [`MatchHandle::shutdown`] or once every handle is
    /// dropped.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::Game`] if the match configuration is invalid or the
    /// auto-start fails.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn spawn(
        host_config: HostConfig,
        match_config: MatchConfig,
        catalog: CardCatalog,
    ) -> Result<MatchHandle> {
        let mut ctx = MatchContext::new(match_config, catalog)?;
        if host_config.auto_start {
            ctx.start_match()?;
        }

        let (command_tx, command_rx) = mpsc::channel(host_config.command_capacity.max(1));
        let (event_tx, _) = broadcast::channel(host_config.event_capacity.max(1));
        let handle = MatchHandle {
            commands: command_tx,
            events: event_tx.clone(),
        };

        let host = Self {
            config: host_config,
            ctx,
            commands: command_rx,
            events: event_tx,
        };
        tokio::spawn(host.run());
        Ok(handle)
    }

    async fn run(mut self) {
        let period = self.config.tick_period.max(MIN_TICK_PERIOD);
        if period != self.config.tick_period {
            tracing::warn!(requested = ?self.config.tick_period, ?period, "Tick period raised to the minimum");
        }
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(period_ms = period.as_millis(), "Match host started");

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.apply(command),
                },
                _ = ticker.tick() => {
                    self.ctx.tick();
                }
            }
            self.publish();
        }

        tracing::info!(tick = self.ctx.now(), state = ?self.ctx.state(), "Match host stopped");
    }

    fn apply(&mut self, command: Command) {
        // A dropped reply receiver only means the caller stopped waiting
        match command {
            Command::Start(reply) => {
                let _ = reply.send(self.ctx.start_match());
            }
            Command::Pause(reply) => {
                let _ = reply.send(self.ctx.pause_match());
            }
            Command::Resume(reply) => {
                let _ = reply.send(self.ctx.resume_match());
            }
            Command::Play {
                side,
                card,
                lane,
                target,
                reply,
            } => {
                let _ = reply.send(self.ctx.play_card_by_id(&card, lane, target, side));
            }
            Command::Launch { side, lane, reply } => {
                let _ = reply.send(self.ctx.launch(lane, side));
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.ctx.snapshot());
            }
            Command::Run(job) => job(&mut self.ctx),
            Command::Shutdown => {}
        }
    }

    fn publish(&mut self) {
        for event in self.ctx.drain_events() {
            // No subscribers is not an error
            let _ = self.events.send(event);
        }
    }
}

/// Cloneable handle to a running [`MatchHost`].
#[derive(Debug, Clone)]
pub struct MatchHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<MatchEvent>,
}

impl MatchHandle {
    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| RuntimeError::HostClosed)?;
        rx.await.map_err(|_| RuntimeError::HostClosed)
    }

    /// Start a match from the menu or after one ended.
    pub async fn start_match(&self) -> Result<()> {
        Ok(self.request(Command::Start).await??)
    }

    /// Pause the running match.
    pub async fn pause_match(&self) -> Result<()> {
        Ok(self.request(Command::Pause).await??)
    }

    /// Resume a paused match.
    pub async fn resume_match(&self) -> Result<()> {
        Ok(self.request(Command::Resume).await??)
    }

    /// Play a catalog card for `side`.
    pub async fn play_card(
        &self,
        side: Side,
        card: CardId,
        lane: LaneIndex,
        target: Option<UnitId>,
    ) -> Result<PlayOutcome> {
        let outcome = self
            .request(|reply| Command::Play {
                side,
                card,
                lane,
                target,
                reply,
            })
            .await?;
        Ok(outcome?)
    }

    /// Launch `side`'s buffer on `lane`.
    pub async fn launch(&self, side: Side, lane: LaneIndex) -> Result<UnitId> {
        let id = self
            .request(|reply| Command::Launch { side, lane, reply })
            .await?;
        Ok(id?)
    }

    /// Capture the match state between ticks.
    pub async fn snapshot(&self) -> Result<MatchSnapshot> {
        self.request(Command::Snapshot).await
    }

    /// Run `f` against a [`SideFacade`] for `side` on the host task.
    ///
    /// Policies use this to read the match and act in one step without a
    /// tick landing in between.
    pub async fn with_side<R, F>(&self, side: Side, f: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut SidePort<'_>) -> R + Send + 'static,
    {
        self.request(move |reply| {
            Command::Run(Box::new(move |ctx: &mut MatchContext| {
                let mut port = ctx.port(side);
                let _ = reply.send(f(&mut port));
            }))
        })
        .await
    }

    /// Receive every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<MatchEvent> {
        self.events.subscribe()
    }

    /// Stop the host. Later requests fail with [`RuntimeError::HostClosed`].
    pub async fn shutdown(&self) -> Result<()> {
        self.commands
            .send(Command::Shutdown)
            .await
            .map_err(|_| RuntimeError::HostClosed)
    }

    /// Whether the host task is still accepting commands.
    pub fn is_open(&self) -> bool {
        !self.commands.is_closed()
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Start(_) => "Start",
            Self::Pause(_) => "Pause",
            Self::Resume(_) => "Resume",
            Self::Play { .. } => "Play",
            Self::Launch { .. } => "Launch",
            Self::Snapshot(_) => "Snapshot",
            Self::Run(_) => "Run",
            Self::Shutdown => "Shutdown",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use broadside_test_utils::fixtures::{fast_config, standard_catalog};

    fn host_config() -> HostConfig {
        HostConfig {
            tick_period: Duration::from_millis(50),
            ..HostConfig::default()
        }
    }

    fn spawn_fast() -> MatchHandle {
        MatchHost::spawn(host_config(), fast_config(), standard_catalog()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_lifecycle_requests_round_trip() {
        let handle = spawn_fast();
        assert!(matches!(
            handle.pause_match().await,
            Err(RuntimeError::Game(GameError::InvalidTransition { .. }))
        ));

        handle.start_match().await.unwrap();
        handle.pause_match().await.unwrap();
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.state, MatchState::Paused);

        handle.resume_match().await.unwrap();
        assert_eq!(handle.snapshot().await.unwrap().state, MatchState::Playing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_advance_with_time() {
        let handle = spawn_fast();
        handle.start_match().await.unwrap();
        handle
            .play_card(Side::A, CardId::new("deckhand"), 0, None)
            .await
            .unwrap();
        let id = handle.launch(Side::A, 0).await.unwrap();

        time::sleep(Duration::from_millis(50 * 40)).await;
        let snapshot = handle.snapshot().await.unwrap();
        assert!(snapshot.now >= 20);
        assert_eq!(snapshot.boardings.a, 1);
        assert!(snapshot.lanes[0].units.iter().all(|unit| unit.id != id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_period_runs_at_minimum() {
        let config = HostConfig {
            tick_period: Duration::ZERO,
            auto_start: true,
            ..HostConfig::default()
        };
        let handle = MatchHost::spawn(config, fast_config(), standard_catalog()).unwrap();

        time::sleep(MIN_TICK_PERIOD * 100).await;
        let now = handle.snapshot().await.unwrap().now;
        assert!((50..=101).contains(&now), "ticked {now} times");
    }

    #[tokio::test(start_paused = true)]
    async fn test_paused_match_does_not_tick() {
        let handle = spawn_fast();
        handle.start_match().await.unwrap();
        handle.pause_match().await.unwrap();
        let before = handle.snapshot().await.unwrap().now;

        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(handle.snapshot().await.unwrap().now, before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejections_are_reported() {
        let handle = spawn_fast();
        let err = handle.launch(Side::B, 1).await.unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Rejected(ActionError::NotPlaying(MatchState::Menu))
        ));

        handle.start_match().await.unwrap();
        let err = handle
            .play_card(Side::B, CardId::new("kraken"), 1, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Rejected(ActionError::UnknownCard(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_receive_events() {
        let handle = spawn_fast();
        let mut events = handle.subscribe();

        handle.start_match().await.unwrap();
        let first = events.recv().await.unwrap();
        assert_eq!(
            first,
            MatchEvent::StateChanged {
                from: MatchState::Menu,
                to: MatchState::Playing
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_side_acts_atomically() {
        let handle = spawn_fast();
        handle.start_match().await.unwrap();

        let launched = handle
            .with_side(Side::B, |port| {
                let card = CardId::new("gunner");
                port.play_card(&card, 2, None).and_then(|_| port.launch(2))
            })
            .await
            .unwrap()
            .unwrap();

        let own = handle.with_side(Side::B, |port| port.own_units()).await.unwrap();
        assert_eq!(own.len(), 1);
        let enemies = handle
            .with_side(Side::A, |port| port.enemy_units())
            .await
            .unwrap();
        assert_eq!(enemies.len(), 1);
        assert_eq!(enemies[0].id, launched);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_closes_host() {
        let handle = spawn_fast();
        handle.shutdown().await.unwrap();
        assert!(matches!(
            handle.snapshot().await,
            Err(RuntimeError::HostClosed)
        ));
        assert!(!handle.is_open());
    }

    #[tokio::test]
    async fn test_auto_start() {
        let config = HostConfig {
            auto_start: true,
            ..host_config()
        };
        let handle = MatchHost::spawn(config, fast_config(), standard_catalog()).unwrap();
        assert_ne!(handle.snapshot().await.unwrap().state, MatchState::Menu);
    }
}
