//! The poll loop: parse, normalize, render, publish, sleep, repeat.
//!
//! Each cycle runs to completion before the next starts:
//!
//! 1. Ask the [`TickSource`] for the table. If it fails the replay is not
//!    ready (still being written, locked, truncated); wait the not-ready
//!    delay and start over.
//! 2. Reduce the table to the latest tick with [`normalize`]. An empty
//!    table is handled like a source failure.
//! 3. Render to the console according to the [`DisplayMode`].
//! 4. Encode the [`OutboundPayload`] and hand it to the [`Publisher`],
//!    which recovers from transport failures on its own.
//! 5. Sleep the cycle interval.
//!
//! Nothing in the cycle is fatal; the loop runs until the process is
//! killed.

use std::io::Write;
use std::time::Duration;

use demoradar_types::{OutboundPayload, TICK_FIELDS};
use tracing::{debug, error, info, warn};

use crate::config::{BridgeConfig, DisplayMode};
use crate::normalize::{ConnectivityFilter, TickSnapshot, normalize};
use crate::publish::{Connector, Delivery, Publisher};
use crate::render::{self, RenderOptions};
use crate::retry::FixedDelayRetry;
use crate::source::TickSource;

/// Loop tuning derived from the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopSettings {
    /// Connectivity predicate applied to each tick.
    pub filter: ConnectivityFilter,
    /// Wait after the source was not ready.
    pub not_ready: FixedDelayRetry,
    /// Wait after a completed cycle.
    pub cycle_interval: Duration,
    /// Console verbosity.
    pub display: DisplayMode,
    /// Table rendering options.
    pub render: RenderOptions,
}

impl LoopSettings {
    /// Derive loop settings from the bridge configuration.
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            filter: config.connectivity_filter(),
            not_ready: config.not_ready_retry(),
            cycle_interval: config.cycle_interval(),
            display: config.display.mode,
            render: config.render_options(),
        }
    }
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self::from_config(&BridgeConfig::default())
    }
}

/// What a single cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The source could not produce a usable table.
    NotReady {
        /// Why the cycle was abandoned.
        reason: String,
    },
    /// A snapshot was built but could not be encoded.
    Skipped {
        /// The tick that was dropped.
        tick: i64,
        /// Why it was dropped.
        reason: String,
    },
    /// A snapshot was handed to the publisher.
    Published {
        /// The tick published.
        tick: i64,
        /// Number of players in the payload.
        players: usize,
        /// How the publisher handled it.
        delivery: Delivery,
    },
}

/// The top-level driver tying source, renderer, and publisher together.
pub struct PollLoop<S, C, W>
where
    S: TickSource,
    C: Connector,
    W: Write,
{
    source: S,
    publisher: Publisher<C>,
    console: W,
    settings: LoopSettings,
    cycles: u64,
}

impl<S, C, W> PollLoop<S, C, W>
where
    S: TickSource,
    C: Connector,
    W: Write,
{
    /// Assemble a loop. The publisher may be connected or not; it connects
    /// on first publish if needed.
    pub const fn new(source: S, publisher: Publisher<C>, console: W, settings: LoopSettings) -> Self {
        Self {
            source,
            publisher,
            console,
            settings,
            cycles: 0,
        }
    }

    /// The publisher owned by the loop.
    pub const fn publisher(&self) -> &Publisher<C> {
        &self.publisher
    }

    /// The console writer.
    pub const fn console(&self) -> &W {
        &self.console
    }

    /// Number of cycles started so far.
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run forever.
    pub async fn run(&mut self) {
        info!(
            source = self.source.describe(),
            display = ?self.settings.display,
            cycle_interval_ms = self.settings.cycle_interval.as_millis(),
            not_ready_delay_ms = self.settings.not_ready.delay().as_millis(),
            "poll loop started"
        );
        loop {
            self.step().await;
        }
    }

    /// Run one cycle, then sleep the delay that matches its outcome.
    pub async fn step(&mut self) -> CycleOutcome {
        let outcome = self.run_cycle().await;
        match outcome {
            CycleOutcome::NotReady { .. } => self.settings.not_ready.wait().await,
            CycleOutcome::Skipped { .. } | CycleOutcome::Published { .. } => {
                if !self.settings.cycle_interval.is_zero() {
                    tokio::time::sleep(self.settings.cycle_interval).await;
                }
            }
        }
        outcome
    }

    /// Run one cycle without sleeping afterwards.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        self.cycles = self.cycles.saturating_add(1);

        let table = match self.source.parse_ticks(&TICK_FIELDS).await {
            Ok(table) => table,
            Err(e) => return self.not_ready(e.to_string()),
        };

        let snapshot = match normalize(&table, self.settings.filter) {
            Ok(snapshot) => snapshot,
            Err(e) => return self.not_ready(e.to_string()),
        };

        let TickSnapshot { tick, players } = snapshot;
        let payload = OutboundPayload {
            demo: self.source.describe().to_owned(),
            tick,
            players,
        };

        let json = match payload.to_json() {
            Ok(json) => json,
            Err(e) => {
                error!(tick, error = %e, "failed to encode payload, dropping tick");
                return CycleOutcome::Skipped {
                    tick,
                    reason: e.to_string(),
                };
            }
        };

        if self.settings.display == DisplayMode::Full {
            self.print_full(&payload, &json);
        }

        let players = payload.players.len();
        let delivery = self.publisher.publish_text(json).await;

        if self.settings.display == DisplayMode::Minimal {
            info!(tick, players, ?delivery, "tick published");
        } else {
            debug!(tick, players, ?delivery, "tick published");
        }

        CycleOutcome::Published {
            tick,
            players,
            delivery,
        }
    }

    fn not_ready(&self, reason: String) -> CycleOutcome {
        warn!(
            source = self.source.describe(),
            reason = %reason,
            retry_in_ms = self.settings.not_ready.delay().as_millis(),
            "replay not ready for parsing"
        );
        CycleOutcome::NotReady { reason }
    }

    /// Console output is best-effort; a broken terminal never stops the
    /// stream.
    fn print_full(&mut self, payload: &OutboundPayload, json: &str) {
        let options = &self.settings.render;
        let mut screen = String::new();
        screen.push_str(&render::render_banner(&options.title, &payload.demo, payload.tick));
        screen.push_str("\n\n");
        for line in render::render_table(&payload.players, options) {
            screen.push_str(&line);
            screen.push('\n');
        }
        screen.push_str("\n[OUT] JSON sent to radar:\n");
        screen.push_str(json);
        screen.push('\n');

        let written = render::clear_screen(&mut self.console)
            .and_then(|()| self.console.write_all(screen.as_bytes()))
            .and_then(|()| self.console.flush());
        if let Err(e) = written {
            debug!(error = %e, "console write failed");
        }
    }
}

impl<S, C, W> std::fmt::Debug for PollLoop<S, C, W>
where
    S: TickSource,
    C: Connector,
    W: Write,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollLoop")
            .field("source", &self.source.describe())
            .field("publisher", &self.publisher)
            .field("settings", &self.settings)
            .field("cycles", &self.cycles)
            .finish_non_exhaustive()
    }
}
