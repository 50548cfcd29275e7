// Copyright (c) 2025 - Cowboy AI, Inc.
//! Tick Loop
//!
//! One [`Pipeline`] drives one stage graph. Each tick:
//!
//! ```text
//! backend.now() ──> backend.poll_input() ──> clock.advance(now)
//!                                                  │
//!                  renderer.render(&state) <── input.sample(snapshot, now)
//! ```
//!
//! The clock moves before sampling, so a debounce whose wait ended at or
//! before `now` fires ahead of the new tick's input. Every terminal callback
//! has run by the time `tick` returns, and the renderer reads the state after
//! that.
//!
//! A failing `poll_input` ends the loop with that error; the pipeline does not
//! retry device failures.

use crate::config::PipelineConfig;
use crate::errors::PipelineResult;
use crate::frp::{Clock, Time};
use crate::input::{InputBackend, InputSnapshot, InputSource};
use crate::store::Store;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Consumer of the state record after every tick
pub trait Renderer<S> {
    /// Draw or otherwise consume the state
    fn render(&mut self, state: &S) -> PipelineResult<()>;
}

impl<S, F> Renderer<S> for F
where
    F: FnMut(&S) -> PipelineResult<()>,
{
    fn render(&mut self, state: &S) -> PipelineResult<()> {
        self(state)
    }
}

/// What one tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    /// Tick time
    pub time: Time,
    /// Input events pushed during the tick
    pub events: usize,
}

/// What a whole run did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Ticks executed
    pub ticks: u64,
    /// Input events pushed over all ticks
    pub events: u64,
    /// Time of the last tick
    pub last_time: Option<Time>,
}

/// Clock and input source of one stage graph
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    clock: Clock,
    input: InputSource,
    ticks: u64,
}

impl Pipeline {
    /// Create a pipeline with its clock at time zero
    pub fn new(config: PipelineConfig) -> Self {
        Self::starting_at(config, 0)
    }

    /// Create a pipeline with its clock at `start`
    pub fn starting_at(config: PipelineConfig, start: Time) -> Self {
        debug!(?config, start, "Creating pipeline");
        Self {
            config,
            clock: Clock::new(start),
            input: InputSource::new(),
            ticks: 0,
        }
    }

    /// Configuration the pipeline was built with
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Clock for time-driven stages
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Input streams to build stages on
    pub fn input(&self) -> &InputSource {
        &self.input
    }

    /// Number of ticks executed so far
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Advance time to `now`, then push the snapshot's events
    ///
    /// Returns `ClockRegression` without sampling if `now` is in the past.
    pub fn tick(&mut self, snapshot: &InputSnapshot, now: Time) -> PipelineResult<TickReport> {
        self.clock.advance(now)?;
        let events = self.input.sample(snapshot, now);
        self.ticks += 1;
        Ok(TickReport { time: now, events })
    }

    /// Run one tick from a backend
    pub fn run_tick<B: InputBackend>(&mut self, backend: &mut B) -> PipelineResult<TickReport> {
        let now = backend.now();
        let snapshot = backend.poll_input()?;
        self.tick(&snapshot, now)
    }

    /// Tick until the backend asks to close, rendering after every tick
    pub fn run<B, S, R>(&mut self, backend: &mut B, store: &Store<S>, renderer: &mut R) -> PipelineResult<RunSummary>
    where
        B: InputBackend,
        S: 'static,
        R: Renderer<S>,
    {
        info!("Starting tick loop");
        let mut summary = RunSummary::default();
        while !backend.should_close() {
            let report = self.run_tick(backend)?;
            renderer.render(&store.read())?;
            summary.ticks += 1;
            summary.events += report.events as u64;
            summary.last_time = Some(report.time);
        }
        info!(ticks = summary.ticks, events = summary.events, "Tick loop finished");
        Ok(summary)
    }

    /// Complete every input stream
    ///
    /// Stages flush what they hold (pending debounce values, open buffers) and
    /// completion callbacks run.
    pub fn shutdown(&self) {
        info!(ticks = self.ticks, "Shutting down pipeline");
        self.input.close();
    }
}
