//! One instance's control loop
//!
//! [`Session`] is the explicit context object: it owns the mapped store, the
//! role arbiter, the simulation engine and the platform collaborators. Each
//! iteration does, in order: input, role/liveness evaluation, a simulation
//! tick if one is due, render.

use std::time::{Duration, Instant};

use crate::error::Result;
use crate::heartbeat::{Cadence, HeartbeatMonitor};
use crate::platform::{InputEvent, InputSource, Renderer, ShutdownSignal};
use crate::role::{ClaimReason, Role, RoleArbiter, RoleChange};
use crate::settings::Settings;
use crate::shm::SharedStateStore;
use crate::sim::{Command, Simulation, move_interval_ms};
use crate::snapshot::Snapshot;

/// How long the takeover notice stays up before the game is drawn
const TAKEOVER_NOTICE_MS: u64 = 500;

pub struct Session<I: InputSource, R: Renderer> {
    store: SharedStateStore,
    arbiter: RoleArbiter,
    sim: Simulation,
    settings: Settings,
    input: I,
    renderer: R,
    signals: Option<ShutdownSignal>,
    stop: bool,
    started: Instant,
    moves: Cadence,
    hold_frames_until: u64,
}

impl<I: InputSource, R: Renderer> Session<I, R> {
    pub fn new(
        store: SharedStateStore,
        settings: Settings,
        id: u32,
        seed: u64,
        input: I,
        renderer: R,
    ) -> Self {
        let monitor = HeartbeatMonitor::new(settings.stale_timeout_ms);
        let arbiter = RoleArbiter::new(id, monitor, settings.heartbeat_interval_ms, 0);
        Self {
            store,
            arbiter,
            sim: Simulation::new(seed),
            settings,
            input,
            renderer,
            signals: None,
            stop: false,
            started: Instant::now(),
            moves: Cadence::starting_at(0),
            hold_frames_until: 0,
        }
    }

    /// Stop when SIGINT/SIGTERM/SIGHUP arrive
    pub fn with_signals(mut self, signals: ShutdownSignal) -> Self {
        self.signals = Some(signals);
        self
    }

    pub fn role(&self) -> Role {
        self.arbiter.role()
    }

    pub fn store(&self) -> &SharedStateStore {
        &self.store
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.store.read(), self.arbiter.role())
    }

    fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    fn stopping(&mut self) -> bool {
        if !self.stop && self.signals.as_mut().is_some_and(|s| s.received()) {
            self.stop = true;
        }
        self.stop
    }

    /// Probe, loop until quit, then release ownership (also on error)
    pub fn run(&mut self) -> Result<()> {
        let result = self.run_loop();
        let now = self.now_ms();
        self.finish(now);
        result
    }

    fn run_loop(&mut self) -> Result<()> {
        if !self.probe()? {
            return Ok(());
        }
        loop {
            let wait = if self.arbiter.is_active() {
                self.settings.active_poll_ms
            } else {
                self.settings.watching_poll_ms
            };
            let events = self.input.poll(Duration::from_millis(wait))?;
            let now = self.now_ms();
            if !self.advance(&events, now)? {
                return Ok(());
            }
        }
    }

    /// Sample the heartbeat, wait out the grace interval (still honouring
    /// quit), then pick the initial role. False if asked to stop meanwhile.
    fn probe(&mut self) -> Result<bool> {
        self.renderer.notice("Checking for active process...")?;
        let before = HeartbeatMonitor::sample(&self.store);
        let deadline = self.now_ms() + self.settings.probe_grace_ms;
        loop {
            let now = self.now_ms();
            if now >= deadline {
                break;
            }
            let wait = self.settings.watching_poll_ms.min(deadline - now);
            let events = self.input.poll(Duration::from_millis(wait))?;
            if events.contains(&InputEvent::Quit) {
                self.stop = true;
            }
            if self.stopping() {
                return Ok(false);
            }
        }
        let now = self.now_ms();
        self.begin(before, now)?;
        Ok(true)
    }

    /// Finish the startup probe given the heartbeat sampled one grace
    /// interval earlier
    pub fn begin(&mut self, heartbeat_before: u64, now_ms: u64) -> Result<()> {
        if let Some(change) = self.arbiter.start(&self.store, heartbeat_before, now_ms) {
            self.on_role_change(change, now_ms)?;
        }
        Ok(())
    }

    /// One loop iteration with the input gathered for it. False once the
    /// session should end.
    pub fn advance(&mut self, events: &[InputEvent], now_ms: u64) -> Result<bool> {
        for &event in events {
            self.handle_event(event, now_ms)?;
        }
        if self.stopping() {
            return Ok(false);
        }

        if let Some(change) = self.arbiter.poll(&self.store, now_ms) {
            self.on_role_change(change, now_ms)?;
        }

        if self.arbiter.is_active() && now_ms >= self.hold_frames_until {
            let interval = move_interval_ms(self.store.read().game.score);
            if self.moves.due(now_ms, interval) {
                let sim = &mut self.sim;
                self.store.write(|rec| sim.tick(rec));
            }
        }

        if now_ms >= self.hold_frames_until {
            let snapshot = self.snapshot();
            self.renderer.draw(&snapshot)?;
        }
        Ok(true)
    }

    fn handle_event(&mut self, event: InputEvent, now_ms: u64) -> Result<()> {
        let command = match event {
            InputEvent::Quit => {
                self.stop = true;
                return Ok(());
            }
            InputEvent::Transfer => {
                if let Some(change) = self.arbiter.request_transfer(&self.store, now_ms) {
                    self.on_role_change(change, now_ms)?;
                }
                return Ok(());
            }
            InputEvent::Move(dir) => Command::Turn(dir),
            InputEvent::PauseToggle => Command::TogglePause,
            InputEvent::Restart => Command::Restart,
        };
        if self.arbiter.is_active() {
            let sim = &mut self.sim;
            self.store.write(|rec| sim.apply(rec, command));
        }
        Ok(())
    }

    fn on_role_change(&mut self, change: RoleChange, now_ms: u64) -> Result<()> {
        match change {
            RoleChange::Claimed(reason) => {
                let policy = reason.resume_policy();
                let sim = &mut self.sim;
                self.store.write(|rec| sim.resume(rec, policy));
                self.moves.reset(now_ms);
                if reason == ClaimReason::Takeover {
                    self.renderer.notice("Taking over control...")?;
                    self.hold_frames_until = now_ms + TAKEOVER_NOTICE_MS;
                    // The snake stays put while the notice is up
                    self.moves.reset(self.hold_frames_until);
                }
            }
            RoleChange::TransferRequested
            | RoleChange::TransferAccepted
            | RoleChange::SteppedDown => {
                log::debug!("Role change: {change:?}");
            }
        }
        Ok(())
    }

    /// Release ownership so the counterpart can claim without waiting
    pub fn finish(&mut self, now_ms: u64) {
        self.arbiter.release(&self.store, now_ms);
        self.store.flush();
    }
}
