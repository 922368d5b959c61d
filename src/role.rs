//! Active/Watching role arbitration
//!
//! There is no lock. Each instance evaluates the same shared control fields
//! and converges within about one heartbeat cycle:
//!
//! - `active_owner` names the Active instance (last writer wins; an Active
//!   instance that sees another id steps down).
//! - `heartbeat` only moves while someone is Active; a Watching instance that
//!   sees it frozen for the stale timeout takes over.
//! - `transfer_request` is raised by the Active instance to hand over and
//!   cleared by compare-and-swap by the instance that accepts.
//!
//! Re-observing any of these before they change is harmless: every
//! transition below is guarded by the current role or by a CAS.

use serde::{Deserialize, Serialize};

use crate::heartbeat::{Beat, Cadence, HeartbeatMonitor};
use crate::shm::{NO_OWNER, SharedStateStore};
use crate::sim::Resume;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Drives the simulation and the heartbeat
    Active,
    /// Read-only, waiting for a handoff or a dead counterpart
    Watching,
}

/// Why this instance became Active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimReason {
    /// No heartbeat progress during the startup probe
    Startup,
    /// Accepted a voluntary transfer
    Handoff,
    /// Counterpart heartbeat went stale
    Takeover,
    /// Counterpart released ownership on exit
    Vacated,
}

impl ClaimReason {
    /// How the stored game should be treated after this claim
    pub fn resume_policy(self) -> Resume {
        match self {
            ClaimReason::Startup | ClaimReason::Handoff => Resume::IfEmpty,
            ClaimReason::Takeover | ClaimReason::Vacated => Resume::IfEmptyOrOver,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleChange {
    Claimed(ClaimReason),
    /// This instance asked to hand over and is now Watching
    TransferRequested,
    /// Our transfer request was cleared by the counterpart
    TransferAccepted,
    /// Another instance owns the region; back to Watching
    SteppedDown,
}

#[derive(Debug)]
pub struct RoleArbiter {
    id: u32,
    role: Role,
    /// Set while our own transfer request is outstanding
    own_request: bool,
    last_seen: Beat,
    monitor: HeartbeatMonitor,
    pacer: Cadence,
    heartbeat_interval_ms: u64,
}

impl RoleArbiter {
    /// A Watching arbiter that has not probed yet. `id` must not be
    /// [`NO_OWNER`].
    pub fn new(id: u32, monitor: HeartbeatMonitor, heartbeat_interval_ms: u64, now_ms: u64) -> Self {
        debug_assert_ne!(id, NO_OWNER);
        Self {
            id,
            role: Role::Watching,
            own_request: false,
            last_seen: Beat::new(0, now_ms),
            monitor,
            pacer: Cadence::starting_at(now_ms),
            heartbeat_interval_ms,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_active(&self) -> bool {
        self.role == Role::Active
    }

    /// True while our own handoff request is waiting for the counterpart
    pub fn transfer_pending(&self) -> bool {
        self.own_request
    }

    /// Finish the startup probe: `before` was sampled one grace interval ago.
    /// A moving heartbeat means someone else is Active.
    pub fn start(&mut self, store: &SharedStateStore, before: u64, now_ms: u64) -> Option<RoleChange> {
        let after = HeartbeatMonitor::sample(store);
        if after != before {
            log::info!("Heartbeat moved {before} -> {after} during probe, watching");
            self.enter_watching(store, now_ms);
            return None;
        }
        Some(self.claim(store, now_ms, ClaimReason::Startup))
    }

    /// Voluntarily hand control to the counterpart
    pub fn request_transfer(&mut self, store: &SharedStateStore, now_ms: u64) -> Option<RoleChange> {
        if !self.is_active() {
            return None;
        }
        store.request_transfer();
        store.release_owner(self.id);
        self.own_request = true;
        self.enter_watching(store, now_ms);
        log::info!("Instance {} requested transfer", self.id);
        Some(RoleChange::TransferRequested)
    }

    /// Evaluate role and liveness; called once per loop iteration
    pub fn poll(&mut self, store: &SharedStateStore, now_ms: u64) -> Option<RoleChange> {
        match self.role {
            Role::Active => self.poll_active(store, now_ms),
            Role::Watching => self.poll_watching(store, now_ms),
        }
    }

    fn poll_active(&mut self, store: &SharedStateStore, now_ms: u64) -> Option<RoleChange> {
        let owner = store.active_owner();
        if owner != self.id {
            if owner == NO_OWNER {
                log::warn!("Ownership field was cleared while active, reasserting");
                store.set_active_owner(self.id);
            } else {
                log::warn!("Instance {owner} owns the region, stepping down");
                self.enter_watching(store, now_ms);
                return Some(RoleChange::SteppedDown);
            }
        }

        if self.pacer.due(now_ms, self.heartbeat_interval_ms) {
            store.bump_heartbeat();
        }
        None
    }

    fn poll_watching(&mut self, store: &SharedStateStore, now_ms: u64) -> Option<RoleChange> {
        if self.own_request {
            if !store.transfer_requested() {
                log::info!("Transfer accepted by counterpart");
                self.own_request = false;
                return Some(RoleChange::TransferAccepted);
            }
        } else {
            // Owner first: the requester raises the flag before releasing, so
            // a vacancy seen mid-handoff always finds the flag still set
            let vacant = store.active_owner() == NO_OWNER;
            if store.take_transfer_request() {
                return Some(self.claim(store, now_ms, ClaimReason::Handoff));
            }
            if vacant {
                return Some(self.claim(store, now_ms, ClaimReason::Vacated));
            }
        }

        let beat = Beat::new(HeartbeatMonitor::sample(store), now_ms);
        if beat.value != self.last_seen.value {
            self.last_seen = beat;
            return None;
        }
        if self.monitor.is_stale(self.last_seen, beat) {
            log::warn!(
                "Heartbeat stuck at {} for {}ms, taking over",
                beat.value,
                beat.at_ms.saturating_sub(self.last_seen.at_ms)
            );
            return Some(self.claim(store, now_ms, ClaimReason::Takeover));
        }
        None
    }

    /// Give up ownership on exit so the counterpart need not wait out the
    /// stale timeout
    pub fn release(&mut self, store: &SharedStateStore, now_ms: u64) {
        if self.is_active() {
            if store.release_owner(self.id) {
                log::info!("Instance {} released ownership", self.id);
            }
            self.enter_watching(store, now_ms);
        }
    }

    fn claim(&mut self, store: &SharedStateStore, now_ms: u64, reason: ClaimReason) -> RoleChange {
        store.set_active_owner(self.id);
        store.clear_transfer_request();
        store.bump_heartbeat();
        self.role = Role::Active;
        self.own_request = false;
        self.pacer.reset(now_ms);
        log::info!("Instance {} is now active ({reason:?})", self.id);
        RoleChange::Claimed(reason)
    }

    fn enter_watching(&mut self, store: &SharedStateStore, now_ms: u64) {
        self.role = Role::Watching;
        self.last_seen = Beat::new(HeartbeatMonitor::sample(store), now_ms);
    }
}
