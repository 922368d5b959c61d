//! Two sessions sharing one file-backed region, driven with explicit time

use std::io;
use std::time::Duration;

use handoff_snake::platform::{InputEvent, InputSource, Renderer};
use handoff_snake::shm::NO_OWNER;
use handoff_snake::sim::{Direction, GamePhase};
use handoff_snake::snapshot::Snapshot;
use handoff_snake::{Role, Session, Settings, SharedStateStore};
use tempfile::NamedTempFile;

struct NoInput;

impl InputSource for NoInput {
    fn poll(&mut self, _timeout: Duration) -> io::Result<Vec<InputEvent>> {
        Ok(Vec::new())
    }
}

struct NullRenderer;

impl Renderer for NullRenderer {
    fn draw(&mut self, _snapshot: &Snapshot) -> io::Result<()> {
        Ok(())
    }

    fn notice(&mut self, _message: &str) -> io::Result<()> {
        Ok(())
    }
}

type TestSession = Session<NoInput, NullRenderer>;

fn session(file: &NamedTempFile, id: u32) -> TestSession {
    let (store, _) = SharedStateStore::open(file.path(), 0).unwrap();
    Session::new(
        store,
        Settings::default(),
        id,
        u64::from(id) * 7919,
        NoInput,
        NullRenderer,
    )
}

/// A claims a fresh region at t=0; B probes across one of A's heartbeats
/// and starts watching at t=1500
fn active_and_watching(file: &NamedTempFile) -> (TestSession, TestSession) {
    let mut a = session(file, 1);
    let before = a.store().heartbeat();
    a.begin(before, 0).unwrap();

    let mut b = session(file, 2);
    let before = b.store().heartbeat();
    a.advance(&[], 500).unwrap();
    b.begin(before, 1500).unwrap();
    assert_eq!(a.role(), Role::Active);
    assert_eq!(b.role(), Role::Watching);
    (a, b)
}

#[test]
fn fresh_region_first_instance_starts_new_game() {
    let file = NamedTempFile::new().unwrap();
    let mut a = session(&file, 1);
    a.begin(a.store().heartbeat(), 1500).unwrap();

    assert_eq!(a.role(), Role::Active);
    let snap = a.snapshot();
    assert_eq!(snap.length(), 3);
    assert_eq!(snap.score, 0);
    assert_eq!(snap.phase, GamePhase::Running);
    assert!(!snap.body.contains(&snap.food));
    assert_eq!(a.store().active_owner(), 1);
}

#[test]
fn active_instance_moves_snake_and_beats() {
    let file = NamedTempFile::new().unwrap();
    let mut a = session(&file, 1);
    a.begin(a.store().heartbeat(), 0).unwrap();
    let head = a.snapshot().body[0];
    let beat = a.store().heartbeat();

    // Heartbeats at 512 and 1024
    let mut t = 0;
    while t < 1100 {
        t += 16;
        assert!(a.advance(&[], t).unwrap());
    }
    let snap = a.snapshot();
    assert!(snap.body[0].x > head.x || snap.phase != GamePhase::Running);
    assert_eq!(a.store().heartbeat(), beat + 2);
}

#[test]
fn reverse_turn_is_ignored() {
    let file = NamedTempFile::new().unwrap();
    let mut a = session(&file, 1);
    a.begin(a.store().heartbeat(), 0).unwrap();
    assert_eq!(a.snapshot().direction, Direction::Right);

    a.advance(&[InputEvent::Move(Direction::Left)], 16).unwrap();
    assert_eq!(a.snapshot().direction, Direction::Right);

    a.advance(&[InputEvent::Move(Direction::Down)], 32).unwrap();
    assert_eq!(a.snapshot().direction, Direction::Down);
}

#[test]
fn watching_instance_cannot_steer() {
    let file = NamedTempFile::new().unwrap();
    let (_a, mut b) = active_and_watching(&file);
    b.advance(&[InputEvent::Move(Direction::Up), InputEvent::PauseToggle], 1600)
        .unwrap();
    let snap = b.snapshot();
    assert_eq!(snap.direction, Direction::Right);
    assert_eq!(snap.phase, GamePhase::Running);
}

#[test]
fn voluntary_transfer_keeps_game_intact() {
    let file = NamedTempFile::new().unwrap();
    let (mut a, mut b) = active_and_watching(&file);

    a.advance(&[InputEvent::Transfer], 1600).unwrap();
    assert_eq!(a.role(), Role::Watching);
    assert!(a.store().transfer_requested());
    let before = a.snapshot();

    b.advance(&[], 1650).unwrap();
    assert_eq!(b.role(), Role::Active);
    assert!(!b.store().transfer_requested());
    assert_eq!(b.store().active_owner(), 2);

    let after = b.snapshot();
    assert_eq!(after.body, before.body);
    assert_eq!(after.direction, before.direction);
    assert_eq!(after.food, before.food);
    assert_eq!(after.score, before.score);

    // The requester sees the request cleared and stays Watching
    a.advance(&[], 1700).unwrap();
    assert_eq!(a.role(), Role::Watching);
}

#[test]
fn killed_instance_is_taken_over_with_state_resumed() {
    let file = NamedTempFile::new().unwrap();
    let (mut a, mut b) = active_and_watching(&file);
    // Last heartbeat (t=1500) and a turn, then killed without releasing
    a.advance(&[InputEvent::Move(Direction::Down)], 1500).unwrap();
    let stored = a.snapshot();
    drop(a);

    let mut t = 1500;
    while b.role() == Role::Watching {
        t += 100;
        b.advance(&[], t).unwrap();
        assert!(t < 5000, "watcher never took over");
    }
    // First observation of the final beat is at 1600
    assert_eq!(t, 2600);
    assert_eq!(b.store().active_owner(), 2);

    // No move happens on the claiming iteration
    let resumed = b.snapshot();
    assert_eq!(resumed.body, stored.body);
    assert_eq!(resumed.direction, Direction::Down);
    assert_eq!(resumed.food, stored.food);
    assert_eq!(resumed.score, stored.score);
    assert_eq!(resumed.phase, GamePhase::Running);
}

#[test]
fn snake_holds_still_during_takeover_notice() {
    let file = NamedTempFile::new().unwrap();
    let (mut a, mut b) = active_and_watching(&file);
    a.advance(&[], 1500).unwrap();
    let stored = a.snapshot();
    drop(a);

    let mut t = 1500;
    while b.role() == Role::Watching {
        t += 100;
        b.advance(&[], t).unwrap();
    }
    let claimed_at = t;

    // Notice is up for 500ms, then one full move interval before the first step
    for t in (claimed_at + 16..claimed_at + 700).step_by(16) {
        b.advance(&[], t).unwrap();
        assert_eq!(b.snapshot().body, stored.body, "moved at {t}");
    }
    b.advance(&[], claimed_at + 700).unwrap();
    let moved = b.snapshot();
    assert!(moved.body != stored.body || moved.phase == GamePhase::GameOver);
}

#[test]
fn handoff_of_finished_game_leaves_it_for_restart() {
    let file = NamedTempFile::new().unwrap();
    let (mut a, mut b) = active_and_watching(&file);

    let mut t = 500;
    while a.snapshot().phase == GamePhase::Running {
        t += 16;
        a.advance(&[], t).unwrap();
        assert!(t < 60_000, "snake never crashed");
    }
    a.advance(&[InputEvent::Transfer], t + 16).unwrap();
    let ended = a.snapshot();
    assert_eq!(ended.phase, GamePhase::GameOver);

    b.advance(&[], t + 32).unwrap();
    assert_eq!(b.role(), Role::Active);
    assert_eq!(b.store().active_owner(), 2);

    let handed = b.snapshot();
    assert_eq!(handed.phase, GamePhase::GameOver);
    assert_eq!(handed.body, ended.body);
    assert_eq!(handed.score, ended.score);
    assert_eq!(handed.games_played, ended.games_played);

    b.advance(&[InputEvent::Restart], t + 48).unwrap();
    let restarted = b.snapshot();
    assert_eq!(restarted.phase, GamePhase::Running);
    assert_eq!(restarted.length(), 3);
}

#[test]
fn takeover_resumes_exact_stored_game() {
    let file = NamedTempFile::new().unwrap();
    let (mut a, mut b) = active_and_watching(&file);
    a.advance(&[InputEvent::PauseToggle], 1500).unwrap();
    let stored = a.snapshot();
    assert_eq!(stored.phase, GamePhase::Paused);
    drop(a);

    b.advance(&[], 2000).unwrap();
    assert_eq!(b.role(), Role::Watching);
    b.advance(&[], 2999).unwrap();
    assert_eq!(b.role(), Role::Watching);
    b.advance(&[], 3000).unwrap();
    assert_eq!(b.role(), Role::Active);

    let resumed = b.snapshot();
    assert_eq!(resumed.phase, GamePhase::Paused);
    assert_eq!(resumed.body, stored.body);
    assert_eq!(resumed.direction, stored.direction);
    assert_eq!(resumed.food, stored.food);
    assert_eq!(resumed.score, stored.score);
}

#[test]
fn takeover_of_finished_game_starts_new_one() {
    let file = NamedTempFile::new().unwrap();
    let (mut a, mut b) = active_and_watching(&file);

    // Drive A into the right wall
    let mut t = 500;
    while a.snapshot().phase == GamePhase::Running {
        t += 16;
        a.advance(&[], t).unwrap();
        assert!(t < 60_000, "snake never crashed");
    }
    let ended = a.snapshot();
    assert_eq!(ended.phase, GamePhase::GameOver);
    assert_eq!(ended.games_played, 1);
    drop(a);

    let mut u = t;
    while b.role() == Role::Watching {
        u += 100;
        b.advance(&[], u).unwrap();
        assert!(u < t + 5000, "watcher never took over");
    }
    let fresh = b.snapshot();
    assert_eq!(fresh.phase, GamePhase::Running);
    assert_eq!(fresh.length(), 3);
    assert_eq!(fresh.score, 0);
    assert_eq!(fresh.high_score, ended.high_score);
    assert_eq!(fresh.games_played, 1);
}

#[test]
fn quitting_releases_ownership_for_counterpart() {
    let file = NamedTempFile::new().unwrap();
    let (mut a, mut b) = active_and_watching(&file);

    assert!(!a.advance(&[InputEvent::Quit], 1600).unwrap());
    a.finish(1600);
    assert_eq!(a.store().active_owner(), NO_OWNER);

    b.advance(&[], 1616).unwrap();
    assert_eq!(b.role(), Role::Active);
}

#[test]
fn restart_after_game_over_keeps_high_score() {
    let file = NamedTempFile::new().unwrap();
    let mut a = session(&file, 1);
    a.begin(a.store().heartbeat(), 0).unwrap();
    let mut t = 0;
    while a.snapshot().phase == GamePhase::Running {
        t += 16;
        a.advance(&[], t).unwrap();
    }
    let high = a.snapshot().high_score;

    a.advance(&[InputEvent::Restart], t + 16).unwrap();
    let snap = a.snapshot();
    assert_eq!(snap.phase, GamePhase::Running);
    assert_eq!(snap.score, 0);
    assert!(snap.high_score >= high);
}
