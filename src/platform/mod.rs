//! Platform abstraction layer
//!
//! The session only talks to the terminal and the OS through the traits
//! here, so it can be driven by scripted inputs in tests:
//! - Input events ([`InputSource`])
//! - Frames ([`Renderer`])
//! - Cooperative shutdown ([`signals::ShutdownSignal`])

pub mod input;
pub mod signals;
pub mod terminal;

use std::io;
use std::time::Duration;

use crate::sim::Direction;
use crate::snapshot::Snapshot;

pub use input::KeyboardInput;
pub use signals::ShutdownSignal;
pub use terminal::{TerminalGuard, TerminalRenderer};

/// Closed set of player inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Move(Direction),
    PauseToggle,
    Restart,
    Transfer,
    Quit,
}

pub trait InputSource {
    /// Wait at most `timeout` for input, then return everything pending
    fn poll(&mut self, timeout: Duration) -> io::Result<Vec<InputEvent>>;
}

pub trait Renderer {
    fn draw(&mut self, snapshot: &Snapshot) -> io::Result<()>;

    /// One-line status message shown outside the game view
    fn notice(&mut self, message: &str) -> io::Result<()>;
}
