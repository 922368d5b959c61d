//! Keyboard input via crossterm

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::{InputEvent, InputSource};
use crate::sim::Direction;

/// Reads key presses from the raw-mode terminal
#[derive(Debug, Default)]
pub struct KeyboardInput;

impl KeyboardInput {
    pub fn new() -> Self {
        Self
    }
}

impl InputSource for KeyboardInput {
    fn poll(&mut self, timeout: Duration) -> io::Result<Vec<InputEvent>> {
        let mut events = Vec::new();
        let mut wait = timeout;
        while event::poll(wait)? {
            if let Event::Key(key) = event::read()? {
                events.extend(map_key(key));
            }
            // Drain whatever else is already queued
            wait = Duration::ZERO;
        }
        Ok(events)
    }
}

/// Arrows and WASD steer; P, R, T, Q (and Ctrl-C) control the game
pub fn map_key(key: KeyEvent) -> Option<InputEvent> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C')).then_some(InputEvent::Quit);
    }
    let event = match key.code {
        KeyCode::Up => InputEvent::Move(Direction::Up),
        KeyCode::Down => InputEvent::Move(Direction::Down),
        KeyCode::Left => InputEvent::Move(Direction::Left),
        KeyCode::Right => InputEvent::Move(Direction::Right),
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'w' => InputEvent::Move(Direction::Up),
            's' => InputEvent::Move(Direction::Down),
            'a' => InputEvent::Move(Direction::Left),
            'd' => InputEvent::Move(Direction::Right),
            'p' => InputEvent::PauseToggle,
            'r' => InputEvent::Restart,
            't' => InputEvent::Transfer,
            'q' => InputEvent::Quit,
            _ => return None,
        },
        _ => return None,
    };
    Some(event)
}
