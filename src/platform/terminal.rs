//! Raw-mode terminal and ANSI drawing via crossterm

use std::io::{self, Stdout, Write};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{
    Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use crossterm::{execute, queue};

use super::Renderer;
use crate::consts::{BOARD_HEIGHT, BOARD_WIDTH};
use crate::role::Role;
use crate::sim::{GamePhase, Point};
use crate::snapshot::Snapshot;

/// Raw mode + alternate screen for as long as this value lives
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub fn acquire() -> io::Result<Self> {
        enable_raw_mode()?;
        let guard = Self { _private: () };
        execute!(io::stdout(), EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

const DIALOG_WIDTH: usize = 50;
const SCREEN_WIDTH: usize = 80;

pub struct TerminalRenderer {
    out: Stdout,
    last_role: Option<Role>,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self {
            out: io::stdout(),
            last_role: None,
        }
    }

    fn draw_game(&mut self, snap: &Snapshot) -> io::Result<()> {
        let out = &mut self.out;
        queue!(
            out,
            MoveTo(0, 0),
            SetForegroundColor(Color::Cyan),
            Print("========== SNAKE GAME =========="),
            ResetColor,
            MoveTo(0, 1),
            Print(format!(
                "Score: {}  |  High Score: {}  |  Length: {}  |  Games: {}  Food: {}  Best length: {}   ",
                snap.score,
                snap.high_score,
                snap.length(),
                snap.games_played,
                snap.food_eaten,
                snap.max_length
            )),
        )?;

        let border = format!("+{}+", "-".repeat(BOARD_WIDTH as usize));
        queue!(out, MoveTo(0, 2), Print(&border))?;
        for y in 0..BOARD_HEIGHT {
            queue!(out, MoveTo(0, (y + 3) as u16), Print("|"))?;
            for x in 0..BOARD_WIDTH {
                let cell = Point::new(x, y);
                let (glyph, color) = if snap.body.first() == Some(&cell) {
                    ('@', Color::Green)
                } else if snap.body.contains(&cell) {
                    ('o', Color::DarkGreen)
                } else if snap.food == cell {
                    ('*', Color::Red)
                } else {
                    (' ', Color::Reset)
                };
                queue!(out, SetForegroundColor(color), Print(glyph))?;
            }
            queue!(out, ResetColor, Print("|"))?;
        }
        queue!(out, MoveTo(0, (BOARD_HEIGHT + 3) as u16), Print(&border))?;

        let (status, color) = match snap.phase {
            GamePhase::Paused => ("*** PAUSED - Press P to resume ***", Color::Yellow),
            GamePhase::GameOver => ("*** GAME OVER - Press R to restart, Q to quit ***", Color::Red),
            GamePhase::Running => ("Arrows/WASD: Move | P: Pause | T: Transfer | Q: Quit", Color::Reset),
        };
        queue!(
            out,
            MoveTo(0, (BOARD_HEIGHT + 4) as u16),
            Clear(ClearType::CurrentLine),
            SetForegroundColor(color),
            Print(status),
            ResetColor
        )?;
        out.flush()
    }

    fn draw_waiting(&mut self, snap: &Snapshot) -> io::Result<()> {
        let lines = [
            String::new(),
            "WAITING FOR CONTROL".to_string(),
            String::new(),
            "Another process is running the game.".to_string(),
            format!("Score: {}  |  High Score: {}", snap.score, snap.high_score),
            String::new(),
            "Press Q to quit".to_string(),
        ];
        let col = ((SCREEN_WIDTH - DIALOG_WIDTH) / 2) as u16;
        let top = 7u16;
        let inner = DIALOG_WIDTH - 2;
        let edge = format!("+{}+", "-".repeat(inner));

        let out = &mut self.out;
        queue!(out, SetForegroundColor(Color::Cyan), MoveTo(col, top), Print(&edge))?;
        for (i, line) in lines.iter().enumerate() {
            queue!(
                out,
                MoveTo(col, top + 1 + i as u16),
                SetForegroundColor(Color::Cyan),
                Print("|"),
                SetForegroundColor(if i == 1 { Color::Yellow } else { Color::Reset }),
                Print(format!("{line:^inner$}")),
                SetForegroundColor(Color::Cyan),
                Print("|"),
            )?;
        }
        queue!(
            out,
            MoveTo(col, top + 1 + lines.len() as u16),
            Print(&edge),
            ResetColor
        )?;
        out.flush()
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for TerminalRenderer {
    fn draw(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        if self.last_role != Some(snapshot.role) {
            execute!(self.out, Clear(ClearType::All))?;
            self.last_role = Some(snapshot.role);
        }
        match snapshot.role {
            Role::Active => self.draw_game(snapshot),
            Role::Watching => self.draw_waiting(snapshot),
        }
    }

    fn notice(&mut self, message: &str) -> io::Result<()> {
        self.last_role = None;
        execute!(self.out, Clear(ClearType::All), MoveTo(0, 0), Print(message))
    }
}
