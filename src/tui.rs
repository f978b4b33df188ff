//! TUI (Terminal User Interface) module for Divisor Quiz
//!
//! This module provides an interactive terminal interface using Ratatui.
//!
//! # Architecture
//! - `TuiInterface`: owns the terminal, draws the latest [`GameView`] and turns
//!   key presses into [`UserAction`]s
//! - `BoardInput`: focus cursor and key mapping, kept apart from the terminal
//!
//! # Keys
//! Arrows or `hjkl` move the focus, digits jump to a button, SPACE toggles,
//! `C` checks, `R` restarts after a game over, ENTER dismisses the message
//! panel, ESC or `Q` quits.

use crate::game_state::{GameInterface, Marker, Phase, UserAction};
use crate::view::{ButtonView, GameView, Severity};
use crate::{debug_log, info_log};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::io;
use std::time::{Duration, Instant};

const BUTTONS_PER_ROW: u32 = 8;
const EVENT_POLL_TIMEOUT_MS: u64 = 100;
const ASCII_CONTROL_CHAR_THRESHOLD: u32 = 32;

// Style constants for consistent UI
const HEADER_STYLE: Style = Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD);
const ERROR_STYLE: Style = Style::new().fg(Color::Red).add_modifier(Modifier::BOLD);
const SUCCESS_STYLE: Style = Style::new().fg(Color::Green).add_modifier(Modifier::BOLD);
const INFO_STYLE: Style = Style::new().fg(Color::Yellow).add_modifier(Modifier::BOLD);

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Info => Color::Blue,
        Severity::Success => Color::Green,
        Severity::Error => Color::Red,
    }
}

fn button_style(button: &ButtonView, focused: bool) -> Style {
    let (bg, fg) = match button.marker {
        Some(Marker::Missed) => (Color::Yellow, Color::Black),
        Some(Marker::Wrong) => (Color::Red, Color::White),
        _ if button.selected => (Color::Green, Color::Black),
        _ => (Color::DarkGray, Color::White),
    };
    let style = Style::default().fg(fg).bg(bg);
    if focused && !button.disabled {
        style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        style
    }
}

/// Focus cursor over the button grid and the key bindings that drive it.
#[derive(Debug)]
pub struct BoardInput {
    focus: u32,
    digits: String,
}

impl BoardInput {
    pub fn new() -> Self {
        Self {
            focus: 1,
            digits: String::new(),
        }
    }

    pub fn focus(&self) -> u32 {
        self.focus
    }

    /// Keep the focus on an existing button after the grid changes size.
    pub fn clamp(&mut self, limit: u32) {
        self.focus = self.focus.clamp(1, limit.max(1));
    }

    fn move_focus(&mut self, delta: i64, limit: u32) {
        let target = i64::from(self.focus) + delta;
        if (1..=i64::from(limit)).contains(&target) {
            self.focus = target as u32;
        }
    }

    fn push_digit(&mut self, digit: char, limit: u32) {
        self.digits.push(digit);
        let value: u32 = self.digits.parse().unwrap_or(0);
        if (1..=limit).contains(&value) {
            self.focus = value;
        }
        if self.digits.len() >= 2 || value.saturating_mul(10) > limit {
            self.digits.clear();
        }
    }

    /// Map a key press to an action. Focus movement is handled here and
    /// produces no action.
    pub fn handle_key(&mut self, key: KeyEvent, view: &GameView) -> Option<UserAction> {
        if key.modifiers.contains(KeyModifiers::ALT) || key.modifiers.contains(KeyModifiers::CONTROL)
        {
            debug_log!("handle_key() - Ignoring key with modifier: {:?}", key.modifiers);
            return None;
        }

        let limit = view.buttons.len() as u32;
        let row = i64::from(BUTTONS_PER_ROW);

        if let KeyCode::Char(c) = key.code
            && c.is_ascii_digit()
        {
            self.push_digit(c, limit);
            return None;
        }
        self.digits.clear();

        match key.code {
            KeyCode::Esc | KeyCode::Char('q' | 'Q') => Some(UserAction::Exit),
            KeyCode::Enter if view.notification.is_some() => {
                Some(UserAction::DismissNotification)
            }
            KeyCode::Char('r' | 'R') if view.show_restart => Some(UserAction::Restart),
            KeyCode::Char('c' | 'C') if view.phase == Phase::Ready => Some(UserAction::Check),
            KeyCode::Char(' ') | KeyCode::Enter if view.phase == Phase::Ready => {
                Some(UserAction::Toggle(self.focus))
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.move_focus(-1, limit);
                None
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.move_focus(1, limit);
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_focus(-row, limit);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_focus(row, limit);
                None
            }
            _ => {
                debug_log!("handle_key() - Ignoring key: {:?}", key.code);
                None
            }
        }
    }
}

/// Whether the terminal is still in raw mode on the alternate screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScreenMode {
    Game,
    Restored,
}

impl ScreenMode {
    /// Switch to `Restored`, returning whether the terminal still needed restoring.
    fn restore(&mut self) -> bool {
        let pending = *self == Self::Game;
        *self = Self::Restored;
        pending
    }
}

/// Context for rendering the UI - groups related parameters.
pub struct RenderContext<'a> {
    pub view: &'a GameView,
    pub focus: u32,
}

/// Main TUI interface component.
///
/// Manages terminal rendering, input handling, and game state display.
pub struct TuiInterface {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    view: Option<GameView>,
    input: BoardInput,
    screen: ScreenMode,
}

impl TuiInterface {
    pub fn new() -> Result<Self, io::Error> {
        info_log!("TuiInterface::new() - Initializing TUI");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        info_log!("Terminal setup complete: alternate screen, cursor hidden");

        Ok(Self {
            terminal,
            view: None,
            input: BoardInput::new(),
            screen: ScreenMode::Game,
        })
    }

    /// Leave raw mode and the alternate screen. Later calls do nothing.
    pub fn cleanup(&mut self) -> Result<(), io::Error> {
        if !self.screen.restore() {
            return Ok(());
        }
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            cursor::Show
        )?;
        Ok(())
    }

    fn draw(&mut self) -> Result<(), io::Error> {
        let Some(view) = &self.view else {
            return Ok(());
        };
        let ctx = RenderContext {
            view,
            focus: self.input.focus(),
        };
        self.terminal.draw(|f| {
            Self::render_static(f, &ctx);
        })?;
        Ok(())
    }

    fn draw_or_log(&mut self) {
        if let Err(e) = self.draw() {
            debug_log!("Draw error: {}", e);
        }
    }

    /// Render the complete UI layout using the provided context.
    pub fn render_static(f: &mut Frame, ctx: &RenderContext) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Length(3), // Number and best level
                Constraint::Min(7),    // Buttons
                Constraint::Length(6), // Message panel
                Constraint::Length(3), // Instructions
            ])
            .split(f.area());

        Self::render_title(f, chunks[0]);
        Self::render_header(f, chunks[1], ctx.view);
        Self::render_board(f, chunks[2], ctx);
        Self::render_notification(f, chunks[3], ctx.view);
        Self::render_instructions(f, chunks[4], ctx.view);
    }

    fn render_title(f: &mut Frame, area: Rect) {
        let title = Paragraph::new("DIVISOR QUIZ")
            .style(HEADER_STYLE)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(title, area);
    }

    fn render_header(f: &mut Frame, area: Rect, view: &GameView) {
        let number_style = match view.phase {
            Phase::LevelTransition => SUCCESS_STYLE,
            Phase::GameOver => ERROR_STYLE,
            Phase::Ready | Phase::Evaluating => HEADER_STYLE,
        };
        let line = Line::from(vec![
            Span::raw("Number: "),
            Span::styled(view.current_number.to_string(), number_style),
            Span::raw("    Best level: "),
            Span::styled(view.best_level.to_string(), INFO_STYLE),
        ]);
        let paragraph = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        f.render_widget(paragraph, area);
    }

    fn render_board(f: &mut Frame, area: Rect, ctx: &RenderContext) {
        let lines: Vec<Line> = ctx
            .view
            .buttons
            .chunks(BUTTONS_PER_ROW as usize)
            .flat_map(|row| {
                let mut spans = vec![Span::raw(" ")];
                for button in row {
                    spans.push(Span::styled(
                        format!(" {:>2} ", button.value),
                        button_style(button, button.value == ctx.focus),
                    ));
                    spans.push(Span::raw(" "));
                }
                [Line::from(spans), Line::from("")]
            })
            .collect();

        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .title(ctx.view.heading.as_str())
                .borders(Borders::ALL),
        );
        f.render_widget(paragraph, area);
    }

    fn render_notification(f: &mut Frame, area: Rect, view: &GameView) {
        let Some(notification) = &view.notification else {
            f.render_widget(Block::default().title("Messages").borders(Borders::ALL), area);
            return;
        };

        let color = severity_color(notification.severity);
        let mut lines = vec![Line::from(Span::styled(
            notification.title.as_str(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))];
        lines.extend(notification.detail.lines().map(Line::from));

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .title("Messages")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color)),
            )
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_instructions(f: &mut Frame, area: Rect, view: &GameView) {
        let text = match view.phase {
            Phase::Ready if view.notification.is_some() => {
                "ENTER: Dismiss message | SPACE: Toggle | C: Check | ESC/Q: Quit"
            }
            Phase::Ready => "Arrows/HJKL/digits: Move | SPACE/ENTER: Toggle | C: Check | ESC/Q: Quit",
            Phase::Evaluating | Phase::LevelTransition => "Correct! Next number coming up...",
            Phase::GameOver => {
                "Yellow: missed divisor | Red: wrong pick | R: Restart | ESC/Q: Quit"
            }
        };

        let paragraph = Paragraph::new(text)
            .style(Style::default().fg(Color::Gray))
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(paragraph, area);
    }

    /// Next key press, with non-key events and terminal escape garbage dropped.
    fn next_key(timeout: Duration) -> Result<Option<KeyEvent>, io::Error> {
        if !event::poll(timeout)? {
            return Ok(None);
        }

        match event::read()? {
            Event::Key(key) => {
                // Only process Press events, ignore Release and Repeat to avoid double input
                if key.kind != KeyEventKind::Press {
                    return Ok(None);
                }
                if let KeyCode::Char(c) = key.code
                    && (c == '\u{FFFD}' || (c as u32) < ASCII_CONTROL_CHAR_THRESHOLD)
                {
                    debug_log!("next_key() - Ignoring invalid character: {:?}", c);
                    return Ok(None);
                }
                Ok(Some(key))
            }
            other => {
                debug_log!("next_key() - Ignoring event: {:?}", other);
                Ok(None)
            }
        }
    }
}

impl GameInterface for TuiInterface {
    fn render(&mut self, view: &GameView) {
        self.input.clamp(view.buttons.len() as u32);
        self.view = Some(view.clone());
        self.draw_or_log();
    }

    fn read_action(&mut self) -> Option<UserAction> {
        loop {
            let key = match Self::next_key(Duration::from_millis(EVENT_POLL_TIMEOUT_MS)) {
                Ok(Some(key)) => key,
                Ok(None) => continue,
                Err(e) => {
                    log::warn!("Error reading terminal input: {e}");
                    return Some(UserAction::Exit);
                }
            };

            let view = self.view.as_ref()?;
            let action = self.input.handle_key(key, view);
            if action.is_some() {
                info_log!("read_action() - Action: {:?}", action);
                return action;
            }
            // Focus may have moved
            self.draw_or_log();
        }
    }

    fn wait_for_transition(&mut self, view: &GameView, delay: Duration) {
        self.render(view);
        let deadline = Instant::now() + delay;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match Self::next_key(remaining) {
                Ok(Some(key)) => {
                    debug_log!("wait_for_transition() - Dropping key {:?}", key.code);
                }
                Ok(None) => {}
                Err(e) => {
                    debug_log!("wait_for_transition() - Input error: {}", e);
                    std::thread::sleep(remaining);
                    break;
                }
            }
        }
    }

    fn display_exit_message(&mut self) {
        info_log!("Exiting");
    }
}

impl Drop for TuiInterface {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
