use crate::divisors::DEFAULT_CAP;
use crate::game_state::{DEFAULT_LEVEL_UP_DELAY, GameConfig, GameInterface, Marker, UserAction};
use crate::view::{ButtonView, GameView, Notification};
use crate::{debug_log, info_log};
use clap::Parser;
use std::collections::VecDeque;
use std::io::BufRead;
use std::path::PathBuf;
use std::time::Duration;

const BUTTONS_PER_ROW: usize = 10;

/// Divisor Quiz: select every divisor of the number shown
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Largest value offered as a divisor button
    #[arg(long, default_value_t = DEFAULT_CAP, value_parser = clap::value_parser!(u32).range(1..=99))]
    pub cap: u32,

    /// Pause after a correct answer, in milliseconds
    #[arg(long = "delay-ms", default_value_t = DEFAULT_LEVEL_UP_DELAY.as_millis() as u64)]
    pub delay_ms: u64,

    /// File holding the best level (defaults to the user data directory)
    #[arg(long = "score-file")]
    pub score_file: Option<PathBuf>,

    /// Use the line-based interface instead of the full-screen one
    #[arg(long)]
    pub plain: bool,

    /// Write logs to this file
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn game_config(&self) -> GameConfig {
        GameConfig {
            cap: self.cap,
            level_up_delay: Duration::from_millis(self.delay_ms),
        }
    }
}

#[must_use]
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Parse one line of plain-mode input.
///
/// Numbers separated by spaces or commas toggle those buttons in order.
pub fn parse_command(line: &str) -> Result<Vec<UserAction>, String> {
    let input = line.trim().to_lowercase();
    match input.as_str() {
        "" => Err("Enter a number, or a command.".to_string()),
        "c" | "check" => Ok(vec![UserAction::Check]),
        "r" | "restart" => Ok(vec![UserAction::Restart]),
        "d" | "dismiss" => Ok(vec![UserAction::DismissNotification]),
        "q" | "quit" | "exit" => Ok(vec![UserAction::Exit]),
        _ => input
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|token| !token.is_empty())
            .map(|token| {
                token
                    .parse::<u32>()
                    .map(UserAction::Toggle)
                    .map_err(|_| format!("'{token}' is not a number or a command."))
            })
            .collect(),
    }
}

pub fn format_button(button: &ButtonView) -> String {
    let tag = match button.marker {
        Some(Marker::Missed) => '!',
        Some(Marker::Wrong) => 'x',
        _ if button.selected => '*',
        _ => ' ',
    };
    format!("[{:>2}{tag}]", button.value)
}

pub fn format_board(view: &GameView) -> String {
    let mut out = format!(
        "Number: {}    Best level: {}\n{}\n",
        view.current_number, view.best_level, view.heading
    );
    for row in view.buttons.chunks(BUTTONS_PER_ROW) {
        let line: Vec<String> = row.iter().map(format_button).collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    out
}

pub fn format_notification(notification: &Notification) -> String {
    format!("== {} ==\n{}", notification.title, notification.detail)
}

pub fn format_controls(view: &GameView) -> &'static str {
    if view.show_restart {
        "Marks: ! missed divisor, x wrong pick. Commands: r restart, q quit"
    } else {
        "Toggle with numbers (e.g. `1 2 4`). Commands: c check, d dismiss message, q quit"
    }
}

/// Line-based implementation of [`GameInterface`] over any `BufRead`.
pub struct CliInterface<R: BufRead> {
    reader: R,
    pending: VecDeque<UserAction>,
    last_notification: Option<Notification>,
}

impl<R: BufRead> CliInterface<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: VecDeque::new(),
            last_notification: None,
        }
    }
}

impl<R: BufRead> GameInterface for CliInterface<R> {
    fn render(&mut self, view: &GameView) {
        if view.notification != self.last_notification {
            if let Some(notification) = &view.notification {
                println!("\n{}", format_notification(notification));
            }
            self.last_notification.clone_from(&view.notification);
        }
        println!("\n{}{}", format_board(view), format_controls(view));
    }

    fn read_action(&mut self) -> Option<UserAction> {
        if let Some(action) = self.pending.pop_front() {
            return Some(action);
        }

        println!("> ");
        let mut input = String::new();
        match self.reader.read_line(&mut input) {
            Ok(0) => {
                info_log!("CliInterface::read_action() - end of input");
                return Some(UserAction::Exit);
            }
            Ok(_) => {}
            Err(e) => {
                log::warn!("Failed to read input: {e}");
                return Some(UserAction::Exit);
            }
        }

        match parse_command(&input) {
            Ok(actions) => {
                debug_log!("CliInterface::read_action() - parsed {:?}", actions);
                self.pending.extend(actions);
                self.pending.pop_front()
            }
            Err(message) => {
                println!("{message}");
                None
            }
        }
    }

    fn wait_for_transition(&mut self, view: &GameView, delay: Duration) {
        println!("\n{} is correct!", view.current_number);
        std::thread::sleep(delay);
    }

    fn display_exit_message(&mut self) {
        println!("Exiting.");
    }
}
