//! What an interface draws: a flat projection of the controller.

use crate::game_state::{GameController, Marker, Phase};
use crate::score_store::ScoreStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// Dismissible message shown on start, level up, game over and restart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub detail: String,
    pub severity: Severity,
}

impl Notification {
    pub fn new(title: impl Into<String>, detail: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            detail: detail.into(),
            severity,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ButtonView {
    pub value: u32,
    pub selected: bool,
    /// Only set once the game is over.
    pub marker: Option<Marker>,
    pub disabled: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameView {
    pub phase: Phase,
    pub current_number: u32,
    pub best_level: u32,
    pub heading: String,
    pub buttons: Vec<ButtonView>,
    pub show_check: bool,
    pub show_restart: bool,
    pub notification: Option<Notification>,
}

impl GameView {
    pub fn from_controller<S: ScoreStore>(controller: &GameController<S>) -> Self {
        let state = controller.state();
        let phase = controller.phase();
        let game_over = phase == Phase::GameOver;
        let interactive = phase == Phase::Ready;
        let limit = state.candidate_limit();

        let buttons = (1..=limit)
            .map(|value| ButtonView {
                value,
                selected: state.is_selected(value),
                marker: game_over.then(|| state.classify(value)),
                disabled: !interactive,
            })
            .collect();

        Self {
            phase,
            current_number: state.current_number(),
            best_level: controller.best_level(),
            heading: format!("Select every divisor (1-{limit})"),
            buttons,
            show_check: interactive,
            show_restart: !state.is_active(),
            notification: controller.notification().cloned(),
        }
    }

    pub fn button(&self, value: u32) -> Option<&ButtonView> {
        self.buttons.iter().find(|b| b.value == value)
    }
}
