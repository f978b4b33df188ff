use crate::divisors::{DEFAULT_CAP, candidate_limit, divisors_of};
use crate::score_store::ScoreStore;
use crate::view::{GameView, Notification, Severity};
use crate::{debug_log, info_log};
use std::collections::BTreeSet;
use std::thread;
use std::time::Duration;

pub const DEFAULT_LEVEL_UP_DELAY: Duration = Duration::from_millis(300);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameConfig {
    pub cap: u32,
    pub level_up_delay: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            cap: DEFAULT_CAP,
            level_up_delay: DEFAULT_LEVEL_UP_DELAY,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Ready,
    Evaluating,
    LevelTransition,
    GameOver,
}

/// Per-button verdict revealed when the game ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker {
    /// A divisor the player left unselected.
    Missed,
    /// A selected value that does not divide the number.
    Wrong,
    Neutral,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckOutcome {
    Correct,
    Incorrect,
    /// Check arrived outside `Ready` and was dropped.
    Ignored,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UserAction {
    Toggle(u32),
    Check,
    Restart,
    DismissNotification,
    Exit,
}

/// The number under test and the player's selection for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    cap: u32,
    current_number: u32,
    selected: BTreeSet<u32>,
    correct: BTreeSet<u32>,
    active: bool,
}

impl GameState {
    pub fn new(cap: u32) -> Self {
        let cap = cap.max(1);
        let mut state = Self {
            cap,
            current_number: 1,
            selected: BTreeSet::new(),
            correct: BTreeSet::new(),
            active: true,
        };
        state.update_correct_divisors();
        state
    }

    pub fn current_number(&self) -> u32 {
        self.current_number
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    pub fn selected(&self) -> &BTreeSet<u32> {
        &self.selected
    }

    pub fn correct(&self) -> &BTreeSet<u32> {
        &self.correct
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_selected(&self, value: u32) -> bool {
        self.selected.contains(&value)
    }

    /// Highest button value for the current number.
    pub fn candidate_limit(&self) -> u32 {
        candidate_limit(self.current_number, self.cap)
    }

    pub fn in_range(&self, value: u32) -> bool {
        (1..=self.candidate_limit()).contains(&value)
    }

    /// Flip `value` in the selection. Out-of-range values are ignored.
    pub fn toggle(&mut self, value: u32) -> bool {
        if !self.in_range(value) {
            return false;
        }
        if !self.selected.remove(&value) {
            self.selected.insert(value);
        }
        true
    }

    pub fn selection_is_correct(&self) -> bool {
        self.selected == self.correct
    }

    pub fn classify(&self, value: u32) -> Marker {
        match (self.correct.contains(&value), self.selected.contains(&value)) {
            (true, false) => Marker::Missed,
            (false, true) => Marker::Wrong,
            _ => Marker::Neutral,
        }
    }

    /// Move on to the next number with an empty selection.
    fn advance(&mut self) {
        self.current_number = self.current_number.saturating_add(1);
        self.selected.clear();
        self.update_correct_divisors();
    }

    fn update_correct_divisors(&mut self) {
        self.correct = divisors_of(self.current_number, self.cap);
        debug_log!(
            "Current number: {}, correct divisors (1-{}): {:?}",
            self.current_number,
            self.candidate_limit(),
            self.correct
        );
    }
}

/// Owns the game state and applies player events to it.
pub struct GameController<S: ScoreStore> {
    config: GameConfig,
    state: GameState,
    phase: Phase,
    best_level: u32,
    notification: Option<Notification>,
    store: S,
}

impl<S: ScoreStore> GameController<S> {
    /// Load the best level from `store` and start at level 1.
    pub fn new(config: GameConfig, store: S) -> Self {
        let best_level = store.load();
        info_log!("Loaded best level {}", best_level);
        Self {
            config,
            state: GameState::new(config.cap),
            phase: Phase::Ready,
            best_level,
            notification: Some(Notification::new(
                "Game Start",
                "Select every divisor of the number shown, then check your selection!",
                Severity::Info,
            )),
            store,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn best_level(&self) -> u32 {
        self.best_level
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn view(&self) -> GameView {
        GameView::from_controller(self)
    }

    fn set_phase(&mut self, phase: Phase) {
        debug_log!("Phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    pub fn restart(&mut self) {
        info_log!("Restarting from level 1");
        self.state = GameState::new(self.config.cap);
        self.set_phase(Phase::Ready);
        self.notification = Some(Notification::new(
            "Game Restarted",
            "Starting again from level 1. Good luck!",
            Severity::Info,
        ));
    }

    /// Toggle a button. Returns whether the selection changed.
    pub fn toggle(&mut self, value: u32) -> bool {
        if self.phase != Phase::Ready {
            debug_log!("Ignoring toggle of {} in {:?}", value, self.phase);
            return false;
        }
        self.state.toggle(value)
    }

    pub fn check(&mut self) -> CheckOutcome {
        if self.phase != Phase::Ready {
            debug_log!("Ignoring check in {:?}", self.phase);
            return CheckOutcome::Ignored;
        }
        self.set_phase(Phase::Evaluating);

        if self.state.selection_is_correct() {
            self.set_phase(Phase::LevelTransition);
            CheckOutcome::Correct
        } else {
            self.state.active = false;
            self.set_phase(Phase::GameOver);
            let score = self.final_score();
            info_log!("Game over at level {}", score);
            self.notification = Some(Notification::new(
                "Game Over",
                format!("Game over at level {score}.\nYou did not find every divisor of this number."),
                Severity::Error,
            ));
            CheckOutcome::Incorrect
        }
    }

    /// Wake event after the level-up delay. Does nothing outside `LevelTransition`.
    pub fn finish_level_transition(&mut self) -> bool {
        if self.phase != Phase::LevelTransition {
            return false;
        }
        self.state.advance();
        let cleared = self.final_score();
        if cleared > self.best_level {
            self.best_level = cleared;
            self.store.save(cleared);
            info_log!("New best level {}", cleared);
        }

        let count = self.state.correct().len();
        self.notification = Some(Notification::new(
            "Correct!",
            format!(
                "You found every divisor of {cleared}! {} has {count} divisors to find.",
                self.state.current_number()
            ),
            Severity::Success,
        ));
        self.set_phase(Phase::Ready);
        true
    }

    pub fn dismiss_notification(&mut self) {
        self.notification = None;
    }

    /// Levels cleared so far: `current_number - 1`.
    pub fn final_score(&self) -> u32 {
        self.state.current_number - 1
    }
}

/// Surface that draws the game and produces player events.
pub trait GameInterface {
    fn render(&mut self, view: &GameView);

    /// Next player event; `None` when the input produced nothing usable.
    fn read_action(&mut self) -> Option<UserAction>;

    /// Sit out the level-up delay. Input arriving meanwhile is dropped.
    fn wait_for_transition(&mut self, _view: &GameView, delay: Duration) {
        thread::sleep(delay);
    }

    fn display_exit_message(&mut self);
}

/// Drive `controller` with events from `interface` until the player exits.
pub fn game_loop<S: ScoreStore, I: GameInterface + ?Sized>(
    controller: &mut GameController<S>,
    interface: &mut I,
) {
    interface.render(&controller.view());

    loop {
        let Some(action) = interface.read_action() else {
            continue;
        };
        debug_log!("game_loop() - action {:?}", action);

        match action {
            UserAction::Exit => {
                interface.display_exit_message();
                break;
            }
            UserAction::Toggle(value) => {
                controller.toggle(value);
            }
            UserAction::Check => {
                if controller.check() == CheckOutcome::Correct {
                    let delay = controller.config().level_up_delay;
                    interface.wait_for_transition(&controller.view(), delay);
                    controller.finish_level_transition();
                }
            }
            UserAction::Restart => controller.restart(),
            UserAction::DismissNotification => controller.dismiss_notification(),
        }

        interface.render(&controller.view());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score_store::MemoryScoreStore;

    fn controller_with_best(best: u32) -> GameController<MemoryScoreStore> {
        GameController::new(
            GameConfig {
                cap: DEFAULT_CAP,
                level_up_delay: Duration::ZERO,
            },
            MemoryScoreStore::with_best(best),
        )
    }

    fn select_correct(controller: &mut GameController<MemoryScoreStore>) {
        let correct: Vec<u32> = controller.state().correct().iter().copied().collect();
        for value in correct {
            controller.toggle(value);
        }
    }

    /// Clear levels until `number` is the current number.
    fn play_to(controller: &mut GameController<MemoryScoreStore>, number: u32) {
        while controller.state().current_number() < number {
            select_correct(controller);
            assert_eq!(controller.check(), CheckOutcome::Correct);
            assert!(controller.finish_level_transition());
        }
    }

    #[test]
    fn test_new_game_starts_at_one() {
        let controller = controller_with_best(4);
        let state = controller.state();
        assert_eq!(state.current_number(), 1);
        assert!(state.selected().is_empty());
        assert_eq!(state.correct(), &BTreeSet::from([1]));
        assert!(state.is_active());
        assert_eq!(controller.phase(), Phase::Ready);
        assert_eq!(controller.best_level(), 4);
        assert_eq!(
            controller.notification().map(|n| n.title.as_str()),
            Some("Game Start")
        );
    }

    #[test]
    fn test_toggle_twice_restores_selection() {
        let mut controller = controller_with_best(0);
        play_to(&mut controller, 6);
        controller.toggle(2);
        let before = controller.state().selected().clone();
        assert!(controller.toggle(3));
        assert!(controller.toggle(3));
        assert_eq!(controller.state().selected(), &before);
    }

    #[test]
    fn test_toggle_out_of_range_is_ignored() {
        let mut controller = controller_with_best(0);
        play_to(&mut controller, 5);
        assert!(!controller.toggle(0));
        assert!(!controller.toggle(6));
        assert!(controller.state().selected().is_empty());
    }

    #[test]
    fn test_correct_check_advances_after_transition() {
        let mut controller = controller_with_best(3);
        play_to(&mut controller, 12);
        for value in [1, 2, 3, 4, 6, 12] {
            controller.toggle(value);
        }

        assert_eq!(controller.check(), CheckOutcome::Correct);
        assert_eq!(controller.phase(), Phase::LevelTransition);
        // Still on 12 until the wake event fires
        assert_eq!(controller.state().current_number(), 12);

        assert!(controller.finish_level_transition());
        let state = controller.state();
        assert_eq!(state.current_number(), 13);
        assert!(state.selected().is_empty());
        assert_eq!(state.correct(), &BTreeSet::from([1, 13]));
        assert_eq!(controller.phase(), Phase::Ready);
        assert_eq!(controller.best_level(), 12);

        let note = controller.notification().unwrap();
        assert_eq!(note.severity, Severity::Success);
        assert_eq!(
            note.detail,
            "You found every divisor of 12! 13 has 2 divisors to find."
        );
    }

    #[test]
    fn test_level_up_reports_next_divisor_count() {
        let mut controller = controller_with_best(0);
        play_to(&mut controller, 5);
        controller.toggle(1);
        controller.toggle(5);
        assert_eq!(controller.check(), CheckOutcome::Correct);
        assert!(controller.finish_level_transition());

        // 6 has divisors 1, 2, 3 and 6
        assert_eq!(controller.state().correct().len(), 4);
        let note = controller.notification().unwrap();
        assert!(note.detail.contains("6 has 4 divisors"), "{}", note.detail);
    }

    #[test]
    fn test_advance_saturates_at_max() {
        let mut state = GameState::new(DEFAULT_CAP);
        state.current_number = u32::MAX;
        state.advance();
        assert_eq!(state.current_number(), u32::MAX);
        assert_eq!(state.correct(), &divisors_of(u32::MAX, DEFAULT_CAP));
    }

    #[test]
    fn test_input_ignored_during_transition() {
        let mut controller = controller_with_best(0);
        select_correct(&mut controller);
        assert_eq!(controller.check(), CheckOutcome::Correct);

        assert!(!controller.toggle(1));
        assert_eq!(controller.check(), CheckOutcome::Ignored);
        assert_eq!(controller.phase(), Phase::LevelTransition);
        assert!(controller.finish_level_transition());
        assert!(!controller.finish_level_transition());
        assert_eq!(controller.state().current_number(), 2);
    }

    #[test]
    fn test_incorrect_check_ends_game() {
        let mut controller = controller_with_best(0);
        play_to(&mut controller, 12);
        for value in [1, 2, 4, 5] {
            controller.toggle(value);
        }

        assert_eq!(controller.check(), CheckOutcome::Incorrect);
        assert_eq!(controller.phase(), Phase::GameOver);
        let state = controller.state();
        assert!(!state.is_active());
        for missed in [3, 6, 12] {
            assert_eq!(state.classify(missed), Marker::Missed);
        }
        assert_eq!(state.classify(5), Marker::Wrong);
        for neutral in [1, 2, 4, 7, 11] {
            assert_eq!(state.classify(neutral), Marker::Neutral);
        }
        assert_eq!(controller.final_score(), 11);

        let note = controller.notification().unwrap();
        assert_eq!(note.severity, Severity::Error);
        assert!(note.detail.contains("level 11"));
    }

    #[test]
    fn test_game_over_ignores_input() {
        let mut controller = controller_with_best(0);
        assert_eq!(controller.check(), CheckOutcome::Incorrect);
        assert!(!controller.toggle(1));
        assert_eq!(controller.check(), CheckOutcome::Ignored);
        assert_eq!(controller.final_score(), 0);
    }

    #[test]
    fn test_restart_resets_from_every_phase() {
        let mut controller = controller_with_best(0);
        play_to(&mut controller, 8);
        let best = controller.best_level();

        // From GameOver
        controller.check();
        controller.restart();
        assert_eq!(controller.phase(), Phase::Ready);
        assert_eq!(controller.state(), &GameState::new(DEFAULT_CAP));
        assert_eq!(controller.best_level(), best);

        // From LevelTransition, the pending advance is dropped
        select_correct(&mut controller);
        controller.check();
        controller.restart();
        assert!(!controller.finish_level_transition());
        assert_eq!(controller.state().current_number(), 1);

        // From Ready with a selection
        controller.toggle(1);
        controller.restart();
        assert!(controller.state().selected().is_empty());
        assert_eq!(controller.best_level(), best);
    }

    #[test]
    fn test_best_level_saved_only_on_new_record() {
        let mut controller = controller_with_best(3);
        play_to(&mut controller, 6);
        // Levels 1-3 do not beat the stored record
        assert_eq!(controller.store().saves(), &[4, 5]);

        controller.restart();
        play_to(&mut controller, 4);
        assert_eq!(controller.store().saves(), &[4, 5]);
        assert_eq!(controller.best_level(), 5);

        let saves = controller.store().saves();
        assert!(saves.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_numbers_above_cap_keep_cap_buttons() {
        let mut controller = GameController::new(
            GameConfig {
                cap: 5,
                level_up_delay: Duration::ZERO,
            },
            MemoryScoreStore::default(),
        );
        play_to(&mut controller, 12);
        assert_eq!(controller.state().candidate_limit(), 5);
        assert_eq!(controller.state().correct(), &BTreeSet::from([1, 2, 3, 4]));
        assert!(!controller.toggle(6));
    }

    #[test]
    fn test_dismiss_clears_notification() {
        let mut controller = controller_with_best(0);
        controller.dismiss_notification();
        assert!(controller.notification().is_none());
    }

    struct ScriptedInterface {
        actions: Vec<UserAction>,
        renders: Vec<GameView>,
        waits: usize,
        exited: bool,
    }

    impl GameInterface for ScriptedInterface {
        fn render(&mut self, view: &GameView) {
            self.renders.push(view.clone());
        }

        fn read_action(&mut self) -> Option<UserAction> {
            if self.actions.is_empty() {
                Some(UserAction::Exit)
            } else {
                Some(self.actions.remove(0))
            }
        }

        fn wait_for_transition(&mut self, view: &GameView, _delay: Duration) {
            assert_eq!(view.phase, Phase::LevelTransition);
            assert!(view.buttons.iter().all(|b| b.disabled));
            assert!(!view.show_check);
            assert!(!view.show_restart);
            self.waits += 1;
        }

        fn display_exit_message(&mut self) {
            self.exited = true;
        }
    }

    #[test]
    fn test_game_loop_runs_script() {
        let mut controller = controller_with_best(0);
        let mut interface = ScriptedInterface {
            actions: vec![
                UserAction::Toggle(1),
                UserAction::Check,
                UserAction::Toggle(1),
                UserAction::Toggle(2),
                UserAction::Check,
                UserAction::Toggle(2),
                UserAction::Check,
            ],
            renders: Vec::new(),
            waits: 0,
            exited: false,
        };

        game_loop(&mut controller, &mut interface);

        assert!(interface.exited);
        assert_eq!(interface.waits, 2);
        assert_eq!(controller.phase(), Phase::GameOver);
        assert_eq!(controller.final_score(), 2);
        assert_eq!(controller.best_level(), 2);
        let last = interface.renders.last().unwrap();
        assert!(last.show_restart);
        assert_eq!(last.button(2).unwrap().marker, Some(Marker::Wrong));
        assert_eq!(last.button(1).unwrap().marker, Some(Marker::Missed));
        assert_eq!(last.button(3).unwrap().marker, Some(Marker::Missed));
    }
}
