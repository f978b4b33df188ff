// Library interface for divisor-quiz
// This allows integration tests to access internal modules

pub mod cli;
pub mod divisors;
pub mod game_state;
pub mod logging;
pub mod score_store;
pub mod tui;
pub mod view;

// Re-export commonly used items for easier testing
pub use divisors::{DEFAULT_CAP, candidate_limit, divisors_of};
pub use game_state::{
    CheckOutcome, GameConfig, GameController, GameInterface, GameState, Marker, Phase, UserAction,
    game_loop,
};
pub use score_store::{FileScoreStore, MemoryScoreStore, ScoreStore};
pub use view::{ButtonView, GameView, Notification, Severity};
