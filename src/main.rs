use divisor_quiz::cli::{CliInterface, parse_cli};
use divisor_quiz::game_state::{GameController, game_loop};
use divisor_quiz::logging::{default_log_path, init_logging};
use divisor_quiz::score_store::FileScoreStore;
use divisor_quiz::tui::TuiInterface;
use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = parse_cli();

    // The full-screen interface owns the terminal, so its logs always go to a file
    let log_path = if cli.plain {
        cli.log_file.clone()
    } else {
        cli.log_file.clone().or_else(default_log_path)
    };
    if let Err(e) = init_logging(log_path.as_deref()) {
        eprintln!("Failed to set up logging: {e}");
    }

    let store = FileScoreStore::at_or_default(cli.score_file.clone());
    log::info!("Score file: {:?}", store.path());
    let mut controller = GameController::new(cli.game_config(), store);

    if cli.plain {
        let stdin = io::stdin();
        let mut interface = CliInterface::new(stdin.lock());
        game_loop(&mut controller, &mut interface);
    } else {
        let mut interface = match TuiInterface::new() {
            Ok(interface) => interface,
            Err(e) => {
                eprintln!("Failed to start terminal interface: {e}");
                eprintln!("Run with --plain for the line-based interface.");
                return ExitCode::FAILURE;
            }
        };
        game_loop(&mut controller, &mut interface);
        if let Err(e) = interface.cleanup() {
            eprintln!("Failed to restore terminal: {e}");
        }
    }

    println!("Best level: {}", controller.best_level());
    ExitCode::SUCCESS
}
