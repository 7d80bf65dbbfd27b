//! Replays a gesture script and prints the resulting document as JSON.

use std::path::PathBuf;
use std::process::ExitCode;
use vecdraw_replay::{ReplayError, Script, run_script};

fn replay(path: PathBuf) -> Result<String, ReplayError> {
    let script = Script::load(&path)?;
    log::info!("Replaying {} steps from {}", script.steps.len(), path.display());
    let outcome = run_script(&script)?;
    Ok(outcome.document.to_json()?)
}

fn main() -> ExitCode {
    env_logger::init();

    let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) else {
        eprintln!("usage: vecdraw-replay <script.json>");
        return ExitCode::from(2);
    };

    match replay(path) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("vecdraw-replay: {err}");
            ExitCode::FAILURE
        }
    }
}
