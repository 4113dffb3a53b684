use std::io::Read;
use std::path::PathBuf;

use clap::Subcommand;
use routinely_core::{Routine, SessionController};

#[derive(Subcommand)]
pub enum RoutineAction {
    /// Print the active routine
    Show {
        /// Print as JSON instead of the edit format
        #[arg(long)]
        json: bool,
    },
    /// Replace the routine from edit text: one task per line, `Name;Hours`
    Edit {
        /// File to read; omit or pass '-' to read stdin
        file: Option<PathBuf>,
    },
    /// Restore the built-in default routine
    Reset,
}

pub fn run(action: RoutineAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut controller = SessionController::open()?;

    match action {
        RoutineAction::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(controller.routine())?);
            } else {
                println!("{}", controller.routine().to_edit_text());
            }
        }
        RoutineAction::Edit { file } => {
            let text = match file {
                Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)?,
                _ => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            // A format error leaves the existing routine and session alone.
            controller.save_routine(&text)?;
            println!("routine updated ({} tasks), session reset", controller.routine().len());
        }
        RoutineAction::Reset => {
            controller.save_routine(&Routine::default_routine().to_edit_text())?;
            println!("routine reset to default, session reset");
        }
    }
    Ok(())
}
