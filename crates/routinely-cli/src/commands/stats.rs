use clap::Subcommand;
use routinely_core::{format_hms, SessionController};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Cumulative time spent per task
    Show {
        /// Print the raw name -> milliseconds map as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete all recorded statistics
    Clear,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut controller = SessionController::open()?;

    match action {
        StatsAction::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(controller.stats())?);
            } else if controller.stats().is_empty() {
                println!("no time recorded yet");
            } else {
                for (task, total_ms) in controller.stats().snapshot() {
                    println!("{}  {}", format_hms(*total_ms), task);
                }
            }
        }
        StatsAction::Clear => {
            controller.clear_stats()?;
            println!("stats cleared");
        }
    }
    Ok(())
}
