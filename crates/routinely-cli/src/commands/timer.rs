use std::io::Write;

use clap::Subcommand;
use routinely_core::{Config, Event, SessionController, SessionStatus};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start the current task, or resume from pause
    Start,
    /// Pause the countdown
    Pause,
    /// Skip to the next task
    Skip,
    /// Reset the session to the first task
    Reset,
    /// Print the current session state as JSON
    Status,
    /// Run the timer in the foreground until the routine finishes
    Run,
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut controller = SessionController::open()?;

    match action {
        TimerAction::Start => {
            let events = controller.start()?;
            print_events(&events)?;
        }
        TimerAction::Pause => {
            let events = controller.pause()?;
            print_events(&events)?;
        }
        TimerAction::Skip => {
            let events = controller.skip()?;
            print_events(&events)?;
        }
        TimerAction::Reset => {
            let events = controller.reset()?;
            print_events(&events)?;
        }
        TimerAction::Status => {
            // Tick once so the derived remaining time is current.
            controller.tick();
            let status = serde_json::json!({
                "status": controller.status(),
                "task_index": controller.engine().current_index(),
                "display": controller.display(),
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        TimerAction::Run => run_loop(&mut controller)?,
    }
    Ok(())
}

fn print_events(events: &[Event]) -> Result<(), Box<dyn std::error::Error>> {
    for event in events {
        println!("{}", serde_json::to_string_pretty(event)?);
    }
    Ok(())
}

/// Foreground presentation loop: tick, render, ring, repeat.
fn run_loop(controller: &mut SessionController) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let tick = std::time::Duration::from_millis(config.tick_ms.clamp(100, 60_000));

    controller.start()?;
    render_line(controller)?;

    while controller.status() == SessionStatus::Running {
        std::thread::sleep(tick);
        let events = controller.tick();
        for event in &events {
            match event {
                Event::TaskSwitched { task, .. } => {
                    ring(&config);
                    println!();
                    println!("-> {task}");
                }
                Event::RoutineFinished { .. } => {
                    ring(&config);
                    println!();
                    println!("routine complete");
                }
                _ => {}
            }
        }
        if controller.status() == SessionStatus::Running {
            render_line(controller)?;
        }
    }
    Ok(())
}

fn render_line(controller: &SessionController) -> Result<(), Box<dyn std::error::Error>> {
    let display = controller.display();
    let next = match &display.next_task {
        Some(name) => format!("next: {name}"),
        None => "last task".to_string(),
    };
    let mut out = std::io::stdout().lock();
    write!(
        out,
        "\r{}  {}  {:3.0}%  ({next})    ",
        display.task,
        display.remaining,
        display.progress * 100.0
    )?;
    out.flush()?;
    Ok(())
}

fn ring(config: &Config) {
    if config.notifications.enabled && config.notifications.terminal_bell {
        print!("\x07");
        let _ = std::io::stdout().flush();
    }
}
