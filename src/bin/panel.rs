// ABOUTME: timewarp terminal panel binary
// ABOUTME: Interactive view of the persisted virtual clock with speed and shift controls

use clap::Parser;
use std::sync::Arc;
use timewarp::cli::ClockArgs;
use timewarp::tui::PanelApp;
use timewarp::SystemClock;

#[derive(Parser, Debug)]
#[command(name = "timewarp-panel")]
#[command(author, version, about = "Terminal panel for the timewarp virtual clock", long_about = None)]
struct Args {
    #[command(flatten)]
    clock: ClockArgs,

    /// Shift step for the left/right keys, in minutes
    #[arg(long, default_value = "60")]
    step_minutes: f64,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    // Log lines would tear the alternate screen, so only errors by default
    args.clock.init_tracing_with("timewarp=error");

    let (config, clock) = args.clock.open_clock();
    let config = Arc::new(config.shift_step_ms(args.step_minutes * 60_000.0));
    let clock = Arc::new(clock);

    let mut app = PanelApp::new(config, clock, Arc::new(SystemClock::new()));

    let mut terminal = timewarp::tui::setup_terminal()?;
    let result = app.run(&mut terminal);
    timewarp::tui::restore_terminal(&mut terminal)?;

    result?;
    Ok(())
}
