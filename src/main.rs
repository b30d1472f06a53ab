// ABOUTME: timewarp command-line binary
// ABOUTME: Reads and re-calibrates the persisted virtual clock

use clap::{Parser, Subcommand};
use timewarp::cli::{format_offset, format_timestamp, parse_shift, ClockArgs};

#[derive(Parser, Debug)]
#[command(name = "timewarp")]
#[command(author, version, about = "Inspect and steer the persisted virtual clock", long_about = None)]
struct Args {
    #[command(flatten)]
    clock: ClockArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current virtual time
    Now {
        /// Print as RFC 3339 instead of epoch milliseconds
        #[arg(long)]
        iso: bool,
    },
    /// Show virtual time, offset and speed
    Show,
    /// Jump to an absolute time (epoch ms, RFC 3339, or local `YYYY-MM-DDTHH:MM`)
    Set {
        /// Target time
        target: String,
    },
    /// Change how fast virtual time flows
    Speed {
        /// Multiplier, must be greater than zero
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },
    /// Move virtual time relative to its current value (e.g. `-15m`, `+2h`, `1d`)
    Shift {
        /// Signed amount with optional unit: ms, s, m, h, d
        #[arg(allow_hyphen_values = true)]
        delta: String,
    },
    /// Return to real time at speed 1
    Reset,
    /// Delete the persisted calibration
    Clear,
    /// Print virtual time every refresh interval until Ctrl+C
    Watch,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    // Initialize tracing
    args.clock.init_tracing();

    let (config, clock) = args.clock.open_clock();

    match args.command {
        Command::Now { iso } => {
            if iso {
                match clock.now() {
                    Some(now) => println!("{}", now.to_rfc3339()),
                    None => return Err("virtual time is outside the representable date range".into()),
                }
            } else {
                println!("{}", clock.now_ms().floor());
            }
        }
        Command::Show => print_calibration(&clock),
        Command::Set { target } => {
            clock.set_time(target)?;
            print_calibration(&clock);
        }
        Command::Speed { value } => {
            clock.set_speed(value)?;
            print_calibration(&clock);
        }
        Command::Shift { delta } => {
            clock.shift(parse_shift(&delta)?)?;
            print_calibration(&clock);
        }
        Command::Reset => {
            clock.reset();
            print_calibration(&clock);
        }
        Command::Clear => {
            clock.clear_saved();
            tracing::info!("Cleared saved calibration '{}'", config.storage_key);
        }
        Command::Watch => {
            let period = tokio::time::Duration::from_millis(config.refresh_interval_ms.max(1));
            let mut interval = tokio::time::interval(period);

            tracing::info!("Press Ctrl+C to stop");
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let calibration = clock.calibration();
                        println!(
                            "{}  ({}x)",
                            format_timestamp(calibration.virtual_ms),
                            calibration.speed
                        );
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
        }
    }

    Ok(())
}

fn print_calibration(clock: &timewarp::VirtualClock) {
    let calibration = clock.calibration();
    println!("virtual: {}", format_timestamp(calibration.virtual_ms));
    println!("offset:  {}", format_offset(clock.offset_ms()));
    println!("speed:   {}x", calibration.speed);
}
