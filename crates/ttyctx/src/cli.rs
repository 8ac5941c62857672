use std::io::{self, Write};
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::{ColorSlot, QueryConfig, Result, Rgb, TerminalContext, WindowGeometry};

#[derive(Debug, Parser)]
#[command(
    name = "ttyctx",
    about = "Query the controlling terminal for its size, colors, and device name",
    version
)]
pub struct Cli {
    /// Reply timeout in milliseconds (overrides TTYCTX_QUERY_TIMEOUT_MS).
    #[arg(long, global = true, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print `cols rows xpixel ypixel` (0 = unknown).
    Size,

    /// Print the color of each slot: `fg`, `bg`, or a palette index 0-255.
    Color {
        #[arg(required = true, value_name = "SLOT")]
        slots: Vec<ColorSlot>,
    },

    /// Print the terminal device path.
    Name,
}

impl Cli {
    /// Query configuration: environment first, then the command line.
    pub fn query_config(&self) -> QueryConfig {
        let config = QueryConfig::from_env();
        match self.timeout_ms {
            Some(ms) => config.with_timeout(Duration::from_millis(ms)),
            None => config,
        }
    }
}

/// Route `tracing` output to stderr, filtered by `RUST_LOG` (default `warn`).
#[cfg(feature = "tracing")]
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

#[cfg(not(feature = "tracing"))]
pub fn init_logging() {}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    let tty = TerminalContext::open_controlling()?.with_config(cli.query_config());
    let mut out = io::stdout().lock();
    let outcome = execute(&cli.command, &tty, &mut out);
    tty.close()?;
    outcome
}

/// Run one command against an acquired terminal, writing results to `out`.
pub fn execute(command: &Commands, tty: &TerminalContext<'_>, out: &mut impl Write) -> Result<()> {
    match command {
        Commands::Size => {
            let geometry = tty.window_geometry()?;
            writeln!(out, "{}", format_geometry(&geometry))?;
        }
        Commands::Color { slots } => {
            for &slot in slots {
                let color = tty.query_color(slot)?;
                writeln!(out, "{}", format_color(slot, color))?;
            }
        }
        Commands::Name => {
            let name = tty.tty_name()?;
            writeln!(out, "{}", name.display())?;
        }
    }
    Ok(())
}

pub fn format_geometry(geometry: &WindowGeometry) -> String {
    let (cols, rows, xpixel, ypixel) = geometry.as_tuple();
    format!("{cols} {rows} {xpixel} {ypixel}")
}

pub fn format_color(slot: ColorSlot, color: Option<Rgb>) -> String {
    match color {
        Some(rgb) => format!("{slot} {rgb}"),
        None => format!("{slot} unknown"),
    }
}
