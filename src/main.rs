use std::{sync::Arc, time::Duration};

use clap::Parser;
use color_eyre::{Result, eyre::eyre};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod control;
mod event;
mod producer;
mod scope;

use crate::{
    app::App,
    control::RunController,
    event::EventHandler,
    scope::{Scope, scale::ScaleConfig},
};

/// How long quitting waits on the producer before leaving it behind
const SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(500);

/// Live multi-channel oscilloscope trace in the terminal
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Samples per second, per channel
    #[arg(long, default_value_t = 1000)]
    sampling_rate: u32,
    /// Samples in one left-to-right sweep
    #[arg(long, default_value_t = 1000)]
    trace_length: u32,
    /// Horizontal grid divisions
    #[arg(long, default_value_t = 10)]
    rows: u32,
    /// Vertical grid divisions
    #[arg(long, default_value_t = 10)]
    cols: u32,
    /// Signal value at the bottom edge
    #[arg(long, default_value_t = -6.0, allow_negative_numbers = true)]
    y_min: f64,
    /// Signal value at the top edge
    #[arg(long, default_value_t = 6.0, allow_negative_numbers = true)]
    y_max: f64,
    /// Display refreshes per second
    #[arg(long, default_value_t = 60)]
    frame_rate: u32,
    /// Initial canvas width in pixels, replaced by the real trace area once drawn
    #[arg(long, default_value_t = 160)]
    width: u32,
    /// Initial canvas height in pixels (two per terminal row)
    #[arg(long, default_value_t = 96)]
    height: u32,
    /// Most verbose level kept in the log pane
    #[arg(long, default_value = "info")]
    log_level: log::LevelFilter,
}

impl Args {
    fn scale(&self) -> ScaleConfig {
        ScaleConfig {
            sampling_rate: self.sampling_rate,
            trace_length: self.trace_length,
            rows: self.rows,
            cols: self.cols,
            y_min: self.y_min,
            y_max: self.y_max,
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    init_logging(args.log_level)?;

    // Bad flags are reported before the terminal is taken over
    let mut scope = Scope::initialize(args.width, args.height, args.frame_rate)?;
    scope.configure(args.scale())?;

    let control = Arc::new(RunController::new());
    let events = EventHandler::new(args.frame_rate);
    let producer = producer::spawn(scope.generator(), control.clone(), events.get_sender());

    let terminal = ratatui::init();
    let result = App::new(events, scope, control).run(terminal);
    ratatui::restore();

    producer.shutdown(SHUTDOWN_TIMEOUT);
    result?.teardown();
    Ok(())
}

/// Route tracing (and `log`) output into the TUI log pane.
fn init_logging(level: log::LevelFilter) -> Result<()> {
    tui_logger::init_logger(level).map_err(|e| eyre!("failed to set up log capture: {e:?}"))?;
    tui_logger::set_default_level(level);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));
    tracing_subscriber::registry()
        .with(filter)
        .with(tui_logger::TuiTracingSubscriberLayer)
        .try_init()?;
    Ok(())
}
