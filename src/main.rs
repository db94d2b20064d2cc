//! CLI entry point for the bike-share traffic tool.
//!
//! Loads the station list and trip log, then computes station markers for a
//! single time-of-day filter, sweeps the filter across the whole day, or
//! summarises the busiest stations.

use anyhow::Result;
use bikeshare_traffic::{
    config::Sources,
    fetch::BasicClient,
    filter::{MINUTES_PER_DAY, TimeFilter},
    loader::load_dataset,
    model::LngLat,
    output::{FrameDocument, append_frame, print_json, print_pretty, write_json},
    pipeline::PipelineState,
    projection::{ViewEvent, Viewport},
};
use clap::{Args, Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "bikeshare_traffic")]
#[command(about = "Per-station bike-share traffic by time of day", long_about = None)]
struct Cli {
    /// Station list (URL or path). Overrides BIKESHARE_STATIONS_URL
    #[arg(long, global = true)]
    stations: Option<String>,

    /// Trip log CSV (URL or path, may be gzipped). Overrides BIKESHARE_TRIPS_URL
    #[arg(long, global = true)]
    trips: Option<String>,

    /// Bike-lane GeoJSON passed through to frame output. Overrides BIKESHARE_BIKE_LANES_URL
    #[arg(long, global = true)]
    bike_lanes: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute station markers for one time-of-day filter
    Frame {
        /// Minute of the day (0-1439) to centre the window on, or -1 for any time
        #[arg(short, long, default_value_t = -1, allow_negative_numbers = true)]
        cutoff: i32,

        /// Write the frame as JSON to this file
        #[arg(long)]
        json: Option<String>,

        /// Append the frame's markers to this CSV file
        #[arg(long)]
        csv: Option<String>,

        #[command(flatten)]
        view: ViewArgs,
    },
    /// Run the filter across the whole day and append every frame to a CSV
    Sweep {
        /// Minutes between successive cutoffs
        #[arg(short, long, default_value_t = 60)]
        step: u32,

        /// CSV file to append results to
        #[arg(short, long, default_value = "sweep.csv")]
        output: String,

        /// Also emit the unfiltered frame first
        #[arg(long, default_value_t = false)]
        include_unfiltered: bool,

        #[command(flatten)]
        view: ViewArgs,
    },
    /// Load the datasets and list the busiest stations
    Stations {
        /// Number of stations to list
        #[arg(short = 'n', long, default_value_t = 10)]
        top: usize,
    },
}

/// Map view used to compute screen positions.
#[derive(Args)]
struct ViewArgs {
    /// Longitude of the map centre
    #[arg(long, allow_negative_numbers = true)]
    center_lon: Option<f64>,

    /// Latitude of the map centre
    #[arg(long, allow_negative_numbers = true)]
    center_lat: Option<f64>,

    /// Zoom level
    #[arg(long)]
    zoom: Option<f64>,

    /// Viewport width in pixels
    #[arg(long)]
    width: Option<f64>,

    /// Viewport height in pixels
    #[arg(long)]
    height: Option<f64>,
}

impl ViewArgs {
    fn viewport(&self) -> Viewport {
        let mut viewport = Viewport::default();
        let center = LngLat::new(
            self.center_lon.unwrap_or(viewport.center.lon),
            self.center_lat.unwrap_or(viewport.center.lat),
        );
        viewport.apply(ViewEvent::Move { center });
        if let Some(zoom) = self.zoom {
            viewport.apply(ViewEvent::Zoom { zoom });
        }
        viewport.apply(ViewEvent::Resize {
            width: self.width.unwrap_or(viewport.width),
            height: self.height.unwrap_or(viewport.height),
        });
        viewport
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/bikeshare_traffic.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bikeshare_traffic.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let sources = Sources::resolve(cli.stations, cli.trips, cli.bike_lanes);
    let client = BasicClient::with_timeouts(Duration::from_secs(300), Duration::from_secs(10))?;

    match cli.command {
        Commands::Frame {
            cutoff,
            json,
            csv,
            view,
        } => {
            let filter = TimeFilter::from_slider(cutoff)?;
            let dataset = load_dataset(&client, &sources).await?;
            let mut state = PipelineState::from_dataset(dataset, view.viewport());
            let frame = state.update(filter);

            info!(
                cutoff = frame.cutoff,
                label = %frame.label,
                trips = frame.trip_count,
                max_traffic = frame.max_traffic,
                "Frame computed"
            );
            if frame.orphan_references > 0 {
                warn!(
                    orphan_references = frame.orphan_references,
                    "Some trips reference stations missing from the station list"
                );
            }

            match (&json, &csv) {
                (None, None) => print_json(frame)?,
                _ => print_pretty(frame),
            }
            if let Some(path) = json {
                let document = FrameDocument {
                    bike_lanes: &sources.bike_lanes,
                    frame,
                };
                write_json(&path, &document)?;
                info!(path = %path, "Frame written");
            }
            if let Some(path) = csv {
                append_frame(&path, frame)?;
                info!(path = %path, "Frame appended");
            }
        }
        Commands::Sweep {
            step,
            output,
            include_unfiltered,
            view,
        } => {
            anyhow::ensure!(step > 0, "--step must be at least one minute");

            let dataset = load_dataset(&client, &sources).await?;
            let mut state = PipelineState::from_dataset(dataset, view.viewport());

            if include_unfiltered {
                append_frame(&output, state.frame())?;
            }

            for minute in (0..MINUTES_PER_DAY).step_by(step as usize) {
                let frame = state.update(TimeFilter::Cutoff(minute));
                info!(
                    cutoff = minute,
                    label = %frame.label,
                    trips = frame.trip_count,
                    max_traffic = frame.max_traffic,
                    "Sweep step"
                );
                append_frame(&output, frame)?;
            }

            info!(output = %output, "Sweep complete");
        }
        Commands::Stations { top } => {
            let dataset = load_dataset(&client, &sources).await?;
            let state = PipelineState::from_dataset(dataset, Viewport::default());

            let mut markers: Vec<_> = state.frame().markers.iter().collect();
            markers.sort_by(|a, b| b.total_traffic.cmp(&a.total_traffic).then(a.id.cmp(&b.id)));

            info!(
                stations = state.stations().len(),
                trips = state.trips().len(),
                "Station summary"
            );
            for marker in markers.into_iter().take(top) {
                info!(
                    id = %marker.id,
                    name = %marker.name,
                    total = marker.total_traffic,
                    departures = marker.departures,
                    arrivals = marker.arrivals,
                    "Station"
                );
            }
        }
    }

    Ok(())
}
