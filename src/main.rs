//! Command line driver: reads an order book from JSON, runs the optimizer and
//! prints the planner report.

use clap::Parser;
use load_consolidator::order::Order;
use load_consolidator::problem::{CoordinateTable, LaneRate, RateTable};
use load_consolidator::provider::{optimize, InMemoryOrderBook, ReferenceData};
use load_consolidator::utils::{format_run_report, save_outcome};
use load_consolidator::{Config, OptimizationParams, Result, TrailerType};
use log::info;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(
    name = "load-consolidator",
    version,
    about = "Consolidate outbound orders into truck loads"
)]
struct Arguments {
    /// Order book JSON with orders, coordinates and rates
    #[arg(long)]
    input: PathBuf,
    /// Origin plant to plan for
    #[arg(long)]
    origin: String,
    /// Trailer floor length in feet; defaults to the trailer type's length
    #[arg(long)]
    capacity: Option<f64>,
    #[arg(long, default_value_t = 15.0)]
    max_detour_pct: f64,
    #[arg(long, default_value_t = 7)]
    time_window_days: u32,
    /// Clustering radius in miles
    #[arg(long, default_value_t = 100.0)]
    radius: f64,
    #[arg(long, default_value_t = 70.0)]
    min_utilization: f64,
    /// step-deck, flatbed or wedge
    #[arg(long, default_value = "step-deck")]
    trailer: String,
    /// Consolidate regardless of due dates
    #[arg(long)]
    no_time_window: bool,
    /// Tuning configuration JSON
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    time_limit_secs: Option<u64>,
    /// Write the full outcome as JSON
    #[arg(long)]
    output: Option<PathBuf>,
}

/// Layout of the `--input` file.
#[derive(Debug, Deserialize)]
struct OrderBookFile {
    orders: Vec<Order>,
    #[serde(default)]
    coordinates: BTreeMap<String, (f64, f64)>,
    #[serde(default)]
    rates: Vec<LaneRate>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let arguments = Arguments::parse();
    if let Err(error) = run(arguments) {
        eprintln!("load-consolidator: {error}");
        process::exit(1);
    }
}

fn run(arguments: Arguments) -> Result<()> {
    let trailer_type: TrailerType = arguments.trailer.parse()?;
    let params = OptimizationParams::new(&arguments.origin)
        .with_trailer_type(trailer_type)
        .with_capacity(
            arguments
                .capacity
                .unwrap_or_else(|| trailer_type.default_capacity_ft()),
        )
        .with_max_detour_pct(arguments.max_detour_pct)
        .with_time_window_days(arguments.time_window_days)
        .with_geo_radius(arguments.radius)
        .with_min_utilization_target(arguments.min_utilization)
        .with_time_window_enforced(!arguments.no_time_window);
    params.validate()?;

    let mut config = match &arguments.config {
        Some(path) => read_json::<Config>(path)?,
        None => Config::new(),
    };
    if let Some(secs) = arguments.time_limit_secs {
        config = config.with_time_limit(Duration::from_secs(secs));
    }

    let book: OrderBookFile = read_json(&arguments.input)?;
    info!(
        "Loaded {} order(s), {} location(s), {} rate row(s) from {}",
        book.orders.len(),
        book.coordinates.len(),
        book.rates.len(),
        arguments.input.display()
    );

    let orders = book.orders.into_iter().map(normalize_order).collect();
    let reference = ReferenceData::new(
        book.coordinates.into_iter().collect::<CoordinateTable>(),
        RateTable::from_rates(&book.rates),
    );

    let outcome = optimize(&InMemoryOrderBook::new(orders), &reference, params, config)?;
    print!("{}", format_run_report(&outcome));

    if let Some(path) = &arguments.output {
        save_outcome(&outcome, path)?;
        info!("Outcome written to {}", path.display());
    }

    Ok(())
}

/// Rebuild a deserialized order so identifiers and due date are normalized.
fn normalize_order(order: Order) -> Order {
    let Order {
        id,
        origin,
        destination,
        region,
        due_date,
        excluded,
        lines,
    } = order;

    let rebuilt = Order::new(&id, &origin, &destination, due_date, lines).with_excluded(excluded);
    match region {
        Some(region) => rebuilt.with_region(&region),
        None => rebuilt,
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}
