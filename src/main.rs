use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use pozole::prelude::*;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pozole")]
#[command(about = "A technical-indicator strategy backtester for one-second bars", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    //run a backtest for every configured symbol
    Run(RunArgs),

    //write the default configuration to a json file
    InitConfig {
        //destination path
        #[arg(long, default_value = "pozole.json")]
        path: PathBuf,
    },
}

//command line values override the config file
#[derive(Args)]
struct RunArgs {
    //path to json configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    //path to csv bar file
    #[arg(long)]
    data: Option<PathBuf>,

    //comma separated symbols (eg BTC-USDT,ETH-USDT)
    #[arg(long, value_delimiter = ',')]
    symbols: Option<Vec<String>>,

    //days of bars before the end time
    #[arg(long)]
    lookback_days: Option<u32>,

    //initial capital
    #[arg(long)]
    initial_capital: Option<f64>,

    //end of the lookback window (rfc3339), defaults to now
    #[arg(long, value_parser = parse_time)]
    end: Option<DateTime<Utc>>,

    //minimum bars required to run, never below the longest indicator window
    #[arg(long)]
    min_bars: Option<usize>,

    //return rows in the sample artifact
    #[arg(long)]
    sample_rows: Option<usize>,

    //experiment output directory
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid rfc3339 timestamp '{}': {}", s, e))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("pozole=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_backtests(args)?,
        Commands::InitConfig { path } => {
            BacktestConfiguration::default().to_json_file(&path)?;
            println!("Default configuration written to {:?}", path);
        }
    }

    Ok(())
}

fn load_configuration(args: RunArgs) -> Result<BacktestConfiguration> {
    let mut config = match &args.config {
        Some(path) => BacktestConfiguration::from_json_file(path)
            .context(format!("Failed to load configuration from {:?}", path))?,
        None => BacktestConfiguration::default(),
    };

    if let Some(data) = args.data {
        config.data_path = data;
    }
    if let Some(symbols) = args.symbols {
        config.symbols = symbols;
    }
    if let Some(lookback_days) = args.lookback_days {
        config.lookback_days = lookback_days;
    }
    if let Some(initial_capital) = args.initial_capital {
        config.initial_capital = initial_capital;
    }
    if let Some(end) = args.end {
        config.end_time = Some(end);
    }
    if let Some(min_bars) = args.min_bars {
        config.min_bars = min_bars;
    }
    if let Some(sample_rows) = args.sample_rows {
        config.sample_rows = sample_rows;
    }
    if let Some(output_dir) = args.output_dir {
        config.output_dir = output_dir;
    }

    Ok(config)
}

fn run_backtests(args: RunArgs) -> Result<()> {
    let config = load_configuration(args)?;

    println!("Pozole Strategy Backtester");
    println!("==========================\n");

    let source = CsvBarSource::new(&config.data_path);
    let sink = FileExperimentSink::new(&config.output_dir);

    info!(
        data = ?source.path(),
        output = ?sink.root(),
        symbols = ?config.symbols,
        lookback_days = config.lookback_days,
        initial_capital = config.initial_capital,
        "starting backtests"
    );

    let engine = BacktestEngine::new(config.engine_config(), &source, &sink)
        .with_rule(Box::new(config.rule()));

    let requests = config.requests();
    let results = engine.run_many(&requests);

    let mut failures = 0;
    for (request, result) in requests.iter().zip(results) {
        match result {
            Ok(result) => {
                println!(
                    "Backtest Results: {} (run {})",
                    result.symbol,
                    result.run_id.as_deref().unwrap_or("-")
                );
                result.scorecard.pretty_print_table();
                println!();
            }
            Err(err) if !err.is_fatal() => {
                warn!(symbol = %request.symbol, "{}", err);
            }
            Err(err) => {
                error!(symbol = %request.symbol, "backtest failed: {:#}", anyhow::Error::new(err));
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} backtests failed", failures, requests.len());
    }

    println!("Runs written to {:?}", sink.root());
    Ok(())
}
