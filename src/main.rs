use std::error::Error;

use chrono::{Local, NaiveDate};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use networth::cli::{Cli, Command, OutputFormat, ParameterArgs, build_parameters};
use networth::config::Config;
use networth::core::{ProjectionError, ProjectionSeries, nearest, project_at};
use networth::format::{age_label, currency};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let outcome = match cli.command {
        Command::Serve { host, port } => {
            let config = config.with_overrides(host, port);
            networth::api::run_http_server(&config)
                .await
                .map_err(|e| format!("Server error: {e}"))
        }
        Command::Project {
            params,
            as_of,
            every,
            format,
        } => run_projection(params, as_of, every, format).map_err(|e| e.to_string()),
        Command::Nearest { params, as_of, age } => {
            run_nearest(params, as_of, age).map_err(|e| e.to_string())
        }
    };

    if let Err(msg) = outcome {
        tracing::error!(error = %msg, "command failed");
        eprintln!("{msg}");
        std::process::exit(1);
    }
}

fn projected(
    params: ParameterArgs,
    as_of: Option<NaiveDate>,
) -> Result<ProjectionSeries, ProjectionError> {
    let params = build_parameters(params)?;
    project_at(&params, as_of.unwrap_or_else(|| Local::now().date_naive()))
}

fn run_projection(
    params: ParameterArgs,
    as_of: Option<NaiveDate>,
    every: u32,
    format: OutputFormat,
) -> Result<(), Box<dyn Error>> {
    let series = projected(params, as_of)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&series)?),
        OutputFormat::Table => {
            println!("{:>8}  {:>20}  retired", "age", "net worth");
            let last_index = series.len() - 1;
            for (i, sample) in series.iter().enumerate() {
                if i % every as usize != 0 && i != last_index {
                    continue;
                }
                println!(
                    "{:>8.2}  {:>20}  {}",
                    sample.age,
                    currency(sample.net_worth),
                    if sample.is_retired { "yes" } else { "no" }
                );
            }
            if let Some(depleted) = series.depletion_sample() {
                println!("savings exhausted at {}", age_label(depleted.age));
            }
        }
    }
    Ok(())
}

fn run_nearest(
    params: ParameterArgs,
    as_of: Option<NaiveDate>,
    age: f64,
) -> Result<(), Box<dyn Error>> {
    let series = projected(params, as_of)?;
    let sample = nearest(&series, age);
    println!(
        "{}  Net Worth: {}{}",
        age_label(sample.age),
        currency(sample.net_worth),
        if sample.is_retired { "  (retired)" } else { "" }
    );
    Ok(())
}
