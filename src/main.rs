use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "runpanel",
    about = "Shop-floor run panel: live and past production runs from ON/OFF job records",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the live panel (ticking durations + periodic snapshot refresh)
    Watch {
        /// Config file path (falls back to RUNPANEL_CONFIG, then ./runpanel.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the backend API root
        #[arg(long)]
        source_url: Option<String>,
    },

    /// Fetch one snapshot and list the grouped runs
    Runs {
        /// Which runs to list: live, past or all
        #[arg(long, default_value = "live")]
        view: String,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the backend API root
        #[arg(long)]
        source_url: Option<String>,
    },

    /// Move a product's live run to past
    MoveToPast {
        /// Product id of the live run
        #[arg(long)]
        product: String,

        /// Machine name, required when the product runs on several machines
        #[arg(long)]
        machine: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the backend API root
        #[arg(long)]
        source_url: Option<String>,
    },
}

fn load_config(
    path: Option<PathBuf>,
    source_url: Option<String>,
) -> Result<runpanel::config::PanelConfig> {
    let mut config = match path {
        Some(p) => runpanel::config::PanelConfig::load(&p)?,
        None => runpanel::config::PanelConfig::load_or_default(),
    };
    if let Some(url) = source_url {
        config.source.base_url = url;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Watch { config, source_url } => {
            let config = load_config(config, source_url)?;
            tracing::info!(base_url = %config.source.base_url, "Starting run panel");
            runpanel::watch(&config).await?;
        }
        Commands::Runs {
            view,
            json,
            config,
            source_url,
        } => {
            let config = load_config(config, source_url)?;
            let backend = runpanel::source::http::HttpBackend::new(&config.source)?;
            let mut panel = runpanel::panel::WorkPanel::new(backend, config.panel.clone());
            panel.refresh().await.context("fetching job snapshot")?;
            panel.tick(chrono::Utc::now());

            let runs: Vec<&runpanel::runs::RunGroup> = match view.as_str() {
                "live" => panel.live_runs(),
                "past" => panel.past_runs(),
                "all" => {
                    let mut all = panel.live_runs();
                    all.extend(panel.past_runs());
                    all
                }
                other => anyhow::bail!("unknown view '{}' (expected live, past or all)", other),
            };

            if json {
                let rows: Vec<serde_json::Value> = runs
                    .iter()
                    .map(|run| {
                        serde_json::json!({
                            "product": run.display_name,
                            "productId": run.key.product_id,
                            "operation": run.operation(),
                            "state": run.state().as_str(),
                            "date": run.display_date(),
                            "quantity": run.quantity(),
                            "time": panel.timing_for(run).to_string(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if runs.is_empty() {
                println!("No runs found.");
            } else {
                println!(
                    "{:<24} | {:<16} | {:<12} | {:>3} | Time",
                    "Product", "Operation", "Date", "Qty"
                );
                println!(
                    "{:-<24}-|-{:-<16}-|-{:-<12}-|-{:-<3}-|-{:-<20}",
                    "", "", "", "", ""
                );
                for run in runs {
                    println!(
                        "{:<24} | {:<16} | {:<12} | {:>3} | {}",
                        run.display_name,
                        run.operation(),
                        run.display_date(),
                        run.quantity(),
                        panel.timing_for(run)
                    );
                }
            }
        }
        Commands::MoveToPast {
            product,
            machine,
            config,
            source_url,
        } => {
            let config = load_config(config, source_url)?;
            let backend = runpanel::source::http::HttpBackend::new(&config.source)?;

            use runpanel::source::JobSource;
            let raw = backend.fetch_jobs().await.context("fetching job snapshot")?;
            let jobs = runpanel::jobs::well_formed_records(raw);
            let groups = runpanel::runs::group::group_jobs(&jobs);

            let candidates: Vec<&runpanel::runs::RunGroup> = groups
                .iter()
                .filter(|g| g.is_live() && g.key.product_id == product)
                .filter(|g| machine.as_deref().map_or(true, |m| g.key.machine == m))
                .collect();

            match candidates.as_slice() {
                [] => {
                    println!("{}", runpanel::panel::MSG_JOB_NOT_FOUND);
                }
                [run] => match runpanel::lifecycle::move_to_past(&backend, run).await {
                    Ok(outcome) => {
                        tracing::info!(
                            product_id = %outcome.product_id,
                            job_id = %outcome.job_id,
                            "run moved to past"
                        );
                        println!("{}", runpanel::panel::MSG_MOVED_TO_PAST);
                    }
                    Err(runpanel::lifecycle::TransitionError::RecordNotFound { .. }) => {
                        println!("{}", runpanel::panel::MSG_JOB_NOT_FOUND);
                    }
                    Err(e) => {
                        return Err(anyhow::Error::new(e)
                            .context(runpanel::panel::MSG_MOVE_FAILED.to_string()));
                    }
                },
                many => {
                    let machines: Vec<&str> =
                        many.iter().map(|g| g.key.machine.as_str()).collect();
                    anyhow::bail!(
                        "product {} has live runs on several machines ({}); pick one with --machine",
                        product,
                        machines.join(", ")
                    );
                }
            }
        }
    }

    Ok(())
}
