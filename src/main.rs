use calc_master::calc::error::CalcError;
use calc_master::calc::expression;
use calc_master::orchestrator::config::Config;
use calc_master::orchestrator::registry::Registry;
use calc_master::orchestrator::server;
use calc_master::orchestrator::types::ExpressionStatus;
use calc_master::orchestrator::worker::{spawn_workers, HttpTaskSource, TaskSource};
use clap::{Parser, Subcommand};
use dotenv::dotenv;

use std::sync::Arc;
use tokio::sync::watch;
use url::Url;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the orchestrator HTTP server
    Serve {
        /// Port to listen on (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// In-process workers pulling straight from the registry
        #[arg(short, long, default_value_t = 0)]
        workers: usize,
    },
    /// Run polling workers against a remote orchestrator
    Agent {
        /// Orchestrator base URL (overrides ORCHESTRATOR_URL)
        #[arg(short, long)]
        url: Option<String>,

        /// Number of concurrent workers (overrides COMPUTING_POWER)
        #[arg(short, long)]
        workers: Option<usize>,
    },
    /// Evaluate a single expression with in-process workers
    Eval {
        /// The expression, e.g. "(1 + 2) * 3"
        expression: String,

        /// Number of concurrent workers (overrides COMPUTING_POWER)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Also evaluate directly and compare the two results
        #[arg(long)]
        check: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let config = Config::from_env()?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    match args.command {
        Commands::Serve { port, workers } => {
            let registry = Registry::new(config.operation_times.clone());

            let handles = spawn_workers(
                Arc::new(registry.clone()),
                workers,
                config.poll_interval,
                shutdown_rx,
            );
            if workers > 0 {
                log::info!("Started {} in-process workers", workers);
            }

            let shutdown = async move {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    log::error!("Failed to listen for ctrl-c: {}", e);
                }
                log::info!("Shutting down");
                let _ = shutdown_tx.send(true);
            };
            server::serve(registry, port.unwrap_or(config.port), shutdown).await?;
            futures::future::join_all(handles).await;
        }
        Commands::Agent { url, workers } => {
            let url = match url {
                Some(raw) => Url::parse(&raw)
                    .map_err(|e| CalcError::config(format!("--url {}: {}", raw, e)))?,
                None => config.orchestrator_url.clone(),
            };
            let workers = config.worker_count(workers)?;

            let source: Arc<dyn TaskSource> = Arc::new(HttpTaskSource::new(&url)?);
            log::info!("Starting {} workers against {}", workers, url);
            let handles = spawn_workers(source, workers, config.poll_interval, shutdown_rx);

            tokio::signal::ctrl_c().await?;
            log::info!("Shutting down");
            let _ = shutdown_tx.send(true);
            futures::future::join_all(handles).await;
        }
        Commands::Eval {
            expression: text,
            workers,
            check,
        } => {
            let registry = Registry::new(config.operation_times.clone());
            let id = registry.submit_text(&text).await?;

            let workers = config.worker_count(workers)?;
            let handles = spawn_workers(
                Arc::new(registry.clone()),
                workers,
                config.poll_interval,
                shutdown_rx,
            );

            let snapshot = loop {
                let snapshot = registry.get_expression(id).await?;
                if snapshot.status.is_finished() {
                    break snapshot;
                }
                tokio::time::sleep(config.poll_interval).await;
            };
            let _ = shutdown_tx.send(true);
            futures::future::join_all(handles).await;

            match (snapshot.status, snapshot.result, snapshot.error) {
                (ExpressionStatus::Complete, Some(result), _) => {
                    println!("{} = {}", snapshot.expression, result);

                    if check {
                        let direct = expression::parse(&text)?.evaluate()?;
                        if (direct - result).abs() > f64::EPSILON * direct.abs().max(1.0) {
                            return Err(format!(
                                "Mismatch: tasks gave {}, direct evaluation gave {}",
                                result, direct
                            )
                            .into());
                        }
                        println!("Check passed");
                    }
                }
                (_, _, Some(error)) => return Err(CalcError::from(error).into()),
                (status, _, _) => {
                    return Err(CalcError::protocol(format!(
                        "Expression finished as {:?} without a result",
                        status
                    ))
                    .into())
                }
            }
        }
    }

    Ok(())
}
