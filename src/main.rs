use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

use findoc_analyzer::agents::{Crew, CrewInputs, CrewSettings};
use findoc_analyzer::config::Config;
use findoc_analyzer::db::{self, PgResultStore, ResultStore};
use findoc_analyzer::llm::adapter_from_config;
use findoc_analyzer::models::{AppState, DEFAULT_QUERY};
use findoc_analyzer::queue::{JobQueue, RedisJobQueue, Worker};
use findoc_analyzer::routes::create_router;
use findoc_analyzer::search::SerpApiClient;
use findoc_analyzer::storage::{write_report, LocalStorage, ReportMeta};
use findoc_analyzer::tools::Toolbox;
use findoc_analyzer::utils::init_logger;

#[derive(Parser)]
#[command(name = "findoc-analyzer", version, about = "Financial document analysis service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Also run a worker pool in this process
        #[arg(long)]
        with_worker: bool,
    },
    /// Run a worker pool only
    Worker {
        /// Number of jobs processed at once (defaults to WORKER_CONCURRENCY)
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Analyze a local file synchronously and print the report
    Analyze {
        #[arg(long)]
        file: PathBuf,
        #[arg(long, default_value = DEFAULT_QUERY)]
        query: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env()?;
    let _log_guard = init_logger(&config.logging);
    info!("Configuration loaded: {:?}", config.server);

    match cli.command {
        Command::Serve { with_worker } => serve(config, with_worker).await,
        Command::Worker { concurrency } => {
            let concurrency = concurrency.unwrap_or(config.worker.concurrency);
            let (store, queue) = connect_backends(&config).await?;
            let worker = build_worker(&config, store, queue)?;
            let (tx, rx) = watch::channel(false);
            let pool = tokio::spawn(worker.run(concurrency, rx));
            shutdown_signal().await;
            let _ = tx.send(true);
            pool.await?;
            Ok(())
        }
        Command::Analyze { file, query } => analyze(config, file, query).await,
    }
}

async fn connect_backends(
    config: &Config,
) -> anyhow::Result<(Arc<dyn ResultStore>, Arc<dyn JobQueue>)> {
    // Connect to database
    let pool = db::create_pool(&config.database).await?;

    info!("Running database migrations...");
    db::run_migrations(&pool).await?;
    info!("Database migrations completed");

    let queue = RedisJobQueue::connect(&config.redis)
        .await
        .context("Failed to connect to Redis broker")?;

    Ok((Arc::new(PgResultStore::new(pool)), Arc::new(queue)))
}

fn build_crew(config: &Config) -> anyhow::Result<Arc<Crew>> {
    let llm = adapter_from_config(&config.llm)?;
    let toolbox = Toolbox::new(SerpApiClient::from_config(&config.search));
    if !toolbox.has_search() {
        info!("SERPAPI_API_KEY not set, web search disabled");
    }
    Ok(Arc::new(Crew::financial(
        llm,
        toolbox,
        CrewSettings::from_config(&config.llm),
    )))
}

fn build_worker(
    config: &Config,
    store: Arc<dyn ResultStore>,
    queue: Arc<dyn JobQueue>,
) -> anyhow::Result<Arc<Worker>> {
    Ok(Arc::new(Worker::new(
        queue,
        store,
        build_crew(config)?,
        LocalStorage::from_config(&config.worker),
        config.worker.clone(),
    )))
}

async fn serve(config: Config, with_worker: bool) -> anyhow::Result<()> {
    let (store, queue) = connect_backends(&config).await?;

    let (tx, rx) = watch::channel(false);
    let pool = if with_worker {
        let worker = build_worker(&config, store.clone(), queue.clone())?;
        Some(tokio::spawn(worker.run(config.worker.concurrency, rx)))
    } else {
        None
    };

    // Create shared state
    let state = AppState {
        storage: LocalStorage::from_config(&config.worker),
        store,
        queue,
        config: config.clone(),
    };
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("HOST/PORT do not form a valid socket address")?;
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    let _ = tx.send(true);
    if let Some(pool) = pool {
        pool.await?;
    }

    Ok(())
}

async fn analyze(config: Config, file: PathBuf, query: String) -> anyhow::Result<()> {
    let crew = build_crew(&config)?;
    let query = findoc_analyzer::routes::analyze::normalize_query(Some(&query));

    let output = crew
        .kickoff(&CrewInputs {
            query: query.clone(),
            path: file.clone(),
        })
        .await
        .with_context(|| format!("Analysis of {} failed", file.display()))?;

    for task in &output.tasks_output {
        info!(agent = %task.agent, answer_len = task.raw.len(), "Step finished");
    }

    let session_id = uuid::Uuid::new_v4().to_string();
    let storage = LocalStorage::from_config(&config.worker);
    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let meta = ReportMeta {
        session_id: &session_id,
        query: &query,
        filename: &filename,
        created_at: chrono::Utc::now(),
    };
    let report = write_report(storage.report_path(&session_id), &meta, &output.raw).await?;
    info!(path = %report.display(), "Report written");

    println!("{}", output.raw);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
