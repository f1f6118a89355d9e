use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use newsroom_core::types::SourceKind;
use newsroom_core::{NewsroomConfig, SourcesDescriptor};
use newsroom_dedup::DedupService;
use newsroom_editorial::{EditorialService, PromptDocument};
use newsroom_llm::OllamaClient;
use newsroom_logstore::LogManager;
use newsroom_pipeline::{JobRunner, Orchestrator};
use newsroom_sources::{build_driver, SourceDriver};
use newsroom_store::RecordStore;
use newsroom_vector::QdrantClient;

mod app;
mod error;
mod http;

/// Multi-source news aggregation and editorial pipeline gateway.
#[derive(Parser)]
#[command(name = "newsroom-gateway", version)]
struct Args {
    /// Path to newsroom.toml (default: ./newsroom.toml, then NEWSROOM_* env).
    #[arg(long)]
    config: Option<String>,
    /// Override the configured bind address.
    #[arg(long)]
    bind: Option<String>,
    /// Override the configured port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    let code = match run().await {
        Ok(interrupted) => {
            if interrupted {
                130
            } else {
                0
            }
        }
        Err(e) => {
            error!("fatal: {:#}", e);
            1
        }
    };
    std::process::exit(code);
}

/// Returns `Ok(true)` when shut down by user interrupt.
async fn run() -> anyhow::Result<bool> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "newsroom=info,newsroom_gateway=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();
    let mut config = NewsroomConfig::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.gateway.bind = bind;
    }
    if let Some(port) = args.port {
        config.gateway.port = port;
    }

    // Singletons, constructed once and passed by handle.
    let store = Arc::new(RecordStore::open(&config.database.path)?);
    let llm = Arc::new(OllamaClient::new(
        &config.ollama.base_url,
        &config.ollama.model,
        &config.ollama.embedding_model,
        config.ollama.timeout_secs,
        config.ollama.max_retries,
        config.ollama.context_window,
    ));
    let vector = Arc::new(QdrantClient::new(
        &config.vector.url,
        config.vector.dimension,
        config.vector.timeout_secs,
    ));

    // A collection created under another embedding model is a config error,
    // not something to paper over at runtime.
    if vector.health_check().await {
        for kind in SourceKind::ALL {
            vector.verify_dimension(kind.collection_name()).await?;
        }
    } else {
        info!("vector index unreachable at startup, dedup will degrade");
    }

    let dedup = Arc::new(DedupService::new(
        Arc::clone(&llm),
        Arc::clone(&vector),
        config.dedup.score_threshold,
    ));
    let prompt_doc = PromptDocument::load_or_builtin(&config.editorial.prompt_path)?;
    let editorial = Arc::new(EditorialService::new(Arc::clone(&llm), &prompt_doc));

    let logs = Arc::new(
        LogManager::init(
            &config.logstore.redis_url,
            &config.logstore.log_dir,
            config.logstore.max_logs,
            config.logstore.prefer_redis,
        )
        .await?,
    );

    let descriptor = Arc::new(SourcesDescriptor::load(&config.sources.descriptor_path)?);
    let mut drivers: HashMap<SourceKind, Arc<dyn SourceDriver>> = HashMap::new();
    for kind in SourceKind::ALL {
        drivers.insert(
            kind,
            Arc::from(build_driver(
                kind,
                &descriptor,
                config.sources.fetch_delay_ms,
                config.sources.timeout_secs,
            )),
        );
    }

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::clone(&store),
        dedup.clone(),
        editorial.clone(),
        config.pipeline.min_text_length,
    ));
    let runner = Arc::new(JobRunner::new(
        orchestrator,
        drivers,
        Arc::clone(&descriptor),
        Arc::clone(&logs),
        config.pipeline.max_concurrent_jobs,
        config.pipeline.max_parallel_tasks,
    ));

    let bind = config.gateway.bind.clone();
    let port = config.gateway.port;
    let state = Arc::new(app::AppState {
        config,
        store,
        llm,
        vector,
        dedup,
        runner,
        logs,
    });
    let router = app::build_router(state);

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    info!("newsroom gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let interrupted = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, shutting down");
                flag.store(true, std::sync::atomic::Ordering::SeqCst);
            }
        })
        .await?;

    Ok(interrupted.load(std::sync::atomic::Ordering::SeqCst))
}
