use clap::Parser;
use phenorank_api::{PhenotypeService, RestApi, ServiceConfig};
use phenorank_storage::{
    CatalogManager, DatasetLoader, SnapshotLoader, SnapshotManager, TsvDatasetLoader, DEFAULT_MAX_SNAPSHOTS,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Phenotype-driven disease candidate ranking service
#[derive(Parser, Debug)]
#[command(name = "phenorank")]
#[command(about = "Rank candidate diseases from HPO phenotypes", long_about = None)]
struct Args {
    /// Annotation table (TSV with HPO Term, HPO ID, Frequency, Disease ID/Name columns)
    #[arg(long, default_value = "./data/hpo_disorders.tsv")]
    annotations: PathBuf,

    /// OMIM mimTitles.txt
    #[arg(long, default_value = "./data/mimTitles.txt")]
    mim_titles: PathBuf,

    /// HPO is-a edges, one `child<TAB>parent` per line
    #[arg(long)]
    hpo_dag: Option<PathBuf>,

    /// Disease to phenotype annotations, one `disease<TAB>phenotype` per line
    #[arg(long)]
    disease_phenotypes: Option<PathBuf>,

    /// HTTP API port
    #[arg(long, default_value_t = 8000)]
    http_port: u16,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Diseases returned per ranking
    #[arg(long, default_value_t = 5)]
    top_k: usize,

    /// Phenotypes returned per suggestion request
    #[arg(long, default_value_t = 5)]
    suggestions: usize,

    /// Cap on prefix search results (unlimited when omitted)
    #[arg(long)]
    search_limit: Option<usize>,

    /// Prefix stripped from disease ids before title lookup
    #[arg(long, default_value = "OMIM:")]
    namespace_prefix: String,

    /// Write a snapshot here after every successful load
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Snapshots kept in --snapshot-dir; 0 keeps all of them
    #[arg(long, default_value_t = DEFAULT_MAX_SNAPSHOTS)]
    max_snapshots: usize,

    /// Serve from the newest snapshot in --snapshot-dir instead of the source tables
    #[arg(long, default_value_t = false, requires = "snapshot_dir")]
    from_snapshot: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting PhenoRank v{}", env!("CARGO_PKG_VERSION"));
    info!("HTTP API port: {}", args.http_port);

    let config = ServiceConfig {
        top_k: args.top_k,
        suggestions: args.suggestions,
        namespace_prefix: args.namespace_prefix.clone(),
        search_limit: args.search_limit,
    };
    config.validate()?;

    let (loader, snapshots): (Arc<dyn DatasetLoader>, Option<SnapshotManager>) =
        match (&args.snapshot_dir, args.from_snapshot) {
            (Some(dir), true) => {
                info!("Loading from snapshots in {:?}", dir);
                (Arc::new(SnapshotLoader::new(SnapshotManager::new(dir)?, None)), None)
            }
            (dir, _) => {
                info!("Annotation table: {:?}", args.annotations);
                info!("MIM titles: {:?}", args.mim_titles);
                let mut loader = TsvDatasetLoader::new(&args.annotations, &args.mim_titles);
                if let Some(dag) = &args.hpo_dag {
                    loader = loader.with_ontology(dag);
                }
                if let Some(annotations) = &args.disease_phenotypes {
                    loader = loader.with_disease_phenotypes(annotations);
                }
                let retention = (args.max_snapshots > 0).then_some(args.max_snapshots);
                let snapshots = dir
                    .as_ref()
                    .map(|d| SnapshotManager::new(d).map(|m| m.with_retention(retention)))
                    .transpose()?;
                (Arc::new(loader), snapshots)
            }
        };

    let manager = Arc::new(CatalogManager::with_snapshots(loader, snapshots));
    if manager.is_available() {
        info!("Catalog initialized");
    } else {
        warn!("Catalog unavailable, requests will fail until POST /reload succeeds");
    }

    let service = Arc::new(PhenotypeService::new(manager, config));

    let http_port = args.http_port;
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on port {}", http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(service, http_port).await {
                error!("HTTP server error: {}", e);
            }
        })
    });

    info!("PhenoRank started successfully");
    info!("HTTP API: http://localhost:{}/", args.http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}
