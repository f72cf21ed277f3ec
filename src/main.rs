use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use robodata_pipeline::app::pipeline_use_case::{PipelineOrchestrator, PipelineOutcome};
use robodata_pipeline::app::ports::{PersistencePort, StatusReporter};
use robodata_pipeline::app::search_use_case::{SearchFilters, SearchUseCase};
use robodata_pipeline::config::Config;
use robodata_pipeline::constants::DEFAULT_CONFIG_PATH;
use robodata_pipeline::domain::{Dataset, FileRecord, StageEvent, StageStatus};
use robodata_pipeline::infra::archive_adapter::ZipArchiveExtractor;
use robodata_pipeline::infra::catalog_store_adapter::NdjsonCatalogStore;
use robodata_pipeline::infra::inference_gateway::InferenceGateway;
use robodata_pipeline::infra::status_reporter::TracingStatusReporter;
use robodata_pipeline::manifest::Manifest;
use robodata_pipeline::observability::{init_logging, init_metrics};
use robodata_pipeline::pipeline::ingestion::format_file_size;
use robodata_pipeline::pipeline::processing::LocalHeuristicEngine;
use robodata_pipeline::pipeline::storage::samples::sample_datasets;
use robodata_pipeline::pipeline::storage::Catalog;

#[derive(Parser)]
#[command(name = "robodata")]
#[command(about = "Robotics dataset ingestion, validation, tagging and publishing pipeline")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the four-stage pipeline on a manifest (.json or .toml)
    Run {
        #[arg(long)]
        manifest: PathBuf,
        /// Skip filling a blank robot model / sensor list from the description
        #[arg(long)]
        no_autofill: bool,
    },
    /// Detect robot model and sensors from a description and file names
    Detect {
        #[arg(long)]
        description: String,
        /// File name to scan for sensor keywords (repeatable)
        #[arg(long = "file")]
        files: Vec<String>,
    },
    /// Search the published catalog
    Search {
        /// Free-text query; may be empty when filters are given
        #[arg(default_value = "")]
        query: String,
        #[arg(long)]
        robot: Option<String>,
        #[arg(long)]
        sensor: Option<String>,
        #[arg(long)]
        min_quality: Option<u32>,
        /// Include the bundled sample datasets
        #[arg(long)]
        with_samples: bool,
    },
    /// Print totals over the published catalog as JSON
    Profile {
        /// Include the bundled sample datasets
        #[arg(long)]
        with_samples: bool,
    },
}

struct Services {
    config: Config,
    gateway: Arc<InferenceGateway>,
    store: Arc<NdjsonCatalogStore>,
}

fn build_services(config_path: &Path) -> anyhow::Result<Services> {
    let config = Config::load_from(config_path)?;
    let engine = Arc::new(LocalHeuristicEngine::new(config.pipeline.seed));
    let gateway = Arc::new(InferenceGateway::from_config(&config.inference, engine)?);
    let store = Arc::new(NdjsonCatalogStore::open(&config.storage.catalog_path)?);
    Ok(Services {
        config,
        gateway,
        store,
    })
}

/// Persisted datasets, optionally followed by the bundled samples.
async fn load_catalog(store: &NdjsonCatalogStore, with_samples: bool) -> anyhow::Result<Catalog> {
    let datasets: Vec<Dataset> = store
        .load_all()
        .await?
        .into_iter()
        .map(|entry| entry.into_dataset())
        .collect();
    let catalog = Catalog::with_datasets(datasets);
    if with_samples {
        catalog.extend_oldest(sample_datasets()).await;
    }
    Ok(catalog)
}

fn print_stage_event(event: &StageEvent) {
    let icon = match event.status {
        StageStatus::Waiting => "⏳",
        StageStatus::Active => "🔄",
        StageStatus::Completed => "✅",
        StageStatus::Error => "❌",
    };
    println!("{} [{}/4] {} - {}", icon, event.stage.index(), event.label, event.detail);
}

async fn run_manifest(services: Services, manifest_path: &Path, autofill: bool) -> anyhow::Result<bool> {
    let manifest = Manifest::from_path(manifest_path)?;
    let base_dir = manifest_path.parent().unwrap_or(Path::new("."));
    let mut session = manifest.into_session(base_dir, &ZipArchiveExtractor)?;

    println!("📂 {} uploads:", session.files.upload_count());
    for upload in session.files.uploads() {
        println!("   - {} ({})", upload.record.name, format_file_size(upload.record.size));
    }

    let persistence: Arc<dyn PersistencePort> = services.store.clone();
    let reporter: Arc<dyn StatusReporter> = Arc::new(|event: &StageEvent| {
        TracingStatusReporter.report(event);
        print_stage_event(event);
    });
    let orchestrator = PipelineOrchestrator::new(services.gateway.clone(), Catalog::new(), persistence, reporter)
        .with_settle_delay(services.config.pipeline.settle_delay());

    if autofill {
        let files = session.files.flattened();
        let mut info = session.info.clone();
        orchestrator.autofill_info(&mut info, &files).await;
        session.info = info;
    }

    match orchestrator.run(&mut session).await {
        PipelineOutcome::Published(dataset) => {
            println!("\n🎉 Published {}", dataset.info.title);
            println!("{}", serde_json::to_string_pretty(&dataset)?);
            Ok(true)
        }
        PipelineOutcome::Halted { stage, error } => {
            println!("\n💥 Pipeline halted at {}: {}", stage, error);
            Ok(false)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let _guard = init_logging();
    if init_metrics() {
        info!("Prometheus metrics exporter installed");
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { manifest, no_autofill } => {
            let services = build_services(&cli.config)?;
            if services.gateway.is_fallback_only() {
                warn!("Running with local heuristics only");
            }
            if !run_manifest(services, &manifest, !no_autofill).await? {
                error!("Pipeline did not publish");
                anyhow::bail!("pipeline halted before publishing");
            }
        }
        Commands::Detect { description, files } => {
            let services = build_services(&cli.config)?;
            let files: Vec<FileRecord> = files.into_iter().map(|name| FileRecord::guessed(name, 0)).collect();
            let detection = services.gateway.detect_or_fallback(&description, &files).await;
            println!("{}", serde_json::to_string_pretty(&detection)?);
        }
        Commands::Search {
            query,
            robot,
            sensor,
            min_quality,
            with_samples,
        } => {
            let services = build_services(&cli.config)?;
            let search = SearchUseCase::new(load_catalog(&services.store, with_samples).await?);
            let filters = SearchFilters {
                robot,
                sensor,
                min_quality,
            };
            let results = if filters == SearchFilters::default() {
                search.search(&query).await
            } else {
                search.filtered_search(&query, &filters).await
            };

            println!("🔍 {} result(s)", results.len());
            for dataset in &results {
                let score = dataset
                    .overall_score()
                    .map(|s| format!("{s}%"))
                    .unwrap_or_else(|| "n/a".to_string());
                println!(
                    "   - {} [{}] robot: {} | sensors: {} | quality: {} | tags: {}",
                    dataset.info.title,
                    dataset.id,
                    dataset.info.robot_model,
                    dataset.info.sensors,
                    score,
                    dataset.content_tags().join(", ")
                );
            }
        }
        Commands::Profile { with_samples } => {
            let services = build_services(&cli.config)?;
            let search = SearchUseCase::new(load_catalog(&services.store, with_samples).await?);
            let summary = search.profile().await;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
