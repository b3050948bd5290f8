use auto_market::config::{Command, ListingAction, RecordKind};
use auto_market::core::codec;
use auto_market::domain::{Listing, Message, SystemClock, User, Vehicle, VehicleHistory};
use auto_market::utils::error::ErrorSeverity;
use auto_market::utils::{logger, validation::Validate};
use auto_market::{
    CliConfig, FileSnapshotRepository, LocalStorage, MarketConfig, MarketError, MarketService,
};
use clap::Parser;
use std::path::{Path, PathBuf};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting auto-market CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match MarketConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => exit_with(e),
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        exit_with(e);
    }

    let result = match cli.command {
        Command::Check { snapshot, lenient } => run_check(&config, snapshot, lenient).await,
        Command::Export { snapshot, out } => run_export(&config, snapshot, out).await,
        Command::Listing { action, id, snapshot } => run_listing(&config, snapshot, action, &id).await,
        Command::Normalize { kind, input, out } => run_normalize(kind, &input, out).await,
    };

    match result {
        Ok(code) => {
            if code != 0 {
                std::process::exit(code);
            }
        }
        Err(e) => exit_with(e),
    }

    Ok(())
}

/// 快照路徑拆成 (目錄, 檔名)，供 LocalStorage 使用
fn snapshot_location(config: &MarketConfig, snapshot: Option<String>) -> (String, String) {
    let path = snapshot
        .map(PathBuf::from)
        .unwrap_or_else(|| config.snapshot_path());
    let dir = path
        .parent()
        .map(|p| p.to_string_lossy().to_string())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| ".".to_string());
    let file = path
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_else(|| config.storage.snapshot_file.clone());
    (dir, file)
}

fn service(
    config: &MarketConfig,
    snapshot: Option<String>,
    export_dir: String,
    lenient: bool,
) -> MarketService<FileSnapshotRepository<LocalStorage, SystemClock>, LocalStorage> {
    let (dir, file) = snapshot_location(config, snapshot);
    tracing::info!("📁 Snapshot: {}", Path::new(&dir).join(&file).display());

    let repository = FileSnapshotRepository::new(LocalStorage::new(dir), SystemClock, file);
    let mut options = config.integrity_options();
    if lenient {
        options.strict_references = false;
    }

    MarketService::new(repository, LocalStorage::new(export_dir), options)
        .with_bundle_name(config.export.bundle_name.clone())
}

async fn run_check(
    config: &MarketConfig,
    snapshot: Option<String>,
    lenient: bool,
) -> Result<i32, MarketError> {
    let service = service(config, snapshot, config.export_dir().to_string(), lenient);
    let outcome = service.check().await?;

    println!(
        "📋 {} users, {} vehicles, {} listings, {} messages, {} histories",
        outcome.summary.users,
        outcome.summary.vehicles,
        outcome.summary.listings,
        outcome.summary.messages,
        outcome.summary.histories
    );
    for issue in &outcome.report.issues {
        println!("  {}", issue);
    }

    if outcome.report.has_errors() {
        println!(
            "❌ {} errors, {} warnings",
            outcome.report.error_count(),
            outcome.report.warning_count()
        );
        Ok(1)
    } else {
        println!(
            "✅ No errors ({} warnings)",
            outcome.report.warning_count()
        );
        Ok(0)
    }
}

async fn run_export(
    config: &MarketConfig,
    snapshot: Option<String>,
    out: Option<String>,
) -> Result<i32, MarketError> {
    let export_dir = out.unwrap_or_else(|| config.export_dir().to_string());
    let service = service(config, snapshot, export_dir.clone(), false);
    let bundle = service.export().await?;

    let full_path = Path::new(&export_dir).join(bundle);
    tracing::info!("✅ Export completed successfully!");
    println!("📁 Output saved to: {}", full_path.display());
    Ok(0)
}

async fn run_listing(
    config: &MarketConfig,
    snapshot: Option<String>,
    action: ListingAction,
    id: &str,
) -> Result<i32, MarketError> {
    let service = service(config, snapshot, config.export_dir().to_string(), false);
    let listing = service
        .set_listing_status(&id.into(), action.target_status())
        .await?;

    println!(
        "✅ Listing {} ({}) is now {}",
        listing.id,
        listing.vehicle.title(),
        listing.status
    );
    Ok(0)
}

async fn run_normalize(kind: RecordKind, input: &str, out: Option<String>) -> Result<i32, MarketError> {
    let text = tokio::fs::read_to_string(input).await?;
    let clock = SystemClock;

    let normalized = match kind {
        RecordKind::User => codec::normalize_lines::<User>(&text, &clock)?,
        RecordKind::Vehicle => codec::normalize_lines::<Vehicle>(&text, &clock)?,
        RecordKind::Listing => codec::normalize_lines::<Listing>(&text, &clock)?,
        RecordKind::Message => codec::normalize_lines::<Message>(&text, &clock)?,
        RecordKind::History => codec::normalize_lines::<VehicleHistory>(&text, &clock)?,
    };

    match out {
        Some(path) => {
            tokio::fs::write(&path, normalized.as_bytes()).await?;
            tracing::info!("✅ Normalized {} records written to {}", normalized.lines().count(), path);
        }
        None => print!("{}", normalized),
    }
    Ok(0)
}

fn exit_with(e: MarketError) -> ! {
    tracing::error!(
        "❌ auto-market failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 依錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code)
}

