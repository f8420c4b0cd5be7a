//! upkit binary - composition root.
//!
//! 1. Load configuration from TOML
//! 2. Resolve upload options (flags > env > config)
//! 3. Build the orchestrator with the HTTP adapter and size hook
//! 4. Gather files from the given paths and submit them
//! 5. Print progress as events arrive, then a final table and summary

mod cli;
mod render;

use std::sync::Arc;

use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use upkit_core::config::UpkitConfig;
use upkit_core::events::UploadEvent;
use upkit_upload::{
    AcceptFilter, CallbackObserver, HttpTransfer, MaxSizeHook, PathIntake, UploadOrchestrator,
};

use crate::cli::CliArgs;
use crate::render::Summary;

fn init_tracing(explicit: Option<&str>, config_level: &str) {
    let filter = match explicit {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config_level)),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_event(orch: &UploadOrchestrator, event: &UploadEvent) {
    let record = orch.get(event.id());
    if let Some(line) = render::event_line(event, record.as_ref()) {
        println!("{}", line);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config is read before tracing so its log level can apply.
    let config_file = args.resolve_config_path();
    let loaded = UpkitConfig::load(&config_file);
    let config = loaded.as_ref().ok().cloned().unwrap_or_default();

    init_tracing(args.resolve_log_level().as_deref(), &config.general.log_level);
    tracing::info!("Starting upkit v{}", env!("CARGO_PKG_VERSION"));
    match &loaded {
        Ok(_) => tracing::info!(path = %config_file.display(), "Configuration loaded"),
        Err(e) if config_file.exists() => {
            tracing::warn!(path = %config_file.display(), error = %e, "Invalid config, using defaults")
        }
        Err(_) => tracing::debug!(path = %config_file.display(), "No config file, using defaults"),
    }

    // Orchestrator.
    let options = args.resolve_options(&config.upload);
    let observer = CallbackObserver::new()
        .on_success(|response, file| {
            tracing::debug!(file = %file.name, status = response.status, body = %response.body, "Server response");
        })
        .on_remove(|record| {
            tracing::debug!(file = %record.name, "Record removed");
        });
    let mut builder = UploadOrchestrator::builder(options)
        .adapter(Arc::new(HttpTransfer::new()?))
        .observer(Arc::new(observer));
    if let Some(max) = args.resolve_max_size(config.upload.max_file_size) {
        tracing::info!(max_bytes = max, "Size limit enabled");
        builder = builder.before_upload(Arc::new(MaxSizeHook::new(max)));
    }
    let orch = builder.build()?;

    // Intake.
    let report = PathIntake::new().collect(&args.paths).await;
    for (path, e) in &report.skipped {
        eprintln!("skipped {}: {}", path.display(), e);
    }
    let mut files = report.files;
    if !orch.options().multiple && files.len() > 1 {
        tracing::warn!(count = files.len(), "Multiple files disabled, uploading only the first");
        files.truncate(1);
    }
    let accept = AcceptFilter::parse(&orch.options().accept);
    for file in files.iter().filter(|f| !accept.matches(f)) {
        tracing::warn!(file = %file.name, accept = %accept, "File does not match accept filter");
    }
    if files.is_empty() {
        eprintln!("no files to upload");
        std::process::exit(2);
    }

    // Upload.
    let mut events = orch.subscribe();
    let batch = orch.submit(files);
    let mut join = tokio::spawn(batch.join());
    let ids = loop {
        tokio::select! {
            biased;
            event = events.recv() => match event {
                Ok(event) => print_event(&orch, &event),
                Err(RecvError::Lagged(n)) => tracing::debug!(skipped = n, "Event printer lagged"),
                Err(RecvError::Closed) => break (&mut join).await?,
            },
            joined = &mut join => break joined?,
        }
    };
    while let Ok(event) = events.try_recv() {
        print_event(&orch, &event);
    }

    let records = orch.snapshot();
    let discarded = ids.iter().filter(|id| id.is_none()).count();
    let summary = Summary::of(&records, discarded + report.skipped.len());

    println!();
    print!("{}", render::render_table(&records));
    println!("{}", summary);

    if summary.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
