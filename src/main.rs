use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use nobg::cli::{Cli, Commands};
use nobg::config::Config;
use nobg::interactive::run_interactive;
use nobg::{DispatchEvent, HttpRemover, QueueCommand, Session};
use nobg_common::{ArtifactSlot, QueueStore, RecordId, RecordStatus};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load().context("failed to load config")?;

    match cli.command {
        Commands::Process { inputs, output, concurrency, crop, rotate, rotate_result, json } => {
            println!("🖼  nobg - background removal\n");

            let concurrency = concurrency.map_or_else(|| config.concurrency(), |c| c.max(1));
            let mut session = build_session(&config, cli.endpoint, concurrency)?;

            // 1. Load
            println!("[1/4] Loading images...");
            let ids = session.add_paths(&inputs).await?;
            println!("✔ {} image(s) queued\n", ids.len());

            // 2. Local edits
            if crop.is_some() || rotate % 4 != 0 {
                println!("[2/4] Editing images...");
                for &id in &ids {
                    if let Some(rect) = crop {
                        report_edit(id, session.execute(QueueCommand::Crop { id, rect }).await);
                    }
                    report_edit(id, session.rotate_turns(id, ArtifactSlot::Source, rotate).await);
                }
                println!("✔ Edits applied\n");
            } else {
                println!("[2/4] No edits\n");
            }

            // 3. Remove backgrounds
            println!("[3/4] Removing backgrounds ({} at a time)...", concurrency);
            let progress = ProgressBar::new(ids.len() as u64);
            progress.set_style(
                ProgressStyle::with_template("  {bar:30} {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            let bar = progress.clone();
            session.dispatcher_mut().set_observer(move |event| match event {
                DispatchEvent::Submitted { name, .. } => bar.set_message(name.clone()),
                DispatchEvent::Completed { .. }
                | DispatchEvent::Failed { .. }
                | DispatchEvent::Discarded { .. } => bar.inc(1),
            });
            let report = session.execute(QueueCommand::ProcessAll).await?;
            progress.finish_and_clear();
            if let nobg::CommandOutcome::Batch(report) = report {
                println!("✔ {} done, {} failed\n", report.succeeded, report.failed);
            }

            if rotate_result % 4 != 0 {
                let done: Vec<RecordId> = session
                    .snapshot()
                    .await
                    .into_iter()
                    .filter(|r| r.status == RecordStatus::Done)
                    .map(|r| r.id)
                    .collect();
                for id in done {
                    let rotated = session.rotate_turns(id, ArtifactSlot::Result, rotate_result).await;
                    report_edit(id, rotated);
                }
            }

            // 4. Save
            println!("[4/4] Saving results...");
            let saved = session.save_all_results(&output).await?;
            for path in &saved {
                println!("✔ {}", path.display());
            }

            let snapshot = session.snapshot().await;
            for record in snapshot.iter().filter(|r| r.status == RecordStatus::Error) {
                println!(
                    "✖ {}: {}",
                    record.display_name,
                    record.last_error.as_deref().unwrap_or("unknown error")
                );
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            }

            println!("\n✅ Finished");
        }

        Commands::Edit { inputs, output } => {
            let concurrency = config.concurrency();
            let session = build_session(&config, cli.endpoint, concurrency)?;

            let ids = session.add_paths(&inputs).await?;
            println!("✔ {} image(s) queued\n", ids.len());

            run_interactive(&session, &output)
                .await
                .context("interactive session failed")?;
        }

        Commands::Config { set_endpoint, set_concurrency, show } => {
            if let Some(endpoint) = set_endpoint {
                config.set_endpoint(endpoint)?;
                println!("✔ Endpoint saved");
            }

            if let Some(concurrency) = set_concurrency {
                config.set_concurrency(concurrency)?;
                println!("✔ Concurrency saved");
            }

            if show {
                println!("Settings:");
                println!("  Endpoint: {}", config.endpoint());
                println!("  Concurrency: {}", config.concurrency());
                println!("  Max crop size: {}x{}", config.max_crop_width, config.max_crop_height);
                println!("  Download prefix: {}", config.download_prefix);
                println!("  Timeout: {}s", config.timeout_seconds);
                println!("  File: {}", Config::config_path()?.display());
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn build_session(
    config: &Config,
    endpoint: Option<String>,
    concurrency: usize,
) -> Result<Session<HttpRemover>> {
    let endpoint = endpoint.unwrap_or_else(|| config.endpoint());
    let remover = HttpRemover::new(endpoint, Duration::from_secs(config.timeout_seconds))
        .context("failed to build HTTP client")?;
    let store = QueueStore::with_download_prefix(config.download_prefix.clone());
    Ok(Session::with_store(store, remover, concurrency, config.crop_bound()))
}

fn report_edit<T>(id: RecordId, result: nobg::Result<T>) {
    if let Err(e) = result {
        println!("⚠ {}: {}", id, e);
    }
}
