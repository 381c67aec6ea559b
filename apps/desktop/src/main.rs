use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use backend::LocalBackend;
use clap::{Parser, Subcommand};
use client_core::{waypoint_kind, Registries, SyncClient, SyncEvent};
use shared::{
    domain::{PathId, WaypointId},
    protocol::{FieldValue, WaypointUpdate},
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, prepare_database_url};

#[derive(Parser, Debug)]
struct Args {
    /// Settings file; defaults to ./pathsync.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    database_url: Option<String>,
    #[arg(long)]
    log_filter: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a path's waypoints in traversal order.
    Show {
        #[arg(long, default_value_t = 1)]
        path: i64,
        #[arg(long)]
        json: bool,
    },
    /// Build a small path with two clients editing it concurrently.
    Demo {
        #[arg(long, default_value_t = 1)]
        path: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(url) = args.database_url {
        settings.database_url = url;
    }
    if let Some(filter) = args.log_filter {
        settings.log_filter = filter;
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&settings.log_filter))
        .init();

    let database_url = prepare_database_url(&settings.database_url)?;
    let backend = Arc::new(
        LocalBackend::open(&database_url, settings.notification_capacity)
            .await
            .with_context(|| format!("failed to open database '{database_url}'"))?,
    );
    backend.storage().health_check().await?;
    info!(%database_url, "backend ready");

    match args.command {
        Command::Show { path, json } => show(backend, PathId(path), json).await,
        Command::Demo { path } => demo(backend, PathId(path)).await,
    }
}

async fn show(backend: Arc<LocalBackend>, path_id: PathId, json: bool) -> Result<()> {
    let (client, tasks) = SyncClient::start(backend, Registries::new());
    client.set_active_path(path_id);
    let order = client.active_path_order().await?;

    if json {
        let waypoints: Vec<_> = order
            .get()
            .into_iter()
            .filter_map(|id| client.snapshot(id))
            .collect();
        println!("{}", serde_json::to_string_pretty(&waypoints)?);
    } else {
        print_path(&client, path_id).await?;
    }

    tasks.abort();
    Ok(())
}

async fn demo(backend: Arc<LocalBackend>, path_id: PathId) -> Result<()> {
    let (editor, editor_tasks) = SyncClient::start(backend.clone(), Registries::new());
    let (viewer, viewer_tasks) = SyncClient::start(backend, Registries::new());
    let mut diagnostics = viewer.subscribe_events();
    tokio::spawn(async move {
        while let Ok(event) = diagnostics.recv().await {
            match event {
                SyncEvent::Materialized { id } => debug!(wpt_id = id.0, "viewer materialized waypoint"),
                other => warn!(event = ?other, "sync problem"),
            }
        }
    });

    let viewer_order = viewer.path_order(path_id).await?;
    let _order_log = viewer_order.subscribe(move |ids: &Vec<WaypointId>| {
        info!(path_id = path_id.0, len = ids.len(), "viewer saw new path order");
    });

    let start = editor
        .add_path_waypoint(path_id, WaypointUpdate::default())
        .await?;
    let guess = editor
        .add_path_waypoint(
            path_id,
            WaypointUpdate::default()
                .with(FieldValue::X(2.0))
                .with(FieldValue::Y(1.0))
                .with(FieldValue::IsInitialGuess(true)),
        )
        .await?;
    let end = editor
        .add_path_waypoint(
            path_id,
            WaypointUpdate::default()
                .with(FieldValue::X(4.0))
                .with(FieldValue::HeadingConstrained(false)),
        )
        .await?;

    wait_until(|| viewer_order.contains(end)).await?;
    let end_kind = viewer
        .store(end)
        .map(|store| waypoint_kind(&store))
        .context("viewer has no store for the last waypoint")?;
    let _kind_log = end_kind.subscribe(move |kind| {
        info!(wpt_id = end.0, kind = kind.display_name(), "viewer reclassified waypoint");
    });

    if let Some(store) = editor.store(start) {
        store.heading.set(1.57);
        store.control_interval_count.update(|count| count / 2);
    }
    if let Some(store) = editor.store(end) {
        store.translation_constrained.set(false);
    }

    wait_until(|| viewer.snapshot(start).map(|w| w.heading) == Some(1.57)).await?;
    wait_until(|| viewer.snapshot(end).map(|w| w.translation_constrained) == Some(false)).await?;
    println!("guess point {guess} sits between {start} and {end}");
    print_path(&viewer, path_id).await?;

    editor_tasks.abort();
    viewer_tasks.abort();
    Ok(())
}

async fn print_path(client: &SyncClient, path_id: PathId) -> Result<()> {
    let order = client.path_order(path_id).await?;
    let summary = client.path_summary(&order);
    println!("path {path_id}: {} waypoint(s)", order.len());
    for (index, (id, kind)) in summary.kinds.iter().enumerate() {
        if let Some(w) = client.snapshot(*id) {
            println!(
                "  {index:>2}. #{id} {:<20} x={:.2} y={:.2} heading={:.2} intervals={}",
                kind.display_name(),
                w.x,
                w.y,
                w.heading,
                w.control_interval_count
            );
        }
    }
    println!(
        "  segments: {:?}, ready for generation: {}",
        summary.control_interval_counts,
        summary.is_generation_ready()
    );
    Ok(())
}

async fn wait_until(mut check: impl FnMut() -> bool) -> Result<()> {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .context("timed out waiting for the viewer to catch up")
}
