//! notegraph CLI tool
//!
//! Command-line interface over a workspace manifest (the serialized output of a note model).
//!
//! ## Commands
//!
//! - `snapshot <manifest>`: synthesize the graph once and print its `{nodeInfo, links}` JSON
//! - `render <manifest>`: reconcile the graph into a render state and print the render update
//! - `watch <manifest>` (feature `service`): resynthesize whenever the manifest changes and
//!   stream panel events as JSON lines

use clap::{Parser, Subcommand};
use notegraph::{
    config::{GraphConfig, GraphConfigProvider, TomlConfigProvider},
    event::RenderUpdate,
    properties::TypeLabel,
    synthesis::GraphSynthesizer,
    view::RenderState,
    workspace::MemoryWorkspace,
    NotegraphError,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "notegraph")]
#[command(author, version, about = "Build and inspect knowledge graphs of note workspaces", long_about = None)]
struct Cli {
    /// Configuration file path (TOML, `[graph]` section)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize the graph once and print it
    Snapshot {
        /// Workspace manifest (TOML or JSON)
        manifest: PathBuf,

        /// Pretty-print the JSON output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Reconcile the graph into a render state and print the resulting update
    Render {
        /// Workspace manifest (TOML or JSON)
        manifest: PathBuf,

        /// Type labels to hide (repeatable)
        #[arg(long = "hide")]
        hide: Vec<String>,

        /// Wire id of a node to select
        #[arg(long)]
        select: Option<String>,

        /// Wire id of a node to hover
        #[arg(long)]
        hover: Option<String>,

        /// Pretty-print the JSON output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Watch a manifest for changes and stream panel events
    #[cfg(feature = "service")]
    Watch {
        /// Workspace manifest (TOML or JSON)
        manifest: PathBuf,
    },
}

fn load_config(path: Option<&Path>) -> Result<GraphConfig, NotegraphError> {
    match path {
        Some(path) => TomlConfigProvider::new(path.to_path_buf()).get_config(),
        None => Ok(GraphConfig::default()),
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<(), NotegraphError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match cli.command {
        Commands::Snapshot { manifest, pretty } => {
            let workspace = MemoryWorkspace::open(&manifest)?;
            let synthesizer = GraphSynthesizer::new(config);
            let exclude = synthesizer.default_exclude();
            let snapshot = runtime.block_on(synthesizer.synthesize(&workspace, &exclude))?;
            print_json(&snapshot.to_graph_data(), pretty)?;
            Ok(())
        }

        Commands::Render {
            manifest,
            hide,
            select,
            hover,
            pretty,
        } => {
            let workspace = MemoryWorkspace::open(&manifest)?;
            let synthesizer = GraphSynthesizer::new(config.clone());
            let exclude = synthesizer.default_exclude();
            let snapshot = runtime.block_on(synthesizer.synthesize(&workspace, &exclude))?;

            let mut state = RenderState::new(config.graph_style(), config.index_names.clone());
            state.refresh(snapshot);
            for label in hide {
                state.set_type_visible(TypeLabel::new(label), false);
            }
            // Report the full live set as additions against an empty panel.
            let delta = notegraph::diff::RenderDelta {
                nodes_to_add: state.live_nodes().to_vec(),
                nodes_to_remove: Vec::new(),
                live_links: state.live_links().to_vec(),
            };
            if let Some(wire) = select {
                let node = state.resolve(&wire);
                if node.is_none() {
                    tracing::warn!("No node {wire} to select");
                }
                state.select(node, false);
            }
            if let Some(wire) = hover {
                let node = state.resolve(&wire);
                state.hover(node);
            }
            let update = RenderUpdate {
                delta,
                decoration: state.decoration(),
            };
            print_json(&update, pretty)?;
            Ok(())
        }

        #[cfg(feature = "service")]
        Commands::Watch { manifest } => watch(runtime, manifest, config),
    }
}

#[cfg(feature = "service")]
fn watch(
    runtime: tokio::runtime::Runtime,
    manifest: PathBuf,
    config: GraphConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    use notegraph::{event::ViewRequest, session::GraphSession, watch::WorkspaceWatcher};
    use std::sync::Arc;

    let workspace = Arc::new(MemoryWorkspace::open(&manifest)?);
    let hidden_prefix = config.hidden_prefix;
    let (handle, session, mut events) = GraphSession::open(workspace.clone(), config);
    let session_task = runtime.spawn(session.run());

    let watch_dir = manifest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or(std::env::current_dir()?);
    let watched_manifest = manifest.clone();
    let change_handle = handle.clone();
    let watcher = WorkspaceWatcher::new(
        watch_dir,
        notegraph::watch::DEFAULT_DEBOUNCE,
        hidden_prefix,
        move |paths| {
            if !paths.iter().any(|p| p.ends_with(&watched_manifest)) {
                return;
            }
            match workspace.reload() {
                Ok(()) => {
                    if let Err(e) = change_handle.workspace_changed() {
                        tracing::debug!("Session no longer accepts changes: {e}");
                    }
                }
                Err(e) => tracing::error!("Could not reload {:?}: {e}", watched_manifest),
            }
        },
    )?;

    let close_handle = handle.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nShutting down...");
        close_handle.close();
    })?;

    handle.request(ViewRequest::WebviewDidLoad)?;
    eprintln!(
        "Watching {} for changes. Press Ctrl-C to stop.",
        manifest.display()
    );

    runtime.block_on(async {
        while let Some(event) = events.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => println!("{json}"),
                Err(e) => tracing::error!("Could not serialize {event}: {e}"),
            }
        }
    });
    runtime.block_on(session_task)??;
    watcher.unwatch()?;
    eprintln!("Shutdown complete");
    Ok(())
}
