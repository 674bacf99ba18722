//! # notegraph
//!
//! Derives a navigable knowledge graph from a workspace of interlinked notes and keeps a
//! render-ready, filterable, highlightable view model of that graph in sync as the workspace
//! changes.
//!
//! ## Overview
//!
//! The workspace itself (parsing documents, extracting links, tags and properties) belongs to
//! the host and is reached through the [`workspace::WorkspaceSource`] trait. From its notes and
//! connections notegraph builds a [`snapshot::GraphSnapshot`] with four kinds of nodes:
//!
//! - **notes**, one per workspace resource, keyed by path;
//! - **placeholders** for link targets that have no note yet;
//! - **folders**, synthesized for directories that have no index document (`README.md` or
//!   `index.md`; a directory with one is represented by that note);
//! - **tags**, one per tag label.
//!
//! and three kinds of edges: `reference` (explicit links), `structural` (folder hierarchy) and
//! `tag` (note to tag).
//!
//! A panel displaying the graph owns a [`view::RenderState`]. Each new snapshot is reconciled
//! against the nodes already on screen, so only real additions and removals reach the layout
//! engine. Hover, selection and type filters derive a [`highlight::DisplayState`] per node and
//! link. The [`painter::Painter`] batches the frame's draw calls by colour.
//!
//! ## Architecture
//!
//! - **[`nodeid`]**, **[`properties`]**: node identity and the closed kind vocabularies
//! - **[`identity`]**, **[`synthesis`]**: folder/tag identity and the synthesis pass
//! - **[`diff`]**, **[`highlight`]**, **[`view`]**: the incremental view model
//! - **[`style`]**, **[`painter`]**: decoration and draw batching
//! - **[`session`]**, **[`event`]**: the per-panel event loop and its message protocol
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use notegraph::{
//!     config::GraphConfig,
//!     synthesis::GraphSynthesizer,
//!     view::RenderState,
//!     workspace::MemoryWorkspace,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let workspace = MemoryWorkspace::open("workspace.toml")?;
//!     let config = GraphConfig::default();
//!     let synthesizer = GraphSynthesizer::new(config.clone());
//!     let snapshot = synthesizer
//!         .synthesize(&workspace, &synthesizer.default_exclude())
//!         .await?;
//!
//!     let mut state = RenderState::new(config.graph_style(), config.index_names.clone());
//!     let delta = state.refresh(snapshot);
//!     println!("{}", serde_json::to_string_pretty(&delta)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **default**: synthesis, view model and session
//! - **service**: filesystem watching ([`watch`])
//! - **bin**: the `notegraph` CLI

pub mod config;
pub mod diff;
pub mod error;
pub mod event;
pub mod highlight;
pub mod identity;
pub mod nodeid;
pub mod painter;
pub mod paths;
pub mod properties;
pub mod session;
pub mod snapshot;
pub mod style;
pub mod synthesis;
pub mod view;
#[cfg(all(feature = "service", not(target_arch = "wasm32")))]
pub mod watch;
pub mod workspace;

pub use error::*;
