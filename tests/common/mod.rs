//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use notegraph::{
    config::GraphConfig,
    snapshot::GraphSnapshot,
    synthesis::GraphSynthesizer,
    workspace::{Connection, MemoryWorkspace, Note},
};
use std::path::PathBuf;
use tempfile::TempDir;

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times; subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// `/ws` with a root `README.md` and `a/note1.md`, which is tagged `project` and links to the
/// not yet created `a/note2.md`.
#[allow(dead_code)]
pub fn readme_workspace() -> MemoryWorkspace {
    let workspace = MemoryWorkspace::new("/ws");
    workspace.insert_note(Note::new("/ws/README.md").with_title("Home"));
    workspace.insert_note(
        Note::new("/ws/a/note1.md")
            .with_title("Note One")
            .with_tags(["project"]),
    );
    workspace.connect(Connection::to_placeholder("/ws/a/note1.md", "/ws/a/note2.md"));
    workspace
}

/// `/ws/sub` holds two notes and no index document.
#[allow(dead_code)]
pub fn untitled_folder_workspace() -> MemoryWorkspace {
    let workspace = MemoryWorkspace::new("/ws");
    workspace.insert_note(Note::new("/ws/sub/one.md"));
    workspace.insert_note(Note::new("/ws/sub/two.md"));
    workspace
}

#[allow(dead_code)]
pub async fn synthesize(workspace: &MemoryWorkspace, config: GraphConfig) -> GraphSnapshot {
    let synthesizer = GraphSynthesizer::new(config);
    let exclude = synthesizer.default_exclude();
    synthesizer
        .synthesize(workspace, &exclude)
        .await
        .expect("synthesis succeeds")
}

/// Write `content` as a manifest file inside a fresh temp dir.
#[allow(dead_code)]
pub fn write_manifest(temp_dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = temp_dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}
