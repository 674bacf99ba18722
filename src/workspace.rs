//! The note/workspace collaborator contract.
//!
//! Parsing documents and extracting links, tags and properties is owned by the host. The graph
//! core only consumes the results through [WorkspaceSource]. [MemoryWorkspace] is an in-memory
//! source, loadable from a TOML or JSON manifest, used by the CLI and the tests.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{
    collections::BTreeMap,
    fs::read_to_string,
    future::Future,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{error::NotegraphError, paths, properties::NOTE_LABEL};

fn default_resource_type() -> String {
    NOTE_LABEL.to_string()
}

/// A resource in the workspace, as produced by the host's note model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// URI path of the resource; also its identity.
    pub path: String,
    /// Declared title (heading, front matter, ...).
    #[serde(default)]
    pub title: Option<String>,
    /// Resource type as reported by the note model: `note` for documents, otherwise e.g.
    /// `image` or `attachment`.
    #[serde(default = "default_resource_type", rename = "type")]
    pub resource_type: String,
    /// Arbitrary note metadata (front matter). Values may be `null`.
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Note {
    pub fn new<S: Into<String>>(path: S) -> Self {
        Note {
            path: path.into(),
            resource_type: default_resource_type(),
            ..Default::default()
        }
    }

    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_property<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_resource_type<S: Into<String>>(mut self, resource_type: S) -> Self {
        self.resource_type = resource_type.into();
        self
    }

    pub fn is_document(&self) -> bool {
        self.resource_type == NOTE_LABEL
    }

    /// The display title before truncation. Documents use their declared title with the file
    /// name as fallback; other resources always use the file name.
    pub fn display_title(&self) -> String {
        match &self.title {
            Some(title) if self.is_document() && !title.trim().is_empty() => title.clone(),
            _ => paths::basename(&self.path).to_string(),
        }
    }
}

/// An explicit link between two resource identities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub source: String,
    pub target: String,
    /// Set when the source does not resolve to an existing note.
    #[serde(default)]
    pub source_is_placeholder: bool,
    /// Set when the target does not resolve to an existing note (a link to a note not yet
    /// created).
    #[serde(default)]
    pub target_is_placeholder: bool,
}

impl Connection {
    pub fn new<S: Into<String>, T: Into<String>>(source: S, target: T) -> Self {
        Connection {
            source: source.into(),
            target: target.into(),
            ..Default::default()
        }
    }

    pub fn to_placeholder<S: Into<String>, T: Into<String>>(source: S, target: T) -> Self {
        Connection {
            target_is_placeholder: true,
            ..Connection::new(source, target)
        }
    }
}

/// Source of notes and connections for graph synthesis.
///
/// Calls may be served asynchronously by the host; the synthesizer awaits each one in turn and
/// never issues two resolutions concurrently.
pub trait WorkspaceSource: Sync {
    /// The workspace root path, if one can be determined.
    fn root(&self) -> Option<String>;

    /// Display name for the workspace root folder node.
    fn root_name(&self) -> Option<String> {
        None
    }

    fn list_notes(&self) -> impl Future<Output = Result<Vec<Note>, NotegraphError>> + Send;

    fn list_connections(
        &self,
    ) -> impl Future<Output = Result<Vec<Connection>, NotegraphError>> + Send;

    /// Look up a single resource. `Ok(None)` is the normal outcome for a missing resource.
    fn lookup(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Option<Note>, NotegraphError>> + Send;
}

impl<W: WorkspaceSource + Send + Sync> WorkspaceSource for Arc<W> {
    fn root(&self) -> Option<String> {
        self.as_ref().root()
    }

    fn root_name(&self) -> Option<String> {
        self.as_ref().root_name()
    }

    fn list_notes(&self) -> impl Future<Output = Result<Vec<Note>, NotegraphError>> + Send {
        self.as_ref().list_notes()
    }

    fn list_connections(
        &self,
    ) -> impl Future<Output = Result<Vec<Connection>, NotegraphError>> + Send {
        self.as_ref().list_connections()
    }

    fn lookup(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Option<Note>, NotegraphError>> + Send {
        self.as_ref().lookup(path)
    }
}

/// On-disk description of a workspace: the output of a note model, serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceManifest {
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl WorkspaceManifest {
    /// Read a manifest, choosing the format by file extension (`.json`, otherwise TOML).
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, NotegraphError> {
        tracing::debug!("Reading workspace manifest {:?}", path.as_ref());
        let content = read_to_string(path.as_ref())?;
        let is_json = path
            .as_ref()
            .extension()
            .map(|ext| ext == "json")
            .unwrap_or(false);
        if is_json {
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(toml::from_str(&content)?)
        }
    }
}

#[derive(Debug, Default)]
struct WorkspaceState {
    root: Option<String>,
    name: Option<String>,
    notes: BTreeMap<String, Note>,
    connections: Vec<Connection>,
}

/// In-memory [WorkspaceSource]. Mutations are visible to the next synthesis pass; pair them
/// with a change notification to the session.
#[derive(Debug, Default)]
pub struct MemoryWorkspace {
    state: RwLock<WorkspaceState>,
    manifest_path: Option<PathBuf>,
}

impl MemoryWorkspace {
    pub fn new<S: Into<String>>(root: S) -> Self {
        MemoryWorkspace {
            state: RwLock::new(WorkspaceState {
                root: Some(paths::normalize(&root.into())),
                ..Default::default()
            }),
            manifest_path: None,
        }
    }

    /// A workspace without a root folder.
    pub fn rootless() -> Self {
        MemoryWorkspace::default()
    }

    pub fn from_manifest(manifest: WorkspaceManifest) -> Self {
        let workspace = MemoryWorkspace::default();
        workspace.replace(manifest);
        workspace
    }

    /// Load a manifest file and remember its location for [MemoryWorkspace::reload].
    pub fn open<P: AsRef<Path>>(manifest_path: P) -> Result<Self, NotegraphError> {
        let manifest = WorkspaceManifest::from_path(manifest_path.as_ref())?;
        let mut workspace = MemoryWorkspace::from_manifest(manifest);
        workspace.manifest_path = Some(manifest_path.as_ref().to_path_buf());
        Ok(workspace)
    }

    pub fn manifest_path(&self) -> Option<&Path> {
        self.manifest_path.as_deref()
    }

    /// Re-read the manifest this workspace was opened from.
    pub fn reload(&self) -> Result<(), NotegraphError> {
        let Some(path) = self.manifest_path.as_ref() else {
            return Err(NotegraphError::Workspace(
                "workspace was not opened from a manifest".to_string(),
            ));
        };
        let manifest = WorkspaceManifest::from_path(path)?;
        self.replace(manifest);
        Ok(())
    }

    /// Replace the whole workspace content.
    pub fn replace(&self, manifest: WorkspaceManifest) {
        let mut state = self.state.write();
        state.root = manifest.root.as_deref().map(paths::normalize);
        state.name = manifest.name;
        state.notes = manifest
            .notes
            .into_iter()
            .map(|note| (note.path.clone(), note))
            .collect();
        state.connections = manifest.connections;
    }

    pub fn insert_note(&self, note: Note) {
        self.state.write().notes.insert(note.path.clone(), note);
    }

    pub fn remove_note(&self, path: &str) -> Option<Note> {
        let mut state = self.state.write();
        state
            .connections
            .retain(|c| c.source != path && c.target != path);
        state.notes.remove(path)
    }

    pub fn connect(&self, connection: Connection) {
        self.state.write().connections.push(connection);
    }

    pub fn set_name<S: Into<String>>(&self, name: S) {
        self.state.write().name = Some(name.into());
    }

    pub fn note_count(&self) -> usize {
        self.state.read().notes.len()
    }
}

impl WorkspaceSource for MemoryWorkspace {
    fn root(&self) -> Option<String> {
        self.state.read().root.clone()
    }

    fn root_name(&self) -> Option<String> {
        self.state.read().name.clone()
    }

    fn list_notes(&self) -> impl Future<Output = Result<Vec<Note>, NotegraphError>> + Send {
        let notes = self.state.read().notes.values().cloned().collect();
        async { Ok(notes) }
    }

    fn list_connections(
        &self,
    ) -> impl Future<Output = Result<Vec<Connection>, NotegraphError>> + Send {
        let connections = self.state.read().connections.clone();
        async { Ok(connections) }
    }

    fn lookup(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Option<Note>, NotegraphError>> + Send {
        let note = self.state.read().notes.get(path).cloned();
        async { Ok(note) }
    }
}
