//! # Workspace watching
//!
//! [WorkspaceWatcher] turns filesystem changes under a directory into change notifications.
//! Events are debounced by `notify-debouncer-full`, paths inside hidden directories (or hidden
//! files) are dropped, and whatever remains is handed to a callback. The usual callback is
//! [WorkspaceWatcher::for_session], which forwards a [SessionMessage::WorkspaceChanged] into a
//! [GraphSession](crate::session::GraphSession) so the graph is resynthesized.
//!
//! The callback runs on the debouncer's thread. It must not block for long; enqueueing a
//! session message is the intended amount of work.

use notify_debouncer_full::{
    new_debouncer,
    notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher},
    DebounceEventResult, Debouncer, FileIdMap,
};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    error::NotegraphError,
    paths::{has_hidden_segment, os_path_to_string},
    session::{SessionHandle, SessionMessage},
};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

type WorkspaceDebouncer = Debouncer<RecommendedWatcher, FileIdMap>;

/// Keep the changed paths that are not hidden relative to `root`.
pub fn relevant_paths<'a, I>(paths: I, root: &Path, hidden_prefix: char) -> Vec<PathBuf>
where
    I: IntoIterator<Item = &'a PathBuf>,
{
    paths
        .into_iter()
        .filter(|path| {
            let relative = path.strip_prefix(root).unwrap_or(path.as_path());
            !has_hidden_segment(&os_path_to_string(relative), hidden_prefix)
        })
        .cloned()
        .collect()
}

pub struct WorkspaceWatcher {
    debouncer: WorkspaceDebouncer,
    root: PathBuf,
}

impl WorkspaceWatcher {
    /// Watch `root` recursively, calling `on_change` with each debounced batch of relevant
    /// paths.
    pub fn new<F>(
        root: PathBuf,
        debounce: Duration,
        hidden_prefix: char,
        on_change: F,
    ) -> Result<Self, NotegraphError>
    where
        F: Fn(Vec<PathBuf>) + Send + 'static,
    {
        let watch_root = root.clone();
        let mut debouncer = new_debouncer(debounce, None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    let changed = events
                        .iter()
                        .filter(|event| {
                            matches!(
                                event.event.kind,
                                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                            )
                        })
                        .flat_map(|event| event.paths.iter())
                        .collect::<Vec<_>>();
                    let relevant = relevant_paths(changed, &watch_root, hidden_prefix);
                    if !relevant.is_empty() {
                        tracing::info!("[WorkspaceWatcher] {} path(s) changed", relevant.len());
                        on_change(relevant);
                    }
                }
                Err(errors) => {
                    tracing::error!("Notify debouncer returned errors: {:?}", errors);
                }
            }
        })?;
        debouncer.watcher().watch(&root, RecursiveMode::Recursive)?;
        tracing::debug!("[WorkspaceWatcher] watching {:?}", root);
        Ok(WorkspaceWatcher { debouncer, root })
    }

    /// Watch `root` and notify the session behind `handle` of every relevant change.
    pub fn for_session(
        root: PathBuf,
        handle: SessionHandle,
        hidden_prefix: char,
    ) -> Result<Self, NotegraphError> {
        WorkspaceWatcher::new(root, DEFAULT_DEBOUNCE, hidden_prefix, move |paths| {
            tracing::debug!("[WorkspaceWatcher] notifying session about {:?}", paths);
            if let Err(e) = handle.send(SessionMessage::WorkspaceChanged) {
                tracing::debug!("[WorkspaceWatcher] session no longer accepts changes: {e}");
            }
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stop watching.
    pub fn unwatch(mut self) -> Result<(), NotegraphError> {
        let res = self.debouncer.watcher().unwatch(&self.root);
        tracing::debug!("Unwatch_res(path: {:?}) = {:?}", self.root, res);
        Ok(res?)
    }
}
