//! One visualization instance: a [RenderState] driven by a message queue.
//!
//! All interaction and change notifications arrive as [SessionMessage]s on an unbounded
//! channel and are handled strictly in order, so a synthesis pass (including reconcile) always
//! completes before the next message is looked at. Closing the session through its
//! [SessionHandle] raises a shared flag; a pass that completes after that point is discarded
//! instead of being applied.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::{
    config::GraphConfig,
    error::NotegraphError,
    event::{RenderUpdate, ViewEvent, ViewRequest},
    nodeid::NodeId,
    properties::{NodeKind, TypeLabel},
    synthesis::{Exclude, GraphSynthesizer},
    view::RenderState,
    workspace::WorkspaceSource,
};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionMessage {
    /// Something in the workspace changed; resynthesize from scratch.
    WorkspaceChanged,
    /// Hover target as a wire id, `None` when the pointer left all nodes.
    Hover(Option<String>),
    Select {
        node: Option<String>,
        append: bool,
    },
    SetTypeVisible {
        label: String,
        visible: bool,
    },
    /// The editor switched to the note at this path.
    ActiveNoteChanged(String),
    UpdateConfig(GraphConfig),
    Request(ViewRequest),
    Close,
}

/// Cloneable sender side of a [GraphSession].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: UnboundedSender<SessionMessage>,
    closed: Arc<AtomicBool>,
}

impl SessionHandle {
    pub fn send(&self, message: SessionMessage) -> Result<(), NotegraphError> {
        if self.is_closed() {
            return Err(NotegraphError::SessionClosed);
        }
        self.tx.send(message)?;
        Ok(())
    }

    pub fn workspace_changed(&self) -> Result<(), NotegraphError> {
        self.send(SessionMessage::WorkspaceChanged)
    }

    pub fn hover(&self, node: Option<&str>) -> Result<(), NotegraphError> {
        self.send(SessionMessage::Hover(node.map(str::to_string)))
    }

    pub fn select(&self, node: Option<&str>, append: bool) -> Result<(), NotegraphError> {
        self.send(SessionMessage::Select {
            node: node.map(str::to_string),
            append,
        })
    }

    pub fn set_type_visible(&self, label: &str, visible: bool) -> Result<(), NotegraphError> {
        self.send(SessionMessage::SetTypeVisible {
            label: label.to_string(),
            visible,
        })
    }

    pub fn active_note_changed(&self, path: &str) -> Result<(), NotegraphError> {
        self.send(SessionMessage::ActiveNoteChanged(path.to_string()))
    }

    pub fn update_config(&self, config: GraphConfig) -> Result<(), NotegraphError> {
        self.send(SessionMessage::UpdateConfig(config))
    }

    pub fn request(&self, request: ViewRequest) -> Result<(), NotegraphError> {
        self.send(SessionMessage::Request(request))
    }

    /// Close the session. Idempotent. A pass already in flight is discarded when it ends.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            // The loop may already be gone; the flag alone is enough then.
            let _ = self.tx.send(SessionMessage::Close);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

pub struct GraphSession<W: WorkspaceSource> {
    source: Arc<W>,
    config: GraphConfig,
    synthesizer: GraphSynthesizer,
    exclude: Option<Box<dyn Exclude>>,
    state: RenderState,
    rx: UnboundedReceiver<SessionMessage>,
    events: UnboundedSender<ViewEvent>,
    closed: Arc<AtomicBool>,
}

impl<W: WorkspaceSource + Send + Sync> GraphSession<W> {
    /// Create a session over `source`. Returns the handle used to drive it, the session itself
    /// (to be `run`), and the receiver of its outbound events.
    pub fn open(
        source: Arc<W>,
        config: GraphConfig,
    ) -> (SessionHandle, GraphSession<W>, UnboundedReceiver<ViewEvent>) {
        let (tx, rx) = unbounded_channel();
        let (events, events_rx) = unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));
        let state = RenderState::new(config.graph_style(), config.index_names.clone());
        let session = GraphSession {
            source,
            synthesizer: GraphSynthesizer::new(config.clone()),
            config,
            exclude: None,
            state,
            rx,
            events,
            closed: closed.clone(),
        };
        (SessionHandle { tx, closed }, session, events_rx)
    }

    /// Replace the default hidden-segment exclusion.
    pub fn with_exclude<E: Exclude + 'static>(mut self, exclude: E) -> Self {
        self.exclude = Some(Box::new(exclude));
        self
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn emit(&self, event: ViewEvent) -> Result<(), NotegraphError> {
        tracing::debug!("[GraphSession] emitting {event}");
        self.events.send(event)?;
        Ok(())
    }

    /// Process messages until the session is closed or every handle is dropped.
    #[tracing::instrument(skip_all)]
    pub async fn run(mut self) -> Result<(), NotegraphError> {
        while let Some(message) = self.rx.recv().await {
            if self.is_closed() || message == SessionMessage::Close {
                break;
            }
            if let Err(e) = self.handle(message).await {
                if self.events.is_closed() {
                    tracing::debug!("[GraphSession] event receiver dropped, stopping");
                    break;
                }
                tracing::error!("[GraphSession] {e}");
                self.emit(ViewEvent::Error(e.to_string()))?;
            }
        }
        tracing::debug!("[GraphSession] closed");
        Ok(())
    }

    /// Handle one message to completion.
    pub async fn handle(&mut self, message: SessionMessage) -> Result<(), NotegraphError> {
        match message {
            SessionMessage::WorkspaceChanged => self.resync().await,
            SessionMessage::Hover(node) => {
                let node = node.and_then(|wire| self.state.resolve(&wire));
                let decoration = self.state.hover(node);
                self.emit(ViewEvent::DidUpdateDecoration(decoration))
            }
            SessionMessage::Select { node, append } => {
                let node = node.and_then(|wire| self.state.resolve(&wire));
                let decoration = self.state.select(node, append);
                self.emit(ViewEvent::DidUpdateDecoration(decoration))
            }
            SessionMessage::SetTypeVisible { label, visible } => {
                let delta = self.state.set_type_visible(TypeLabel::new(label), visible);
                self.emit(ViewEvent::DidUpdateRender(RenderUpdate {
                    delta,
                    decoration: self.state.decoration(),
                }))
            }
            SessionMessage::ActiveNoteChanged(path) => {
                let id = NodeId::Note(path);
                if !self.state.snapshot().contains(&id) {
                    tracing::debug!("[GraphSession] active note {id} is not in the graph");
                    return Ok(());
                }
                let decoration = self.state.select(Some(id.clone()), false);
                self.emit(ViewEvent::DidSelectNote(id.wire()))?;
                self.emit(ViewEvent::DidUpdateDecoration(decoration))
            }
            SessionMessage::UpdateConfig(config) => {
                self.synthesizer = GraphSynthesizer::new(config.clone());
                self.state.set_index_names(config.index_names.clone());
                let style = config.graph_style();
                self.config = config;
                self.emit(ViewEvent::DidUpdateStyle(style.clone()))?;
                self.state.update_style(style);
                self.resync().await
            }
            SessionMessage::Request(request) => self.handle_request(request).await,
            SessionMessage::Close => Ok(()),
        }
    }

    async fn handle_request(&mut self, request: ViewRequest) -> Result<(), NotegraphError> {
        match request {
            ViewRequest::WebviewDidLoad => {
                self.emit(ViewEvent::DidUpdateStyle(self.state.style().clone()))?;
                self.resync().await
            }
            ViewRequest::WebviewDidSelectNode(wire) => {
                match self.state.snapshot().find(&wire) {
                    Some(node) if node.kind() == NodeKind::Note => {
                        self.emit(ViewEvent::OpenNote(node.id.wire()))
                    }
                    _ => {
                        tracing::debug!("[GraphSession] {wire} is not an openable note");
                        Ok(())
                    }
                }
            }
            ViewRequest::Error(payload) => {
                tracing::error!("An error occurred in the graph view: {payload}");
                Ok(())
            }
        }
    }

    /// Run one synthesis pass and apply it, unless the session closed in the meantime.
    async fn resync(&mut self) -> Result<(), NotegraphError> {
        let default_exclude = self.synthesizer.default_exclude();
        let exclude: &dyn Exclude = match self.exclude.as_deref() {
            Some(exclude) => exclude,
            None => &default_exclude,
        };
        let snapshot = self
            .synthesizer
            .synthesize(self.source.as_ref(), exclude)
            .await?;
        if self.is_closed() {
            tracing::debug!("[GraphSession] session closed during synthesis, discarding result");
            return Ok(());
        }
        let graph_data = snapshot.to_graph_data();
        let delta = self.state.refresh(snapshot);
        self.emit(ViewEvent::DidUpdateGraphData(graph_data))?;
        self.emit(ViewEvent::DidUpdateRender(RenderUpdate {
            delta,
            decoration: self.state.decoration(),
        }))
    }
}
