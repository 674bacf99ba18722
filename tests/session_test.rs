//! Session event loop: ordering, protocol replies and close semantics.

mod common;

use notegraph::{
    config::GraphConfig,
    event::{ViewEvent, ViewRequest},
    nodeid::NodeId,
    session::{GraphSession, SessionHandle},
    style::StylePatch,
    workspace::{Connection, MemoryWorkspace, Note, WorkspaceSource},
    NotegraphError,
};
use std::{
    future::Future,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use test_log::test;
use tokio::{
    sync::{mpsc::UnboundedReceiver, Notify},
    task::JoinHandle,
};

/// Workspace whose note listing blocks until released, once gating is switched on.
struct GatedWorkspace {
    inner: MemoryWorkspace,
    gated: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl GatedWorkspace {
    fn new(inner: MemoryWorkspace) -> Self {
        GatedWorkspace {
            inner,
            gated: AtomicBool::new(false),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

impl WorkspaceSource for GatedWorkspace {
    fn root(&self) -> Option<String> {
        self.inner.root()
    }

    fn list_notes(&self) -> impl Future<Output = Result<Vec<Note>, NotegraphError>> + Send {
        async move {
            if self.gated.load(Ordering::SeqCst) {
                self.entered.notify_one();
                self.release.notified().await;
            }
            self.inner.list_notes().await
        }
    }

    fn list_connections(
        &self,
    ) -> impl Future<Output = Result<Vec<Connection>, NotegraphError>> + Send {
        self.inner.list_connections()
    }

    fn lookup(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Option<Note>, NotegraphError>> + Send {
        self.inner.lookup(path)
    }
}

fn start<W: WorkspaceSource + Send + Sync + 'static>(
    source: Arc<W>,
    config: GraphConfig,
) -> (
    SessionHandle,
    JoinHandle<Result<(), NotegraphError>>,
    UnboundedReceiver<ViewEvent>,
) {
    let (handle, session, events) = GraphSession::open(source, config);
    let task = tokio::spawn(session.run());
    (handle, task, events)
}

async fn next(events: &mut UnboundedReceiver<ViewEvent>) -> ViewEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("event within timeout")
        .expect("event channel open")
}

fn wire_ids(ids: &[NodeId]) -> Vec<String> {
    ids.iter().map(NodeId::wire).collect()
}

#[test(tokio::test)]
async fn test_webview_load_sends_style_then_graph() {
    let (handle, task, mut events) =
        start(Arc::new(common::readme_workspace()), GraphConfig::default());
    handle.request(ViewRequest::WebviewDidLoad).unwrap();

    assert!(matches!(next(&mut events).await, ViewEvent::DidUpdateStyle(_)));
    match next(&mut events).await {
        ViewEvent::DidUpdateGraphData(data) => {
            assert_eq!(data.node_info.len(), 5);
            assert_eq!(data.links.len(), 4);
        }
        other => panic!("expected graph data, got {other}"),
    }
    match next(&mut events).await {
        ViewEvent::DidUpdateRender(update) => {
            assert_eq!(update.delta.nodes_to_add.len(), 5);
            assert!(update.decoration.highlighted_ids.is_empty());
        }
        other => panic!("expected render update, got {other}"),
    }

    handle.close();
    task.await.unwrap().unwrap();
    assert!(events.recv().await.is_none());
}

#[test(tokio::test)]
async fn test_messages_are_handled_in_order() {
    let (handle, task, mut events) =
        start(Arc::new(common::readme_workspace()), GraphConfig::default());

    // The hover is queued behind the pass and sees its result.
    handle.workspace_changed().unwrap();
    handle.hover(Some("/ws/a/note1.md")).unwrap();

    assert!(matches!(next(&mut events).await, ViewEvent::DidUpdateGraphData(_)));
    assert!(matches!(next(&mut events).await, ViewEvent::DidUpdateRender(_)));
    match next(&mut events).await {
        ViewEvent::DidUpdateDecoration(decoration) => {
            let ids = wire_ids(&decoration.highlighted_ids);
            assert!(ids.contains(&"/ws/a/note1.md".to_string()));
            assert!(ids.contains(&"tag:project".to_string()));
            assert!(ids.contains(&"/ws/a/note2.md".to_string()));
            assert!(ids.contains(&"folder:/ws/a".to_string()));
            assert!(!ids.contains(&"/ws/README.md".to_string()));
            assert_eq!(decoration.focus_links.len(), 3);
        }
        other => panic!("expected decoration, got {other}"),
    }

    handle.close();
    task.await.unwrap().unwrap();
}

#[test(tokio::test)]
async fn test_pass_finishing_after_close_is_discarded() {
    let workspace = Arc::new(GatedWorkspace::new(common::readme_workspace()));
    workspace.gated.store(true, Ordering::SeqCst);
    let (handle, task, mut events) = start(workspace.clone(), GraphConfig::default());

    handle.workspace_changed().unwrap();
    workspace.entered.notified().await;
    handle.close();
    workspace.release.notify_one();

    task.await.unwrap().unwrap();
    assert!(events.recv().await.is_none());
    assert!(matches!(
        handle.workspace_changed(),
        Err(NotegraphError::SessionClosed)
    ));
}

#[test(tokio::test)]
async fn test_active_note_selects_known_notes_only() {
    let (handle, task, mut events) =
        start(Arc::new(common::readme_workspace()), GraphConfig::default());
    handle.workspace_changed().unwrap();
    next(&mut events).await;
    next(&mut events).await;

    handle.active_note_changed("/ws/elsewhere.md").unwrap();
    handle.active_note_changed("/ws/a/note1.md").unwrap();

    assert_eq!(
        next(&mut events).await,
        ViewEvent::DidSelectNote("/ws/a/note1.md".to_string())
    );
    match next(&mut events).await {
        ViewEvent::DidUpdateDecoration(decoration) => {
            assert!(wire_ids(&decoration.highlighted_ids).contains(&"/ws/a/note1.md".to_string()));
        }
        other => panic!("expected decoration, got {other}"),
    }

    handle.close();
    task.await.unwrap().unwrap();
}

#[test(tokio::test)]
async fn test_selecting_in_panel_opens_only_existing_notes() {
    let (handle, task, mut events) =
        start(Arc::new(common::readme_workspace()), GraphConfig::default());
    handle.workspace_changed().unwrap();
    next(&mut events).await;
    next(&mut events).await;

    for wire in ["/ws/a/note2.md", "tag:project", "folder:/ws/a", "/ws/missing.md"] {
        handle
            .request(ViewRequest::WebviewDidSelectNode(wire.to_string()))
            .unwrap();
    }
    handle
        .request(ViewRequest::Error(serde_json::json!({"message": "boom"})))
        .unwrap();
    handle
        .request(ViewRequest::WebviewDidSelectNode("/ws/a/note1.md".to_string()))
        .unwrap();

    assert_eq!(
        next(&mut events).await,
        ViewEvent::OpenNote("/ws/a/note1.md".to_string())
    );

    handle.close();
    task.await.unwrap().unwrap();
}

#[test(tokio::test)]
async fn test_config_update_restyles_and_resynthesizes() {
    let workspace = Arc::new(common::readme_workspace());
    let (handle, task, mut events) = start(workspace.clone(), GraphConfig::default());
    handle.workspace_changed().unwrap();
    next(&mut events).await;
    next(&mut events).await;

    let config = GraphConfig {
        root_title: Some("Vault".to_string()),
        index_names: vec!["index.md".to_string()],
        style: StylePatch {
            font_size: Some(14.0),
            ..Default::default()
        },
        ..Default::default()
    };
    handle.update_config(config).unwrap();

    match next(&mut events).await {
        ViewEvent::DidUpdateStyle(style) => assert_eq!(style.font_size, 14.0),
        other => panic!("expected style, got {other}"),
    }
    match next(&mut events).await {
        ViewEvent::DidUpdateGraphData(data) => {
            // README.md no longer represents the root.
            let root = &data.node_info[&NodeId::Folder("/ws".to_string())];
            assert_eq!(root.title, "Vault");
        }
        other => panic!("expected graph data, got {other}"),
    }
    match next(&mut events).await {
        ViewEvent::DidUpdateRender(update) => {
            assert_eq!(
                update.delta.nodes_to_add,
                vec![NodeId::Folder("/ws".to_string())]
            );
        }
        other => panic!("expected render update, got {other}"),
    }

    handle.close();
    task.await.unwrap().unwrap();
}

#[test(tokio::test)]
async fn test_dropping_every_handle_ends_the_session() {
    let workspace = Arc::new(MemoryWorkspace::new("/ws"));
    let (handle, task, _events) = start(workspace, GraphConfig::default());
    drop(handle);
    task.await.unwrap().unwrap();
}
