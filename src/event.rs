//! The panel message protocol.
//!
//! Both directions use the `{ "type": ..., "payload": ... }` envelope with camelCase names.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::{
    diff::RenderDelta,
    highlight::Decoration,
    snapshot::GraphData,
    style::GraphStyle,
};

/// Render delta and the decoration that goes with it, sent after each reconcile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderUpdate {
    #[serde(flatten)]
    pub delta: RenderDelta,
    pub decoration: Decoration,
}

/// Messages from the core to the panel (and, for [ViewEvent::OpenNote], to the host).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ViewEvent {
    DidUpdateGraphData(GraphData),
    DidUpdateStyle(GraphStyle),
    DidUpdateRender(RenderUpdate),
    DidUpdateDecoration(Decoration),
    /// The editor's active note, as a wire id.
    DidSelectNote(String),
    /// Ask the host to open a note the panel selected.
    OpenNote(String),
    Error(String),
}

impl Display for ViewEvent {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            ViewEvent::DidUpdateGraphData(data) => write!(
                f,
                "DidUpdateGraphData({} nodes, {} links)",
                data.node_info.len(),
                data.links.len()
            ),
            ViewEvent::DidUpdateStyle(_) => write!(f, "DidUpdateStyle"),
            ViewEvent::DidUpdateRender(update) => write!(
                f,
                "DidUpdateRender(+{} -{})",
                update.delta.nodes_to_add.len(),
                update.delta.nodes_to_remove.len()
            ),
            ViewEvent::DidUpdateDecoration(_) => write!(f, "DidUpdateDecoration"),
            ViewEvent::DidSelectNote(id) => write!(f, "DidSelectNote({id})"),
            ViewEvent::OpenNote(id) => write!(f, "OpenNote({id})"),
            ViewEvent::Error(msg) => write!(f, "Error({msg})"),
        }
    }
}

/// Messages from the panel to the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ViewRequest {
    /// The panel finished loading and wants style and graph data.
    WebviewDidLoad,
    /// The user picked a node (wire id) in the panel.
    WebviewDidSelectNode(String),
    /// The panel hit an error; reported, never fatal.
    Error(serde_json::Value),
}

impl Display for ViewRequest {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            ViewRequest::WebviewDidLoad => write!(f, "WebviewDidLoad"),
            ViewRequest::WebviewDidSelectNode(id) => write!(f, "WebviewDidSelectNode({id})"),
            ViewRequest::Error(payload) => write!(f, "Error({payload})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{nodeid::NodeId, properties::EdgeKind, snapshot::Edge};
    use serde_json::json;
    use test_log::test;

    #[test]
    fn test_event_envelope() {
        let event = ViewEvent::DidSelectNote("/ws/a.md".to_string());
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value, json!({"type": "didSelectNote", "payload": "/ws/a.md"}));
    }

    #[test]
    fn test_render_update_keys() {
        let a = NodeId::Note("/ws/a.md".into());
        let f = NodeId::Folder("/ws".into());
        let update = RenderUpdate {
            delta: RenderDelta {
                nodes_to_add: vec![a.clone()],
                nodes_to_remove: vec![],
                live_links: vec![Edge::new(f.clone(), a.clone(), EdgeKind::Structural)],
            },
            decoration: Decoration {
                highlighted_ids: vec![f.clone()],
                focus_links: vec![],
            },
        };
        let value = serde_json::to_value(ViewEvent::DidUpdateRender(update)).unwrap();
        assert_eq!(value["type"], "didUpdateRender");
        assert_eq!(value["payload"]["nodesToAdd"], json!(["/ws/a.md"]));
        assert_eq!(value["payload"]["liveLinks"][0]["source"], "folder:/ws");
        assert_eq!(
            value["payload"]["decoration"]["highlightedIds"],
            json!(["folder:/ws"])
        );
    }

    #[test]
    fn test_request_parsing() {
        let load: ViewRequest = serde_json::from_str(r#"{"type": "webviewDidLoad"}"#).unwrap();
        assert_eq!(load, ViewRequest::WebviewDidLoad);
        let select: ViewRequest =
            serde_json::from_str(r#"{"type": "webviewDidSelectNode", "payload": "tag:x"}"#)
                .unwrap();
        assert_eq!(select, ViewRequest::WebviewDidSelectNode("tag:x".to_string()));
        let error: ViewRequest =
            serde_json::from_str(r#"{"type": "error", "payload": {"message": "boom"}}"#).unwrap();
        assert!(error.to_string().contains("boom"));
    }
}
