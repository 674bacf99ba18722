use std::{fmt, io, path::StripPrefixError};

use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use thiserror::Error;
use tokio::sync::mpsc::error::SendError as TokioSendError;

#[cfg(feature = "service")]
use notify::{Error as NotifyError, ErrorKind as NotifyErrorKind};

use crate::{event::ViewEvent, session::SessionMessage};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum NotegraphError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Custom error: {0}")]
    Custom(String),
    #[error("File System error: {0}")]
    Io(String),
    #[error("Item Not Found: {0}")]
    NotFound(String),
    #[error("You do not have permission to access this resource")]
    PermissionDenied,
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
    #[error("Graph session is closed")]
    SessionClosed,
    #[error("Workspace provider error: {0}")]
    Workspace(String),
}

impl From<StripPrefixError> for NotegraphError {
    fn from(src: StripPrefixError) -> NotegraphError {
        NotegraphError::NotFound(format!("Strip prefix failed for path. Error: {src}"))
    }
}

impl From<toml::de::Error> for NotegraphError {
    fn from(src: toml::de::Error) -> NotegraphError {
        NotegraphError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for NotegraphError {
    fn from(src: toml::ser::Error) -> NotegraphError {
        NotegraphError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<JsonError> for NotegraphError {
    fn from(src: JsonError) -> NotegraphError {
        NotegraphError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<io::Error> for NotegraphError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => NotegraphError::NotFound(format!("{x}")),
            io::ErrorKind::PermissionDenied => NotegraphError::PermissionDenied,
            _ => NotegraphError::Io(format!("IOError: {}", x.kind())),
        }
    }
}

impl From<fmt::Error> for NotegraphError {
    fn from(x: fmt::Error) -> Self {
        NotegraphError::Custom(format!("{x}"))
    }
}

impl From<TokioSendError<SessionMessage>> for NotegraphError {
    fn from(_: TokioSendError<SessionMessage>) -> Self {
        NotegraphError::SessionClosed
    }
}

impl From<TokioSendError<ViewEvent>> for NotegraphError {
    fn from(x: TokioSendError<ViewEvent>) -> Self {
        NotegraphError::Io(format!(
            "Channel update send Error, could not transmit view event {}",
            x.0
        ))
    }
}

#[cfg(feature = "service")]
impl From<NotifyError> for NotegraphError {
    fn from(notify_error: NotifyError) -> Self {
        match notify_error.kind {
            NotifyErrorKind::Generic(msg) => NotegraphError::Custom(format!(
                "notify-debouncer: {}, paths: {:?}",
                msg, notify_error.paths
            )),
            NotifyErrorKind::Io(io_error) => NotegraphError::Io(format!(
                "notify-debouncer: io error {}, paths: {:?}",
                io_error.kind(),
                notify_error.paths
            )),
            NotifyErrorKind::PathNotFound => NotegraphError::NotFound(format!(
                "notify-debouncer: path(s) not found: {:?}",
                notify_error.paths
            )),
            NotifyErrorKind::WatchNotFound => NotegraphError::NotFound(format!(
                "notify-debouncer: watch not found, paths: {:?}",
                notify_error.paths
            )),
            NotifyErrorKind::InvalidConfig(_) => {
                NotegraphError::Custom("notify-debouncer invalid config".to_string())
            }
            NotifyErrorKind::MaxFilesWatch => {
                NotegraphError::Custom("notify-debouncer max file watch limit reached".to_string())
            }
        }
    }
}
