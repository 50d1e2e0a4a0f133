use serde::Serialize;

use crate::extension::Category;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Scene(#[from] narwhal_scene::Error),

    #[error(transparent)]
    Layout(#[from] beluga::Error),

    #[error(transparent)]
    Render(#[from] narwhal_render::Error),

    #[error(transparent)]
    Viewport(#[from] narwhal_render::ViewportError),

    #[error("unknown plugin type: {key}")]
    UnknownPlugin { key: String },

    #[error("unknown behavior: {key}")]
    UnknownBehavior { key: String },

    #[error("{category} {key:?} is already registered")]
    AlreadyRegistered { category: Category, key: String },

    #[error("invalid options for {key}: {message}")]
    InvalidOptions { key: String, message: String },

    #[error("graph has been destroyed")]
    Destroyed,
}

pub type Result<T> = std::result::Result<T, Error>;

/// A behavior or plugin call that failed. The failing extension is skipped for that call only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtensionFailure {
    pub category: Category,
    pub key: String,
    pub message: String,
}
