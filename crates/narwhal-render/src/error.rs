use narwhal_scene::ElementKind;

use crate::viewport::ViewportError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("render target is not attached to a container")]
    MissingContainer,

    #[error("no {kind:?} shape registered under {key:?}")]
    UnknownShape { kind: ElementKind, key: String },

    #[error("render backend failed: {message}")]
    Backend { message: String },

    #[error(transparent)]
    Viewport(#[from] ViewportError),
}
