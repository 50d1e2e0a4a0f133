pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("element not found: {id}")]
    NotFound { id: String },

    #[error("duplicate element id: {id}")]
    DuplicateId { id: String },

    #[error("{id} references missing element {missing}")]
    DanglingReference { id: String, missing: String },

    #[error("invalid style for {id}: {message}")]
    InvalidStyle { id: String, message: String },
}
