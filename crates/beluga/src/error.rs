#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("graph contains an edge with a missing endpoint: {edge_id}")]
    MissingEndpoint { edge_id: String },

    #[error("layout produced a non-finite position for {node_id} at iteration {iteration}")]
    NonFinitePosition { node_id: String, iteration: usize },

    #[error("invalid layout options: {message}")]
    InvalidOptions { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
