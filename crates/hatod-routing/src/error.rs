use thiserror::Error;

/// Errors returned by the routing matrix API client.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The routing API returned a non-OK top-level status.
    #[error("routing API error: {0}")]
    ApiError(String),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// More matrix elements requested than the provider allows per call.
    #[error("matrix request of {requested} elements exceeds the per-request cap of {max}")]
    TooManyElements { requested: usize, max: usize },
}
