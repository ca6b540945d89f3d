use thiserror::Error;

/// Errors raised while rendering or publishing content for one platform.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote API answered with a non-success status.
    #[error("{service} returned {status}: {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// Copy generation failed or produced nothing usable.
    #[error("content generation failed: {0}")]
    Generation(String),

    /// Visual asset generation failed. The message always names the image
    /// step so fallback handling can recognise it.
    #[error("image generation failed: {0}")]
    Image(String),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid channel configuration: {0}")]
    Config(String),
}
