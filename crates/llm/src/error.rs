/// Errors from talking to an upstream chat completion provider.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("Provider API error ({status}): {body}")]
    Api {
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The provider answered with a body that is not a chat completion.
    #[error("Malformed response from provider: {0}")]
    Malformed(String),

    /// The completion carried no choices.
    #[error("Empty response from provider")]
    EmptyResponse,
}
