//! Platform publishers.
//!
//! Each HTTP publisher exposes `new` for production and `with_base_url` to
//! point at a mock server in tests. Failures never escape `publish`: they are
//! logged and folded into a failed [`PostingResult`](cadence_core::PostingResult).

mod facebook;
mod linkedin;
mod simulated;
mod twitter;

use std::time::Duration;

use reqwest::Client;

use crate::ChannelError;

pub use facebook::FacebookPublisher;
pub use linkedin::LinkedInPublisher;
pub use simulated::SimulatedPublisher;
pub use twitter::TwitterPublisher;

pub(crate) fn http_client(timeout_secs: u64, user_agent: &str) -> Result<Client, ChannelError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(user_agent.to_owned())
        .build()?)
}

pub(crate) fn normalise_base(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_owned()
}

/// Read the body of a non-2xx response into a [`ChannelError::Api`].
pub(crate) async fn api_error(service: &'static str, response: reqwest::Response) -> ChannelError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ChannelError::Api {
        service,
        status,
        body,
    }
}
