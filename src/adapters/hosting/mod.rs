use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::{
    application::ports::hosting_provider::{
        HostingProvider, ProviderError, ProviderRoutingState, RoutingSnapshot,
    },
    infra::http_client::try_build_client_with_timeout,
};

/// JSON/HTTP client for the edge-hosting provider.
#[derive(Clone)]
pub struct HttpHostingProvider {
    client: Client,
    base_url: Url,
    api_token: SecretString,
}

impl HttpHostingProvider {
    pub fn new(
        base_url: Url,
        api_token: SecretString,
        request_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: try_build_client_with_timeout(request_timeout)?,
            base_url,
            api_token,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }
}

#[derive(Serialize)]
struct ChallengeCheckRequest<'a> {
    record_name: &'a str,
    record_value: &'a str,
}

#[derive(Deserialize)]
struct ChallengeCheckResponse {
    confirmed: bool,
}

fn transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Transport(err.to_string())
    }
}

/// Turn a non-2xx response into `Rejected`, keeping the body for the logs.
async fn ensure_success(resp: Response) -> Result<Response, ProviderError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ProviderError::Rejected {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl HostingProvider for HttpHostingProvider {
    async fn check_challenge(
        &self,
        record_name: &str,
        record_value: &str,
    ) -> Result<bool, ProviderError> {
        debug!(record = %record_name, "Checking challenge record with provider");

        let resp = self
            .client
            .post(self.endpoint("v1/challenges/check"))
            .bearer_auth(self.api_token.expose_secret())
            .json(&ChallengeCheckRequest {
                record_name,
                record_value,
            })
            .send()
            .await
            .map_err(transport_error)?;

        let parsed: ChallengeCheckResponse = ensure_success(resp)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        Ok(parsed.confirmed)
    }

    async fn sync_routing(
        &self,
        snapshot: &RoutingSnapshot,
    ) -> Result<ProviderRoutingState, ProviderError> {
        debug!(host = %snapshot.host, "Syncing routing state with provider");

        let resp = self
            .client
            .put(self.endpoint(&format!("v1/routes/{}", snapshot.host)))
            .bearer_auth(self.api_token.expose_secret())
            .json(snapshot)
            .send()
            .await
            .map_err(transport_error)?;

        ensure_success(resp)
            .await?
            .json::<ProviderRoutingState>()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))
    }
}
