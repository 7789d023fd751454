use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::adapters::api::InvokeRequest;
use crate::app::dispatch::InvokeResponse;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected response status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Invokes ledger functions through a running HTTP transport.
#[derive(Debug, Clone)]
pub struct RemoteLedgerClient {
    client: Client,
    base_url: String,
}

impl RemoteLedgerClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn invoke_url(&self) -> String {
        format!("{}/invoke", self.base_url)
    }

    /// Ledger failures come back as `success == false`; only transport
    /// problems are errors.
    pub async fn invoke(&self, function: &str, args: &[String]) -> Result<InvokeResponse, RemoteError> {
        let request = InvokeRequest {
            function: function.to_string(),
            args: args.to_vec(),
        };

        let resp = self.client.post(self.invoke_url()).json(&request).send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;

        if status.is_success() {
            return Ok(InvokeResponse::success(body.to_vec()));
        }

        match serde_json::from_slice::<ErrorBody>(&body) {
            Ok(error) if status.is_client_error() || status.is_server_error() => {
                Ok(InvokeResponse::failure(error.error))
            }
            _ => Err(RemoteError::UnexpectedStatus {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            }),
        }
    }
}
