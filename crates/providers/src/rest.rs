//! REST provider clients.
//!
//! Both clients speak a normalized JSON contract; provider-specific payload
//! shapes live behind the gateway these endpoints front, not here.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use velora_core::counterparty::ResolvedAccount;
use velora_core::provider::{
    ProviderError, TransferOutcome, TransferProvider, TransferRequest, TransferStatus,
    VerificationProvider,
};

/// Connection settings for the REST providers.
#[derive(Debug, Clone, Default)]
pub struct RestConfig {
    /// Base URL of the provider gateway.
    pub base_url: String,
    /// Bearer secret for the gateway.
    pub secret: String,
}

#[derive(Debug, Deserialize)]
struct WireTransfer {
    status: String,
    provider_ref: Option<String>,
    gateway_response: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireAccount {
    account_name: String,
    bank_name: Option<String>,
    bank_id: Option<String>,
}

fn parse_status(raw: &str) -> Result<TransferStatus, ProviderError> {
    TransferStatus::parse(raw)
        .ok_or_else(|| ProviderError::InvalidResponse(format!("unknown status {raw}")))
}

/// REST transfer provider.
#[derive(Debug)]
pub struct RestTransferProvider {
    client: reqwest::Client,
    config: RestConfig,
}

impl RestTransferProvider {
    /// Creates a client against the configured gateway.
    #[must_use]
    pub fn new(config: RestConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn decode(response: reqwest::Response) -> Result<TransferOutcome, ProviderError> {
        let status = response.status();
        if status.is_server_error() {
            return Err(ProviderError::Unavailable(format!(
                "gateway returned {status}"
            )));
        }

        let wire: WireTransfer = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(TransferOutcome {
            status: parse_status(&wire.status)?,
            provider_ref: wire.provider_ref,
            gateway_response: wire.gateway_response,
        })
    }
}

#[async_trait]
impl TransferProvider for RestTransferProvider {
    async fn initiate_transfer(
        &self,
        request: &TransferRequest,
    ) -> Result<TransferOutcome, ProviderError> {
        let url = format!("{}/transfers", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.secret)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!(reference = %request.reference, error = %e, "transfer initiation failed");
                ProviderError::Unavailable(e.to_string())
            })?;

        Self::decode(response).await
    }

    async fn verify_transfer(&self, provider_ref: &str) -> Result<TransferOutcome, ProviderError> {
        let url = format!("{}/transfers/{provider_ref}", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.secret)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        Self::decode(response).await
    }
}

/// REST bank-verification provider.
#[derive(Debug)]
pub struct RestVerificationProvider {
    client: reqwest::Client,
    config: RestConfig,
}

impl RestVerificationProvider {
    /// Creates a client against the configured gateway.
    #[must_use]
    pub fn new(config: RestConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl VerificationProvider for RestVerificationProvider {
    async fn resolve_account(
        &self,
        account_number: &str,
        bank_code: &str,
    ) -> Result<ResolvedAccount, ProviderError> {
        let url = format!(
            "{}/banks/{bank_code}/accounts/{account_number}",
            self.config.base_url
        );
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.secret)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND
            || status == reqwest::StatusCode::UNPROCESSABLE_ENTITY
        {
            return Err(ProviderError::InvalidAccount {
                account_number: account_number.to_string(),
                bank_code: bank_code.to_string(),
            });
        }
        if status.is_server_error() {
            return Err(ProviderError::Unavailable(format!(
                "gateway returned {status}"
            )));
        }

        let wire: WireAccount = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(ResolvedAccount {
            account_name: wire.account_name,
            bank_name: wire.bank_name,
            bank_id: wire.bank_id,
        })
    }
}
