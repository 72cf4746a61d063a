//! Deterministic in-process providers for development and tests.
//!
//! The mock transfer provider settles by reference suffix so tests can
//! exercise every settlement path without network access:
//! - references ending in `-fail` fail immediately
//! - references ending in `-pending` stay pending until verified
//! - everything else settles successfully right away

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use velora_core::counterparty::ResolvedAccount;
use velora_core::provider::{
    ProviderError, TransferOutcome, TransferProvider, TransferRequest, TransferStatus,
    VerificationProvider,
};

/// Mock transfer provider with reference-driven outcomes.
#[derive(Debug, Default)]
pub struct MockTransferProvider {
    /// Transfers initiated so far, keyed by provider ref.
    transfers: Mutex<HashMap<String, TransferStatus>>,
}

impl MockTransferProvider {
    /// Marks a pending transfer as settled so a later verify reports it.
    pub fn settle(&self, provider_ref: &str, status: TransferStatus) {
        self.transfers
            .lock()
            .expect("mock transfer state poisoned")
            .insert(provider_ref.to_string(), status);
    }
}

#[async_trait]
impl TransferProvider for MockTransferProvider {
    async fn initiate_transfer(
        &self,
        request: &TransferRequest,
    ) -> Result<TransferOutcome, ProviderError> {
        let status = if request.reference.ends_with("-fail") {
            TransferStatus::Failed
        } else if request.reference.ends_with("-pending") {
            TransferStatus::Pending
        } else {
            TransferStatus::Successful
        };

        let provider_ref = format!("mock-{}", request.reference);
        self.transfers
            .lock()
            .expect("mock transfer state poisoned")
            .insert(provider_ref.clone(), status);

        Ok(TransferOutcome {
            status,
            provider_ref: Some(provider_ref),
            gateway_response: Some("mock".to_string()),
        })
    }

    async fn verify_transfer(&self, provider_ref: &str) -> Result<TransferOutcome, ProviderError> {
        let transfers = self
            .transfers
            .lock()
            .expect("mock transfer state poisoned");
        let status = transfers
            .get(provider_ref)
            .copied()
            .ok_or_else(|| ProviderError::InvalidResponse(format!("unknown ref {provider_ref}")))?;

        Ok(TransferOutcome {
            status,
            provider_ref: Some(provider_ref.to_string()),
            gateway_response: Some("mock".to_string()),
        })
    }
}

/// Mock verification provider.
///
/// Account numbers of all zeros are invalid; everything else resolves to a
/// deterministic name derived from the inputs.
#[derive(Debug, Default)]
pub struct MockVerificationProvider;

#[async_trait]
impl VerificationProvider for MockVerificationProvider {
    async fn resolve_account(
        &self,
        account_number: &str,
        bank_code: &str,
    ) -> Result<ResolvedAccount, ProviderError> {
        if account_number.chars().all(|c| c == '0') {
            return Err(ProviderError::InvalidAccount {
                account_number: account_number.to_string(),
                bank_code: bank_code.to_string(),
            });
        }

        Ok(ResolvedAccount {
            account_name: format!("ACCOUNT {account_number}"),
            bank_name: Some(format!("Bank {bank_code}")),
            bank_id: Some(bank_code.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use velora_core::counterparty::CounterpartySnapshot;
    use velora_shared::types::Currency;

    fn request(reference: &str) -> TransferRequest {
        TransferRequest {
            reference: reference.to_string(),
            amount: 50_000,
            currency: Currency::Ngn,
            counterparty: CounterpartySnapshot {
                account_number: "0123456789".to_string(),
                bank_code: "058".to_string(),
                account_name: "ADA OKAFOR".to_string(),
                bank_name: None,
            },
            narration: None,
        }
    }

    #[tokio::test]
    async fn test_default_reference_settles_successfully() {
        let provider = MockTransferProvider::default();
        let outcome = provider.initiate_transfer(&request("tx-1")).await.unwrap();
        assert_eq!(outcome.status, TransferStatus::Successful);
        assert_eq!(outcome.provider_ref.as_deref(), Some("mock-tx-1"));
    }

    #[tokio::test]
    async fn test_fail_suffix_fails() {
        let provider = MockTransferProvider::default();
        let outcome = provider
            .initiate_transfer(&request("tx-2-fail"))
            .await
            .unwrap();
        assert_eq!(outcome.status, TransferStatus::Failed);
    }

    #[tokio::test]
    async fn test_pending_then_settled_on_verify() {
        let provider = MockTransferProvider::default();
        let outcome = provider
            .initiate_transfer(&request("tx-3-pending"))
            .await
            .unwrap();
        assert_eq!(outcome.status, TransferStatus::Pending);

        let provider_ref = outcome.provider_ref.unwrap();
        provider.settle(&provider_ref, TransferStatus::Successful);

        let verified = provider.verify_transfer(&provider_ref).await.unwrap();
        assert_eq!(verified.status, TransferStatus::Successful);
    }

    #[tokio::test]
    async fn test_verify_unknown_ref_errors() {
        let provider = MockTransferProvider::default();
        assert!(provider.verify_transfer("mock-nope").await.is_err());
    }

    #[tokio::test]
    async fn test_resolve_account() {
        let provider = MockVerificationProvider;
        let resolved = provider.resolve_account("0123456789", "058").await.unwrap();
        assert_eq!(resolved.account_name, "ACCOUNT 0123456789");
        assert_eq!(resolved.bank_id.as_deref(), Some("058"));
    }

    #[tokio::test]
    async fn test_all_zero_account_invalid() {
        let provider = MockVerificationProvider;
        let result = provider.resolve_account("0000000000", "058").await;
        assert!(matches!(result, Err(ProviderError::InvalidAccount { .. })));
    }
}
