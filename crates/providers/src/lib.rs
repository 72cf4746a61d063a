//! Transfer and bank-verification provider clients.
//!
//! Two implementations per contract: a deterministic mock for development
//! and tests, and a REST client speaking the normalized JSON contract.
//! Factories match the closed provider-kind enums exhaustively, so wiring
//! an unsupported provider is a compile error.

pub mod mock;
pub mod rest;

use std::sync::Arc;

use velora_core::provider::{
    TransferProvider, TransferProviderKind, VerificationProvider, VerificationProviderKind,
};

pub use mock::{MockTransferProvider, MockVerificationProvider};
pub use rest::{RestConfig, RestTransferProvider, RestVerificationProvider};

/// Builds the configured transfer provider.
#[must_use]
pub fn build_transfer_provider(
    kind: TransferProviderKind,
    rest: RestConfig,
) -> Arc<dyn TransferProvider> {
    match kind {
        TransferProviderKind::Mock => Arc::new(MockTransferProvider::default()),
        TransferProviderKind::Rest => Arc::new(RestTransferProvider::new(rest)),
    }
}

/// Builds the configured bank-verification provider.
#[must_use]
pub fn build_verification_provider(
    kind: VerificationProviderKind,
    rest: RestConfig,
) -> Arc<dyn VerificationProvider> {
    match kind {
        VerificationProviderKind::Mock => Arc::new(MockVerificationProvider::default()),
        VerificationProviderKind::Rest => Arc::new(RestVerificationProvider::new(rest)),
    }
}
