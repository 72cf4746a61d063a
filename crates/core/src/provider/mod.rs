//! External provider contracts.
//!
//! The engine is provider-agnostic beyond these traits. Provider selection
//! is a closed enum resolved by a compile-time-checked factory in the
//! providers crate — an unsupported provider is a compile error, not a
//! runtime lookup failure.

pub mod error;
pub mod transfer;
pub mod verification;

pub use error::ProviderError;
pub use transfer::{
    TransferOutcome, TransferProvider, TransferProviderKind, TransferRequest, TransferStatus,
};
pub use verification::{VerificationProvider, VerificationProviderKind};
