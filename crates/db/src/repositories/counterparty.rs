//! Counterparty resolver: provider-backed resolution with a cache.
//!
//! Resolutions are cached twice: an in-process moka cache for hot lookups
//! and the counterparties table as the durable, organization-scoped cache.

use std::sync::Arc;

use chrono::Utc;
use moka::future::Cache;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::{debug, warn};
use uuid::Uuid;

use velora_core::counterparty::{Counterparty, CounterpartyError, ResolvedAccount};
use velora_core::provider::{ProviderError, VerificationProvider};
use velora_shared::types::{CounterpartyId, OrganizationId, PageRequest, PageResponse};

use crate::entities::counterparties;

/// Cache key: organization, account number, bank code.
type ResolveKey = (Uuid, String, String);

/// Counterparty resolver with provider delegation and caching.
#[derive(Clone)]
pub struct CounterpartyResolver {
    db: DatabaseConnection,
    provider: Arc<dyn VerificationProvider>,
    cache: Cache<ResolveKey, ResolvedAccount>,
}

impl CounterpartyResolver {
    /// Cache capacity; resolution results are small and immutable.
    const CACHE_CAPACITY: u64 = 10_000;

    /// Creates a resolver backed by the given verification provider.
    #[must_use]
    pub fn new(db: DatabaseConnection, provider: Arc<dyn VerificationProvider>) -> Self {
        Self {
            db,
            provider,
            cache: Cache::new(Self::CACHE_CAPACITY),
        }
    }

    /// Resolves an account to a verified identity and upserts the cache row.
    ///
    /// # Errors
    ///
    /// - `ProviderUnavailable` when the provider call fails
    /// - `InvalidAccount` when the provider rejects the account (not retried)
    pub async fn resolve(
        &self,
        organization_id: Uuid,
        account_number: &str,
        bank_code: &str,
    ) -> Result<Counterparty, CounterpartyError> {
        let key = (
            organization_id,
            account_number.to_string(),
            bank_code.to_string(),
        );

        let resolved = if let Some(hit) = self.cache.get(&key).await {
            debug!(account_number, bank_code, "counterparty cache hit");
            hit
        } else {
            let resolved = self
                .provider
                .resolve_account(account_number, bank_code)
                .await
                .map_err(provider_to_counterparty_err)?;
            self.cache.insert(key, resolved.clone()).await;
            resolved
        };

        let row = self
            .upsert(organization_id, account_number, bank_code, &resolved)
            .await?;
        Ok(to_core_counterparty(&row))
    }

    /// Flags or unflags a counterparty on the saved-recipient list.
    pub async fn set_recipient(
        &self,
        organization_id: Uuid,
        account_number: &str,
        bank_code: &str,
        is_recipient: bool,
    ) -> Result<(), CounterpartyError> {
        let row = self
            .find_row(organization_id, account_number, bank_code)
            .await?
            .ok_or_else(|| CounterpartyError::InvalidAccount {
                account_number: account_number.to_string(),
                bank_code: bank_code.to_string(),
            })?;

        let mut active: counterparties::ActiveModel = row.into();
        active.is_recipient = Set(is_recipient);
        active.updated_at = Set(Utc::now().into());
        active.update(&self.db).await.map_err(cp_db_err)?;
        Ok(())
    }

    /// Lists saved recipients, newest first.
    pub async fn list_recipients(
        &self,
        organization_id: Uuid,
        page: PageRequest,
    ) -> Result<PageResponse<Counterparty>, CounterpartyError> {
        let query = counterparties::Entity::find()
            .filter(counterparties::Column::OrganizationId.eq(organization_id))
            .filter(counterparties::Column::IsRecipient.eq(true));

        let total = query.clone().count(&self.db).await.map_err(cp_db_err)?;
        let rows = query
            .order_by_desc(counterparties::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(cp_db_err)?;

        Ok(PageResponse::new(
            rows.iter().map(to_core_counterparty).collect(),
            page.page,
            page.per_page,
            total,
        ))
    }

    async fn find_row(
        &self,
        organization_id: Uuid,
        account_number: &str,
        bank_code: &str,
    ) -> Result<Option<counterparties::Model>, CounterpartyError> {
        counterparties::Entity::find()
            .filter(counterparties::Column::OrganizationId.eq(organization_id))
            .filter(counterparties::Column::AccountNumber.eq(account_number))
            .filter(counterparties::Column::BankCode.eq(bank_code))
            .one(&self.db)
            .await
            .map_err(cp_db_err)
    }

    async fn upsert(
        &self,
        organization_id: Uuid,
        account_number: &str,
        bank_code: &str,
        resolved: &ResolvedAccount,
    ) -> Result<counterparties::Model, CounterpartyError> {
        let now = Utc::now();

        if let Some(existing) = self
            .find_row(organization_id, account_number, bank_code)
            .await?
        {
            let mut active: counterparties::ActiveModel = existing.into();
            active.account_name = Set(resolved.account_name.clone());
            active.bank_name = Set(resolved.bank_name.clone());
            active.bank_id = Set(resolved.bank_id.clone());
            active.updated_at = Set(now.into());
            return active.update(&self.db).await.map_err(cp_db_err);
        }

        let insert = counterparties::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(organization_id),
            account_number: Set(account_number.to_string()),
            bank_code: Set(bank_code.to_string()),
            account_name: Set(resolved.account_name.clone()),
            bank_name: Set(resolved.bank_name.clone()),
            bank_id: Set(resolved.bank_id.clone()),
            is_recipient: Set(false),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.db)
        .await;

        match insert {
            Ok(row) => Ok(row),
            // Raced another resolution of the same key; read theirs.
            Err(e) if matches!(e.sql_err(), Some(sea_orm::SqlErr::UniqueConstraintViolation(_))) => {
                warn!(account_number, bank_code, "counterparty upsert raced, rereading");
                self.find_row(organization_id, account_number, bank_code)
                    .await?
                    .ok_or_else(|| CounterpartyError::Database("upsert race lost row".to_string()))
            }
            Err(e) => Err(cp_db_err(e)),
        }
    }
}

/// Maps a counterparty row into the core domain type.
fn to_core_counterparty(row: &counterparties::Model) -> Counterparty {
    Counterparty {
        id: CounterpartyId::from_uuid(row.id),
        organization_id: OrganizationId::from_uuid(row.organization_id),
        account_number: row.account_number.clone(),
        bank_code: row.bank_code.clone(),
        account_name: row.account_name.clone(),
        bank_name: row.bank_name.clone(),
        bank_id: row.bank_id.clone(),
        is_recipient: row.is_recipient,
        created_at: row.created_at.to_utc(),
        updated_at: row.updated_at.to_utc(),
    }
}

fn provider_to_counterparty_err(e: ProviderError) -> CounterpartyError {
    match e {
        ProviderError::InvalidAccount {
            account_number,
            bank_code,
        } => CounterpartyError::InvalidAccount {
            account_number,
            bank_code,
        },
        ProviderError::Unavailable(msg) | ProviderError::InvalidResponse(msg) => {
            CounterpartyError::ProviderUnavailable(msg)
        }
    }
}

fn cp_db_err(e: DbErr) -> CounterpartyError {
    CounterpartyError::Database(e.to_string())
}
