//! Initial schema for the ledger and transfer reconciliation engine.
//!
//! Creates organizations, users, wallets, projects, budgets, ledger
//! entries, approval rules/requests/reviews, transfer policies,
//! counterparties, and payroll payouts.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(INITIAL_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const INITIAL_SQL: &str = r"
-- Enum types
CREATE TYPE entry_type AS ENUM ('debit', 'credit');
CREATE TYPE entry_status AS ENUM ('pending', 'successful', 'failed');
CREATE TYPE entry_scope AS ENUM (
    'wallet_transfer', 'budget_transfer', 'budget_funding',
    'budget_closure', 'budget_extension', 'payroll_payout'
);
CREATE TYPE budget_status AS ENUM ('pending', 'active', 'paused', 'closed');
CREATE TYPE workflow_type AS ENUM ('expense', 'transaction', 'budget_extension', 'payroll');
CREATE TYPE approval_type AS ENUM ('everyone', 'anyone');
CREATE TYPE review_status AS ENUM ('pending', 'approved', 'declined');
CREATE TYPE request_status AS ENUM ('pending', 'approved', 'declined');
CREATE TYPE policy_kind AS ENUM ('calendar', 'spend_limit', 'invoice');
CREATE TYPE policy_window AS ENUM ('daily', 'weekly', 'monthly');
CREATE TYPE payroll_status AS ENUM ('pending', 'approved', 'processing', 'paid');

-- Users
CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    email VARCHAR(255) NOT NULL UNIQUE,
    full_name VARCHAR(255) NOT NULL,
    department VARCHAR(100),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Organizations
CREATE TABLE organizations (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    owner_user_id UUID NOT NULL REFERENCES users(id),
    base_currency VARCHAR(3) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Wallets: balance is mutated only via conditional updates and can never
-- go negative; the CHECK is the last line of defense behind the CAS.
CREATE TABLE wallets (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    currency VARCHAR(3) NOT NULL,
    balance BIGINT NOT NULL DEFAULT 0,
    ledger_balance BIGINT NOT NULL DEFAULT 0,
    is_primary BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_wallet_balance_non_negative CHECK (balance >= 0)
);

CREATE INDEX idx_wallets_org ON wallets(organization_id);
CREATE UNIQUE INDEX idx_wallets_org_primary
    ON wallets(organization_id, currency) WHERE is_primary;

-- Projects
CREATE TABLE projects (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    balance BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_project_balance_non_negative CHECK (balance >= 0)
);

-- Budgets
CREATE TABLE budgets (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    wallet_id UUID NOT NULL REFERENCES wallets(id),
    project_id UUID REFERENCES projects(id),
    name VARCHAR(255) NOT NULL,
    currency VARCHAR(3) NOT NULL,
    amount BIGINT NOT NULL,
    balance BIGINT NOT NULL DEFAULT 0,
    amount_used BIGINT NOT NULL DEFAULT 0,
    status budget_status NOT NULL DEFAULT 'pending',
    threshold BIGINT,
    created_by UUID NOT NULL REFERENCES users(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_budget_balance_non_negative CHECK (balance >= 0),
    CONSTRAINT chk_budget_balance_within_amount CHECK (balance <= amount)
);

CREATE INDEX idx_budgets_org_status ON budgets(organization_id, status);
CREATE INDEX idx_budgets_wallet ON budgets(wallet_id);

-- Budget beneficiaries
CREATE TABLE budget_beneficiaries (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    budget_id UUID NOT NULL REFERENCES budgets(id) ON DELETE CASCADE,
    user_id UUID NOT NULL REFERENCES users(id),
    allocation BIGINT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_budget_beneficiary UNIQUE (budget_id, user_id),
    CONSTRAINT chk_allocation_positive CHECK (allocation IS NULL OR allocation > 0)
);

-- Wallet entries: one row per balance-affecting event. The unique
-- reference index is the idempotency key for settlement lookups and
-- duplicate submissions.
CREATE TABLE wallet_entries (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    wallet_id UUID NOT NULL REFERENCES wallets(id),
    budget_id UUID REFERENCES budgets(id),
    project_id UUID REFERENCES projects(id),
    payroll_payout_id UUID,
    entry_type entry_type NOT NULL,
    status entry_status NOT NULL DEFAULT 'pending',
    scope entry_scope NOT NULL,
    amount BIGINT NOT NULL,
    fee BIGINT NOT NULL DEFAULT 0,
    currency VARCHAR(3) NOT NULL,
    balance_before BIGINT NOT NULL,
    balance_after BIGINT NOT NULL,
    ledger_balance_before BIGINT NOT NULL,
    ledger_balance_after BIGINT NOT NULL,
    reference VARCHAR(100) NOT NULL,
    provider_ref VARCHAR(100),
    narration TEXT,
    meta JSONB NOT NULL DEFAULT '{}',
    reverses UUID REFERENCES wallet_entries(id),
    reversed_at TIMESTAMPTZ,
    settled_at TIMESTAMPTZ,
    gateway_response TEXT,
    created_by UUID REFERENCES users(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_entry_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_entry_fee_non_negative CHECK (fee >= 0)
);

CREATE UNIQUE INDEX idx_entries_reference ON wallet_entries(reference);
CREATE INDEX idx_entries_wallet ON wallet_entries(wallet_id, created_at DESC);
CREATE INDEX idx_entries_budget ON wallet_entries(budget_id, created_at DESC)
    WHERE budget_id IS NOT NULL;

-- Requery scan: pending entries with a provider ref, oldest first
CREATE INDEX idx_entries_pending_requery
    ON wallet_entries(created_at)
    WHERE status = 'pending' AND provider_ref IS NOT NULL;

-- Duplicate-submission window scan
CREATE INDEX idx_entries_duplicate_window
    ON wallet_entries(organization_id, created_by, amount, created_at DESC);

-- Spend-limit window sums
CREATE INDEX idx_entries_spend_window
    ON wallet_entries(created_by, status, created_at DESC);

-- Approval rules
CREATE TABLE approval_rules (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    workflow_type workflow_type NOT NULL,
    approval_type approval_type NOT NULL,
    amount BIGINT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_rule_amount_positive CHECK (amount > 0)
);

CREATE INDEX idx_rules_org_workflow ON approval_rules(organization_id, workflow_type);

CREATE TABLE approval_rule_reviewers (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    approval_rule_id UUID NOT NULL REFERENCES approval_rules(id) ON DELETE CASCADE,
    user_id UUID NOT NULL REFERENCES users(id),
    position SMALLINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_rule_reviewer UNIQUE (approval_rule_id, user_id)
);

-- Approval requests
CREATE TABLE approval_requests (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    workflow_type workflow_type NOT NULL,
    requester UUID NOT NULL REFERENCES users(id),
    approval_rule_id UUID NOT NULL REFERENCES approval_rules(id),
    approval_type approval_type NOT NULL,
    status request_status NOT NULL DEFAULT 'pending',
    properties JSONB NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    resolved_at TIMESTAMPTZ
);

CREATE INDEX idx_requests_org_status ON approval_requests(organization_id, status);

CREATE TABLE approval_reviews (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    approval_request_id UUID NOT NULL REFERENCES approval_requests(id) ON DELETE CASCADE,
    reviewer UUID NOT NULL REFERENCES users(id),
    status review_status NOT NULL DEFAULT 'pending',
    reason TEXT,
    reviewed_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_request_reviewer UNIQUE (approval_request_id, reviewer)
);

-- Transfer policies
CREATE TABLE transfer_policies (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    kind policy_kind NOT NULL,
    days_of_week JSONB,
    time_window policy_window,
    amount BIGINT,
    department VARCHAR(100),
    budget_id UUID REFERENCES budgets(id),
    recipient_bank_code VARCHAR(20),
    recipient_account_number VARCHAR(30),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_spend_limit_fields CHECK (
        kind != 'spend_limit' OR (time_window IS NOT NULL AND amount IS NOT NULL)
    ),
    CONSTRAINT chk_calendar_fields CHECK (
        kind != 'calendar' OR days_of_week IS NOT NULL
    )
);

CREATE INDEX idx_policies_org ON transfer_policies(organization_id);

-- Counterparty cache, keyed by (org, account number, bank code)
CREATE TABLE counterparties (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    account_number VARCHAR(30) NOT NULL,
    bank_code VARCHAR(20) NOT NULL,
    account_name VARCHAR(255) NOT NULL,
    bank_name VARCHAR(255),
    bank_id VARCHAR(100),
    is_recipient BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_counterparty UNIQUE (organization_id, account_number, bank_code)
);

CREATE INDEX idx_counterparties_recipients
    ON counterparties(organization_id, created_at DESC) WHERE is_recipient;

-- Payroll payout batches
CREATE TABLE payroll_payouts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
    wallet_id UUID NOT NULL REFERENCES wallets(id),
    period VARCHAR(20) NOT NULL,
    status payroll_status NOT NULL DEFAULT 'pending',
    total_amount BIGINT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_payroll_total_positive CHECK (total_amount > 0)
);
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS payroll_payouts CASCADE;
DROP TABLE IF EXISTS counterparties CASCADE;
DROP TABLE IF EXISTS transfer_policies CASCADE;
DROP TABLE IF EXISTS approval_reviews CASCADE;
DROP TABLE IF EXISTS approval_requests CASCADE;
DROP TABLE IF EXISTS approval_rule_reviewers CASCADE;
DROP TABLE IF EXISTS approval_rules CASCADE;
DROP TABLE IF EXISTS wallet_entries CASCADE;
DROP TABLE IF EXISTS budget_beneficiaries CASCADE;
DROP TABLE IF EXISTS budgets CASCADE;
DROP TABLE IF EXISTS projects CASCADE;
DROP TABLE IF EXISTS wallets CASCADE;
DROP TABLE IF EXISTS organizations CASCADE;
DROP TABLE IF EXISTS users CASCADE;
DROP TYPE IF EXISTS payroll_status;
DROP TYPE IF EXISTS policy_window;
DROP TYPE IF EXISTS policy_kind;
DROP TYPE IF EXISTS request_status;
DROP TYPE IF EXISTS review_status;
DROP TYPE IF EXISTS approval_type;
DROP TYPE IF EXISTS workflow_type;
DROP TYPE IF EXISTS budget_status;
DROP TYPE IF EXISTS entry_scope;
DROP TYPE IF EXISTS entry_status;
DROP TYPE IF EXISTS entry_type;
";
