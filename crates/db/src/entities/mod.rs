//! `SeaORM` entity definitions.

pub mod approval_requests;
pub mod approval_reviews;
pub mod approval_rule_reviewers;
pub mod approval_rules;
pub mod budget_beneficiaries;
pub mod budgets;
pub mod counterparties;
pub mod organizations;
pub mod payroll_payouts;
pub mod projects;
pub mod sea_orm_active_enums;
pub mod transfer_policies;
pub mod users;
pub mod wallet_entries;
pub mod wallets;
