//! Database seeder for Velora development and testing.
//!
//! Seeds a test organization with an owner, a reviewer, a funded primary
//! wallet, a pending budget, an approval rule, and a weekend-block policy.
//!
//! Usage: cargo run --bin seeder

use chrono::{Utc, Weekday};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use velora_db::entities::{
    approval_rule_reviewers, approval_rules, budget_beneficiaries, budgets, organizations,
    transfer_policies, users, wallets,
    sea_orm_active_enums::{ApprovalType, BudgetStatus, PolicyKind, WorkflowType},
};
use velora_db::repositories::policy::weekdays_to_json;

/// Test organization ID (consistent for all seeds)
const TEST_ORG_ID: &str = "00000000-0000-0000-0000-000000000001";
/// Test owner ID (consistent for all seeds)
const TEST_OWNER_ID: &str = "00000000-0000-0000-0000-000000000002";
/// Test reviewer ID (consistent for all seeds)
const TEST_REVIEWER_ID: &str = "00000000-0000-0000-0000-000000000003";
/// Test wallet ID (consistent for all seeds)
const TEST_WALLET_ID: &str = "00000000-0000-0000-0000-000000000004";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = velora_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding users...");
    seed_users(&db).await;

    println!("Seeding organization...");
    seed_organization(&db).await;

    println!("Seeding wallet...");
    seed_wallet(&db).await;

    println!("Seeding budget...");
    seed_budget(&db).await;

    println!("Seeding approval rule...");
    seed_approval_rule(&db).await;

    println!("Seeding transfer policy...");
    seed_policy(&db).await;

    println!("Seeding complete!");
}

fn id(s: &str) -> Uuid {
    Uuid::parse_str(s).unwrap()
}

async fn seed_users(db: &DatabaseConnection) {
    for (user_id, email, name) in [
        (TEST_OWNER_ID, "owner@velora.dev", "Test Owner"),
        (TEST_REVIEWER_ID, "reviewer@velora.dev", "Test Reviewer"),
    ] {
        if users::Entity::find_by_id(id(user_id))
            .one(db)
            .await
            .ok()
            .flatten()
            .is_some()
        {
            println!("  User {email} already exists, skipping...");
            continue;
        }

        let user = users::ActiveModel {
            id: Set(id(user_id)),
            email: Set(email.to_string()),
            full_name: Set(name.to_string()),
            department: Set(Some("finance".to_string())),
            created_at: Set(Utc::now().into()),
            updated_at: Set(Utc::now().into()),
        };

        if let Err(e) = user.insert(db).await {
            eprintln!("Failed to insert user {email}: {e}");
        } else {
            println!("  Created user: {email}");
        }
    }
}

async fn seed_organization(db: &DatabaseConnection) {
    if organizations::Entity::find_by_id(id(TEST_ORG_ID))
        .one(db)
        .await
        .ok()
        .flatten()
        .is_some()
    {
        println!("  Organization already exists, skipping...");
        return;
    }

    let org = organizations::ActiveModel {
        id: Set(id(TEST_ORG_ID)),
        name: Set("Velora Test Org".to_string()),
        owner_user_id: Set(id(TEST_OWNER_ID)),
        base_currency: Set("NGN".to_string()),
        created_at: Set(Utc::now().into()),
        updated_at: Set(Utc::now().into()),
    };

    if let Err(e) = org.insert(db).await {
        eprintln!("Failed to insert organization: {e}");
    } else {
        println!("  Created organization: Velora Test Org");
    }
}

async fn seed_wallet(db: &DatabaseConnection) {
    if wallets::Entity::find_by_id(id(TEST_WALLET_ID))
        .one(db)
        .await
        .ok()
        .flatten()
        .is_some()
    {
        println!("  Wallet already exists, skipping...");
        return;
    }

    // 10,000,000.00 NGN in kobo
    let wallet = wallets::ActiveModel {
        id: Set(id(TEST_WALLET_ID)),
        organization_id: Set(id(TEST_ORG_ID)),
        currency: Set("NGN".to_string()),
        balance: Set(1_000_000_000),
        ledger_balance: Set(1_000_000_000),
        is_primary: Set(true),
        created_at: Set(Utc::now().into()),
        updated_at: Set(Utc::now().into()),
    };

    if let Err(e) = wallet.insert(db).await {
        eprintln!("Failed to insert wallet: {e}");
    } else {
        println!("  Created primary NGN wallet");
    }
}

async fn seed_budget(db: &DatabaseConnection) {
    let budget_id = Uuid::new_v4();
    let budget = budgets::ActiveModel {
        id: Set(budget_id),
        organization_id: Set(id(TEST_ORG_ID)),
        wallet_id: Set(id(TEST_WALLET_ID)),
        project_id: Set(None),
        name: Set("Marketing".to_string()),
        currency: Set("NGN".to_string()),
        amount: Set(20_000_000),
        balance: Set(0),
        amount_used: Set(0),
        status: Set(BudgetStatus::Pending),
        threshold: Set(Some(2_000_000)),
        created_by: Set(id(TEST_REVIEWER_ID)),
        created_at: Set(Utc::now().into()),
        updated_at: Set(Utc::now().into()),
    };

    if let Err(e) = budget.insert(db).await {
        eprintln!("Failed to insert budget: {e}");
        return;
    }

    let beneficiary = budget_beneficiaries::ActiveModel {
        id: Set(Uuid::new_v4()),
        budget_id: Set(budget_id),
        user_id: Set(id(TEST_REVIEWER_ID)),
        allocation: Set(Some(5_000_000)),
        created_at: Set(Utc::now().into()),
    };

    if let Err(e) = beneficiary.insert(db).await {
        eprintln!("Failed to insert beneficiary: {e}");
    } else {
        println!("  Created pending Marketing budget with one beneficiary");
    }
}

async fn seed_approval_rule(db: &DatabaseConnection) {
    let rule_id = Uuid::new_v4();
    let rule = approval_rules::ActiveModel {
        id: Set(rule_id),
        organization_id: Set(id(TEST_ORG_ID)),
        workflow_type: Set(WorkflowType::Transaction),
        approval_type: Set(ApprovalType::Everyone),
        amount: Set(50_000_000),
        created_at: Set(Utc::now().into()),
        updated_at: Set(Utc::now().into()),
    };

    if let Err(e) = rule.insert(db).await {
        eprintln!("Failed to insert approval rule: {e}");
        return;
    }

    for (position, user) in [TEST_OWNER_ID, TEST_REVIEWER_ID].iter().enumerate() {
        let reviewer = approval_rule_reviewers::ActiveModel {
            id: Set(Uuid::new_v4()),
            approval_rule_id: Set(rule_id),
            user_id: Set(id(user)),
            position: Set(i16::try_from(position).unwrap_or(0)),
            created_at: Set(Utc::now().into()),
        };
        if let Err(e) = reviewer.insert(db).await {
            eprintln!("Failed to insert rule reviewer: {e}");
        }
    }

    println!("  Created Everyone approval rule for transactions up to 500,000.00 NGN");
}

async fn seed_policy(db: &DatabaseConnection) {
    let policy = transfer_policies::ActiveModel {
        id: Set(Uuid::new_v4()),
        organization_id: Set(id(TEST_ORG_ID)),
        kind: Set(PolicyKind::Calendar),
        days_of_week: Set(Some(weekdays_to_json(&[Weekday::Sat, Weekday::Sun]))),
        time_window: Set(None),
        amount: Set(None),
        department: Set(None),
        budget_id: Set(None),
        recipient_bank_code: Set(None),
        recipient_account_number: Set(None),
        created_at: Set(Utc::now().into()),
        updated_at: Set(Utc::now().into()),
    };

    if let Err(e) = policy.insert(db).await {
        eprintln!("Failed to insert transfer policy: {e}");
    } else {
        println!("  Created weekend-block calendar policy");
    }
}
