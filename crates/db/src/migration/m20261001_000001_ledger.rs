//! Initial ledger migration.
//!
//! Creates the balance-bearing tables, the append-only record tables, their
//! constraints and indexes, and seeds the system categories.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: BALANCE-BEARING TABLES
        // ============================================================
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(GOALS_SQL).await?;
        db.execute_unprepared(DEBTS_SQL).await?;
        db.execute_unprepared(CATEGORIES_SQL).await?;
        db.execute_unprepared(BUDGETS_SQL).await?;
        db.execute_unprepared(SUBSCRIPTIONS_SQL).await?;

        // ============================================================
        // PART 3: APPEND-ONLY RECORDS
        // ============================================================
        db.execute_unprepared(EXPENSES_SQL).await?;
        db.execute_unprepared(REVENUES_SQL).await?;
        db.execute_unprepared(CONTRIBUTIONS_SQL).await?;
        db.execute_unprepared(REPAYMENTS_SQL).await?;
        db.execute_unprepared(TRANSFERS_SQL).await?;

        // ============================================================
        // PART 4: TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        // ============================================================
        // PART 5: SEED DATA
        // ============================================================
        db.execute_unprepared(SEED_CATEGORIES_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE debt_direction AS ENUM ('owed_by_me', 'owed_to_me');

CREATE TYPE debt_status AS ENUM ('active', 'completed', 'overdue');

CREATE TYPE transfer_type AS ENUM (
    'account_to_goal',
    'goal_to_account',
    'account_to_account'
);
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id              UUID PRIMARY KEY,
    owner_id        UUID NOT NULL,
    name            VARCHAR(100) NOT NULL,
    balance         NUMERIC(19, 4) NOT NULL DEFAULT 0,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_accounts_owner ON accounts(owner_id);
";

const GOALS_SQL: &str = r"
CREATE TABLE goals (
    id              UUID PRIMARY KEY,
    owner_id        UUID NOT NULL,
    name            VARCHAR(100) NOT NULL,
    target_amount   NUMERIC(19, 4) NOT NULL,
    current_amount  NUMERIC(19, 4) NOT NULL DEFAULT 0,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_goal_target_positive CHECK (target_amount > 0),
    CONSTRAINT chk_goal_current_non_negative CHECK (current_amount >= 0)
);

CREATE INDEX idx_goals_owner ON goals(owner_id);
";

const DEBTS_SQL: &str = r"
CREATE TABLE debts (
    id              UUID PRIMARY KEY,
    owner_id        UUID NOT NULL,
    counterparty    VARCHAR(200) NOT NULL,
    direction       debt_direction NOT NULL,
    principal       NUMERIC(19, 4) NOT NULL,
    remaining       NUMERIC(19, 4) NOT NULL DEFAULT 0,
    status          debt_status NOT NULL DEFAULT 'active',
    due_date        DATE,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_debt_principal_positive CHECK (principal > 0),
    CONSTRAINT chk_debt_remaining_non_negative CHECK (remaining >= 0),
    CONSTRAINT chk_debt_remaining_within_principal CHECK (remaining <= principal)
);

CREATE INDEX idx_debts_owner ON debts(owner_id);
CREATE INDEX idx_debts_due ON debts(due_date) WHERE status = 'active';
";

const CATEGORIES_SQL: &str = r"
CREATE TABLE categories (
    id              UUID PRIMARY KEY,
    owner_id        UUID,
    name            VARCHAR(100) NOT NULL,
    is_system       BOOLEAN NOT NULL DEFAULT false,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_category_system_unowned CHECK (NOT is_system OR owner_id IS NULL)
);

CREATE INDEX idx_categories_owner ON categories(owner_id);
";

const BUDGETS_SQL: &str = r"
CREATE TABLE budgets (
    id                  UUID PRIMARY KEY,
    owner_id            UUID NOT NULL,
    category_id         UUID NOT NULL REFERENCES categories(id),
    month               CHAR(7) NOT NULL,
    cap_amount          NUMERIC(19, 4) NOT NULL,
    remaining_amount    NUMERIC(19, 4) NOT NULL,
    created_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_budget_owner_category_month UNIQUE (owner_id, category_id, month),
    CONSTRAINT chk_budget_month_format CHECK (month ~ '^[0-9]{4}-(0[1-9]|1[0-2])$'),
    CONSTRAINT chk_budget_cap_non_negative CHECK (cap_amount >= 0)
);
";

const SUBSCRIPTIONS_SQL: &str = r"
CREATE TABLE subscriptions (
    id              UUID PRIMARY KEY,
    owner_id        UUID NOT NULL,
    name            VARCHAR(100) NOT NULL,
    amount          NUMERIC(19, 4) NOT NULL,
    frequency       VARCHAR(20) NOT NULL DEFAULT 'monthly',
    next_due_date   DATE NOT NULL,
    account_id      UUID REFERENCES accounts(id) ON DELETE SET NULL,
    auto_renew      BOOLEAN NOT NULL DEFAULT true,
    is_active       BOOLEAN NOT NULL DEFAULT true,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_subscription_amount_positive CHECK (amount > 0)
);

CREATE INDEX idx_subscriptions_due ON subscriptions(next_due_date)
    WHERE is_active AND auto_renew;
";

const EXPENSES_SQL: &str = r"
CREATE TABLE expenses (
    id                  UUID PRIMARY KEY,
    owner_id            UUID NOT NULL,
    amount              NUMERIC(19, 4) NOT NULL,
    expense_date        DATE NOT NULL,
    category_id         UUID NOT NULL REFERENCES categories(id),
    account_id          UUID NOT NULL REFERENCES accounts(id),
    goal_id             UUID REFERENCES goals(id),
    goal_drawdown       NUMERIC(19, 4) NOT NULL DEFAULT 0,
    budget_id           UUID REFERENCES budgets(id) ON DELETE SET NULL,
    subscription_id     UUID REFERENCES subscriptions(id) ON DELETE SET NULL,
    description         TEXT NOT NULL,
    created_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_expense_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_expense_drawdown_bounded CHECK (goal_drawdown >= 0 AND goal_drawdown <= amount),
    CONSTRAINT chk_expense_drawdown_needs_goal CHECK (goal_drawdown = 0 OR goal_id IS NOT NULL)
);

CREATE INDEX idx_expenses_owner_date ON expenses(owner_id, expense_date);
CREATE INDEX idx_expenses_account ON expenses(account_id);
CREATE INDEX idx_expenses_subscription ON expenses(subscription_id)
    WHERE subscription_id IS NOT NULL;
";

const REVENUES_SQL: &str = r"
CREATE TABLE revenues (
    id              UUID PRIMARY KEY,
    owner_id        UUID NOT NULL,
    amount          NUMERIC(19, 4) NOT NULL,
    revenue_date    DATE NOT NULL,
    account_id      UUID NOT NULL REFERENCES accounts(id),
    description     TEXT NOT NULL,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_revenue_amount_positive CHECK (amount > 0)
);

CREATE INDEX idx_revenues_owner_date ON revenues(owner_id, revenue_date);
";

const CONTRIBUTIONS_SQL: &str = r"
CREATE TABLE contributions (
    id              UUID PRIMARY KEY,
    owner_id        UUID NOT NULL,
    goal_id         UUID NOT NULL REFERENCES goals(id),
    account_id      UUID REFERENCES accounts(id),
    amount          NUMERIC(19, 4) NOT NULL,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_contribution_amount_positive CHECK (amount > 0)
);

CREATE INDEX idx_contributions_goal ON contributions(goal_id);
";

const REPAYMENTS_SQL: &str = r"
CREATE TABLE repayments (
    id              UUID PRIMARY KEY,
    owner_id        UUID NOT NULL,
    debt_id         UUID NOT NULL REFERENCES debts(id),
    account_id      UUID REFERENCES accounts(id),
    amount          NUMERIC(19, 4) NOT NULL,
    paid_on         DATE NOT NULL,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_repayment_amount_positive CHECK (amount > 0)
);

CREATE INDEX idx_repayments_debt ON repayments(debt_id);
";

const TRANSFERS_SQL: &str = r"
CREATE TABLE transfers (
    id              UUID PRIMARY KEY,
    owner_id        UUID NOT NULL,
    transfer_type   transfer_type NOT NULL,
    source_id       UUID NOT NULL,
    destination_id  UUID NOT NULL,
    amount          NUMERIC(19, 4) NOT NULL,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_transfer_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_transfer_distinct_endpoints CHECK (source_id <> destination_id)
);

CREATE INDEX idx_transfers_owner ON transfers(owner_id, created_at);
";

const TRIGGERS_SQL: &str = r"
CREATE OR REPLACE FUNCTION touch_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = NOW();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_accounts_updated_at BEFORE UPDATE ON accounts
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_goals_updated_at BEFORE UPDATE ON goals
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_debts_updated_at BEFORE UPDATE ON debts
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_budgets_updated_at BEFORE UPDATE ON budgets
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_subscriptions_updated_at BEFORE UPDATE ON subscriptions
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
";

// Id must match `entities::categories::SUBSCRIPTIONS_CATEGORY_ID`.
const SEED_CATEGORIES_SQL: &str = r"
INSERT INTO categories (id, owner_id, name, is_system)
VALUES ('01920000-0000-7000-8000-000000000001', NULL, 'Subscriptions', true)
ON CONFLICT (id) DO NOTHING;
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS transfers CASCADE;
DROP TABLE IF EXISTS repayments CASCADE;
DROP TABLE IF EXISTS contributions CASCADE;
DROP TABLE IF EXISTS revenues CASCADE;
DROP TABLE IF EXISTS expenses CASCADE;
DROP TABLE IF EXISTS subscriptions CASCADE;
DROP TABLE IF EXISTS budgets CASCADE;
DROP TABLE IF EXISTS categories CASCADE;
DROP TABLE IF EXISTS debts CASCADE;
DROP TABLE IF EXISTS goals CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;

DROP FUNCTION IF EXISTS touch_updated_at() CASCADE;

DROP TYPE IF EXISTS transfer_type;
DROP TYPE IF EXISTS debt_status;
DROP TYPE IF EXISTS debt_direction;
";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::categories::SUBSCRIPTIONS_CATEGORY_ID;

    #[test]
    fn test_seeded_subscriptions_category_matches_constant() {
        assert!(SEED_CATEGORIES_SQL.contains(&SUBSCRIPTIONS_CATEGORY_ID.to_string()));
    }

    #[test]
    fn test_debt_cap_is_enforced_by_schema() {
        assert!(DEBTS_SQL.contains("CHECK (remaining <= principal)"));
    }
}
