//! Payout request repository

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use core_kernel::{Currency, Money};
use domain_payout::{PaymentMethod, PayoutRequest, PayoutStatus};

use crate::error::DatabaseError;

const PAYOUT_COLUMNS: &str = "id, payout_number, agent_id, currency, amount, status, notes, \
                              admin_notes, payment_method, payment_reference, processed_by, \
                              processed_at, settled_commissions, requested_at, paid_at, updated_at";

/// Repository for payout requests
#[derive(Debug, Clone)]
pub struct PayoutRepository {
    pool: PgPool,
}

impl PayoutRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a payout; a reused payout number surfaces as `DuplicateEntry`
    pub async fn insert(&self, payout: &PayoutRequest) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO payout_requests (
                id, payout_number, agent_id, currency, amount, status, notes,
                admin_notes, payment_method, payment_reference, processed_by,
                processed_at, settled_commissions, requested_at, paid_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16
            )
            "#,
        )
        .bind(Uuid::from(payout.id))
        .bind(&payout.payout_number)
        .bind(Uuid::from(payout.agent_id))
        .bind(payout.amount.currency().code())
        .bind(payout.amount.amount())
        .bind(payout.status.as_str())
        .bind(payout.notes.as_deref())
        .bind(payout.admin_notes.as_deref())
        .bind(payout.payment_method.map(|m| m.as_str()))
        .bind(payout.payment_reference.as_deref())
        .bind(payout.processed_by.map(Uuid::from))
        .bind(payout.processed_at)
        .bind(settled_to_db(payout.settled_commissions))
        .bind(payout.requested_at)
        .bind(payout.paid_at)
        .bind(payout.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<PayoutRow>, DatabaseError> {
        let sql = format!("SELECT {PAYOUT_COLUMNS} FROM payout_requests WHERE id = $1");
        let row = sqlx::query_as::<_, PayoutRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Payouts of one agent, newest first
    pub async fn list_by_agent(&self, agent_id: Uuid) -> Result<Vec<PayoutRow>, DatabaseError> {
        let sql = format!(
            "SELECT {PAYOUT_COLUMNS} FROM payout_requests WHERE agent_id = $1 \
             ORDER BY requested_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, PayoutRow>(&sql)
            .bind(agent_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Writes the decision columns if the stored status is still
    /// `expected_from`
    pub async fn save_transition(
        &self,
        payout: &PayoutRequest,
        expected_from: &str,
    ) -> Result<(), DatabaseError> {
        let id = Uuid::from(payout.id);
        let result = sqlx::query(
            r#"
            UPDATE payout_requests
            SET status = $2, admin_notes = $3, payment_method = $4, payment_reference = $5,
                processed_by = $6, processed_at = $7, paid_at = $8, updated_at = $9
            WHERE id = $1 AND status = $10
            "#,
        )
        .bind(id)
        .bind(payout.status.as_str())
        .bind(payout.admin_notes.as_deref())
        .bind(payout.payment_method.map(|m| m.as_str()))
        .bind(payout.payment_reference.as_deref())
        .bind(payout.processed_by.map(Uuid::from))
        .bind(payout.processed_at)
        .bind(payout.paid_at)
        .bind(payout.updated_at)
        .bind(expected_from)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }
        match self.get(id).await? {
            None => Err(DatabaseError::not_found("PayoutRequest", id)),
            Some(current) => Err(DatabaseError::StaleState(format!(
                "payout {} is {}, expected {}",
                current.payout_number, current.status, expected_from
            ))),
        }
    }

    pub async fn record_settlement(&self, id: Uuid, settled: u64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE payout_requests SET settled_commissions = $2 WHERE id = $1")
            .bind(id)
            .bind(settled_to_db(settled))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}

fn settled_to_db(settled: u64) -> i64 {
    i64::try_from(settled).unwrap_or(i64::MAX)
}

/// Row type for `payout_requests`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PayoutRow {
    pub id: Uuid,
    pub payout_number: String,
    pub agent_id: Uuid,
    pub currency: String,
    pub amount: Decimal,
    pub status: String,
    pub notes: Option<String>,
    pub admin_notes: Option<String>,
    pub payment_method: Option<String>,
    pub payment_reference: Option<String>,
    pub processed_by: Option<Uuid>,
    pub processed_at: Option<DateTime<Utc>>,
    pub settled_commissions: i64,
    pub requested_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PayoutRow> for PayoutRequest {
    type Error = DatabaseError;

    fn try_from(row: PayoutRow) -> Result<Self, Self::Error> {
        let currency: Currency = row
            .currency
            .parse()
            .map_err(|_| DatabaseError::corrupt("currency", &row.currency))?;
        let status: PayoutStatus = row
            .status
            .parse()
            .map_err(|_| DatabaseError::corrupt("payout status", &row.status))?;
        let payment_method = match row.payment_method.as_deref() {
            Some(method) => Some(
                method
                    .parse::<PaymentMethod>()
                    .map_err(|_| DatabaseError::corrupt("payment method", method))?,
            ),
            None => None,
        };

        Ok(PayoutRequest {
            id: row.id.into(),
            payout_number: row.payout_number,
            agent_id: row.agent_id.into(),
            amount: Money::new(row.amount, currency),
            status,
            notes: row.notes,
            admin_notes: row.admin_notes,
            payment_method,
            payment_reference: row.payment_reference,
            processed_by: row.processed_by.map(Into::into),
            processed_at: row.processed_at,
            settled_commissions: u64::try_from(row.settled_commissions).unwrap_or(0),
            requested_at: row.requested_at,
            paid_at: row.paid_at,
            updated_at: row.updated_at,
        })
    }
}
