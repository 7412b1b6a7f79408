//! Commission record repository

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use core_kernel::{Currency, Money};
use domain_commission::{CommissionRecord, CommissionStatus, RuleKind, RuleTier};

use crate::error::DatabaseError;

const RECORD_COLUMNS: &str = "id, application_id, agent_id, course_id, university_id, rule_id, \
                              currency, base_amount, amount, kind, value, priority_used, status, \
                              approved_by, approved_at, paid_at, created_at, updated_at";

/// Repository for commission records
#[derive(Debug, Clone)]
pub struct RecordRepository {
    pool: PgPool,
}

impl RecordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a record; a second record for the same application violates
    /// the unique constraint and surfaces as `DuplicateEntry`
    pub async fn insert(&self, record: &CommissionRecord) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO commission_records (
                id, application_id, agent_id, course_id, university_id, rule_id,
                currency, base_amount, amount, kind, value, priority_used, status,
                approved_by, approved_at, paid_at, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18
            )
            "#,
        )
        .bind(Uuid::from(record.id))
        .bind(Uuid::from(record.application_id))
        .bind(Uuid::from(record.agent_id))
        .bind(Uuid::from(record.course_id))
        .bind(Uuid::from(record.university_id))
        .bind(record.rule_id.map(Uuid::from))
        .bind(record.amount.currency().code())
        .bind(record.base_amount.amount())
        .bind(record.amount.amount())
        .bind(record.kind.map(|k| k.as_str()))
        .bind(record.value)
        .bind(record.priority_used.map(|t| t.priority()))
        .bind(record.status.as_str())
        .bind(record.approved_by.map(Uuid::from))
        .bind(record.approved_at)
        .bind(record.paid_at)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<RecordRow>, DatabaseError> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM commission_records WHERE id = $1");
        let row = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn find_by_application(
        &self,
        application_id: Uuid,
    ) -> Result<Option<RecordRow>, DatabaseError> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM commission_records WHERE application_id = $1");
        let row = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(application_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Records of one agent, oldest first, optionally narrowed to a status
    pub async fn list_by_agent(
        &self,
        agent_id: Uuid,
        status: Option<&str>,
    ) -> Result<Vec<RecordRow>, DatabaseError> {
        let sql = format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM commission_records
            WHERE agent_id = $1 AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY created_at ASC, id ASC
            "#
        );
        let rows = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(agent_id)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Writes the lifecycle columns if the stored status is still
    /// `expected_from`
    ///
    /// # Errors
    ///
    /// - `NotFound` if the record does not exist
    /// - `StaleState` if another writer moved the record first
    pub async fn save_transition(
        &self,
        record: &CommissionRecord,
        expected_from: &str,
    ) -> Result<(), DatabaseError> {
        let id = Uuid::from(record.id);
        let result = sqlx::query(
            r#"
            UPDATE commission_records
            SET status = $2, approved_by = $3, approved_at = $4, paid_at = $5, updated_at = $6
            WHERE id = $1 AND status = $7
            "#,
        )
        .bind(id)
        .bind(record.status.as_str())
        .bind(record.approved_by.map(Uuid::from))
        .bind(record.approved_at)
        .bind(record.paid_at)
        .bind(record.updated_at)
        .bind(expected_from)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }
        match self.get(id).await? {
            None => Err(DatabaseError::not_found("CommissionRecord", id)),
            Some(current) => Err(DatabaseError::StaleState(format!(
                "record {} is {}, expected {}",
                id, current.status, expected_from
            ))),
        }
    }

    /// Moves every approved record of the agent to paid in one statement
    pub async fn mark_paid_for_agent(
        &self,
        agent_id: Uuid,
        paid_at: DateTime<Utc>,
    ) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE commission_records
            SET status = 'paid', paid_at = $2, updated_at = $2
            WHERE agent_id = $1 AND status = 'approved'
            "#,
        )
        .bind(agent_id)
        .bind(paid_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

/// Row type for `commission_records`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecordRow {
    pub id: Uuid,
    pub application_id: Uuid,
    pub agent_id: Uuid,
    pub course_id: Uuid,
    pub university_id: Uuid,
    pub rule_id: Option<Uuid>,
    pub currency: String,
    pub base_amount: Decimal,
    pub amount: Decimal,
    pub kind: Option<String>,
    pub value: Decimal,
    pub priority_used: Option<i16>,
    pub status: String,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<RecordRow> for CommissionRecord {
    type Error = DatabaseError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        let currency: Currency = row
            .currency
            .trim()
            .parse()
            .map_err(|_| DatabaseError::corrupt("currency", &row.currency))?;
        let status: CommissionStatus = row
            .status
            .parse()
            .map_err(|_| DatabaseError::corrupt("commission status", &row.status))?;
        let kind = row
            .kind
            .as_deref()
            .map(str::parse::<RuleKind>)
            .transpose()
            .map_err(|_| DatabaseError::corrupt("rule kind", row.kind.as_deref().unwrap_or("")))?;
        let priority_used = row
            .priority_used
            .map(|p| RuleTier::from_priority(p).ok_or_else(|| DatabaseError::corrupt("priority", p)))
            .transpose()?;

        Ok(CommissionRecord {
            id: row.id.into(),
            application_id: row.application_id.into(),
            agent_id: row.agent_id.into(),
            course_id: row.course_id.into(),
            university_id: row.university_id.into(),
            rule_id: row.rule_id.map(Into::into),
            base_amount: Money::new(row.base_amount, currency),
            amount: Money::new(row.amount, currency),
            kind,
            value: row.value,
            priority_used,
            status,
            approved_by: row.approved_by.map(Into::into),
            approved_at: row.approved_at,
            paid_at: row.paid_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
