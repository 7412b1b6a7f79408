//! Commission rule repository
//!
//! SQL access for the `commission_rules` table. Rows are mapped to and from
//! [`CommissionRule`] here; the adapter layer only handles port semantics.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use domain_commission::{CommissionRule, RuleFilter, RuleKind, RuleTier};

use crate::error::DatabaseError;

const RULE_COLUMNS: &str = "id, agent_id, university_id, course_id, kind, value, priority, \
                            active, description, created_at, updated_at";

/// Repository for commission rules
#[derive(Debug, Clone)]
pub struct RuleRepository {
    pool: PgPool,
}

impl RuleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Active rules that could apply to the enrollment, in creation order
    ///
    /// The tier decision is left to the resolver; this only narrows the
    /// table to rules whose scope overlaps the enrollment.
    pub async fn find_candidates(
        &self,
        agent_id: Uuid,
        university_id: Uuid,
        course_id: Uuid,
    ) -> Result<Vec<RuleRow>, DatabaseError> {
        let sql = format!(
            r#"
            SELECT {RULE_COLUMNS}
            FROM commission_rules
            WHERE active
              AND (agent_id IS NULL OR agent_id = $1)
              AND (course_id = $3 OR (course_id IS NULL AND university_id = $2))
            ORDER BY created_at ASC, id ASC
            "#
        );

        let rows = sqlx::query_as::<_, RuleRow>(&sql)
            .bind(agent_id)
            .bind(university_id)
            .bind(course_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<RuleRow>, DatabaseError> {
        let sql = format!("SELECT {RULE_COLUMNS} FROM commission_rules WHERE id = $1");
        let row = sqlx::query_as::<_, RuleRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn insert(&self, rule: &CommissionRule) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO commission_rules (
                id, agent_id, university_id, course_id, kind, value, priority,
                active, description, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(Uuid::from(rule.id))
        .bind(rule.agent_id.map(Uuid::from))
        .bind(rule.university_id.map(Uuid::from))
        .bind(rule.course_id.map(Uuid::from))
        .bind(rule.kind.as_str())
        .bind(rule.value)
        .bind(rule.priority.priority())
        .bind(rule.active)
        .bind(rule.description.as_deref())
        .bind(rule.created_at)
        .bind(rule.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates the mutable columns; scope and creation time never change
    pub async fn update(&self, rule: &CommissionRule) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE commission_rules
            SET kind = $2, value = $3, active = $4, description = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(Uuid::from(rule.id))
        .bind(rule.kind.as_str())
        .bind(rule.value)
        .bind(rule.active)
        .bind(rule.description.as_deref())
        .bind(rule.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn list(&self, filter: &RuleFilter) -> Result<Vec<RuleRow>, DatabaseError> {
        let rows = list_query(filter)
            .build_query_as::<RuleRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

/// Builds the filtered listing query, oldest rule first
fn list_query(filter: &RuleFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {RULE_COLUMNS} FROM commission_rules WHERE TRUE"));

    if let Some(agent_id) = filter.agent_id {
        qb.push(" AND agent_id = ").push_bind(Uuid::from(agent_id));
    }
    if let Some(university_id) = filter.university_id {
        qb.push(" AND university_id = ").push_bind(Uuid::from(university_id));
    }
    if let Some(course_id) = filter.course_id {
        qb.push(" AND course_id = ").push_bind(Uuid::from(course_id));
    }
    if let Some(priority) = filter.priority {
        qb.push(" AND priority = ").push_bind(priority.priority());
    }
    if let Some(active) = filter.active {
        qb.push(" AND active = ").push_bind(active);
    }

    qb.push(" ORDER BY created_at ASC, id ASC");
    qb
}

/// Row type for `commission_rules`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RuleRow {
    pub id: Uuid,
    pub agent_id: Option<Uuid>,
    pub university_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
    pub kind: String,
    pub value: Decimal,
    pub priority: i16,
    pub active: bool,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<RuleRow> for CommissionRule {
    type Error = DatabaseError;

    fn try_from(row: RuleRow) -> Result<Self, Self::Error> {
        let kind: RuleKind = row
            .kind
            .parse()
            .map_err(|_| DatabaseError::corrupt("rule kind", &row.kind))?;
        let priority = RuleTier::from_priority(row.priority)
            .ok_or_else(|| DatabaseError::corrupt("rule priority", row.priority))?;

        Ok(CommissionRule {
            id: row.id.into(),
            agent_id: row.agent_id.map(Into::into),
            university_id: row.university_id.map(Into::into),
            course_id: row.course_id.map(Into::into),
            kind,
            value: row.value,
            priority,
            active: row.active,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
