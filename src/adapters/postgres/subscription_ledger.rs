//! PostgreSQL implementation of SubscriptionLedger.
//!
//! The `natural_key` column carries a UNIQUE constraint; `append` relies on
//! `ON CONFLICT DO NOTHING` so concurrent duplicate deliveries store one row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{BillingProvider, LedgerEntry, LedgerEventType, OccurredAtSource};
use crate::domain::foundation::{
    normalize_email, DomainError, EntryId, ErrorCode, Timestamp, ValidationError,
};
use crate::ports::{AppendResult, SubscriptionLedger};

pub struct PostgresSubscriptionLedger {
    pool: PgPool,
}

impl PostgresSubscriptionLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a ledger entry.
#[derive(Debug, sqlx::FromRow)]
struct LedgerRow {
    id: Uuid,
    provider: String,
    event_type: String,
    provider_reference: String,
    customer_email: String,
    amount: Option<i64>,
    currency: Option<String>,
    status: String,
    occurred_at: DateTime<Utc>,
    occurred_at_source: String,
    recorded_at: DateTime<Utc>,
    raw_payload: serde_json::Value,
}

impl TryFrom<LedgerRow> for LedgerEntry {
    type Error = DomainError;

    fn try_from(row: LedgerRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |field: &str, e: ValidationError| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid {} in ledger row {}: {}", field, id, e),
            )
        };

        Ok(LedgerEntry {
            id: EntryId::from_uuid(id),
            provider: row
                .provider
                .parse::<BillingProvider>()
                .map_err(|e| corrupt("provider", e))?,
            event_type: row
                .event_type
                .parse::<LedgerEventType>()
                .map_err(|e| corrupt("event_type", e))?,
            occurred_at_source: row
                .occurred_at_source
                .parse::<OccurredAtSource>()
                .map_err(|e| corrupt("occurred_at_source", e))?,
            provider_reference: row.provider_reference,
            customer_email: row.customer_email,
            amount: row.amount,
            currency: row.currency,
            status: row.status,
            occurred_at: Timestamp::from_datetime(row.occurred_at),
            recorded_at: Timestamp::from_datetime(row.recorded_at),
            raw_payload: row.raw_payload,
        })
    }
}

#[async_trait]
impl SubscriptionLedger for PostgresSubscriptionLedger {
    async fn append(&self, entry: LedgerEntry) -> Result<AppendResult, DomainError> {
        let natural_key = entry.natural_key().to_string();

        let inserted: Option<(Uuid,)> = sqlx::query_as(
            r#"
            INSERT INTO subscription_ledger (
                id, natural_key, provider, event_type, provider_reference, customer_email,
                amount, currency, status, occurred_at, occurred_at_source, recorded_at, raw_payload
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (natural_key) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(&natural_key)
        .bind(entry.provider.as_str())
        .bind(entry.event_type.as_str())
        .bind(&entry.provider_reference)
        .bind(&entry.customer_email)
        .bind(entry.amount)
        .bind(&entry.currency)
        .bind(&entry.status)
        .bind(entry.occurred_at.as_datetime())
        .bind(entry.occurred_at_source.as_str())
        .bind(entry.recorded_at.as_datetime())
        .bind(&entry.raw_payload)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to append ledger entry: {}", e)))?;

        if let Some((id,)) = inserted {
            return Ok(AppendResult::Inserted(EntryId::from_uuid(id)));
        }

        let (existing,): (Uuid,) =
            sqlx::query_as("SELECT id FROM subscription_ledger WHERE natural_key = $1")
                .bind(&natural_key)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::database(format!("Failed to load existing ledger entry: {}", e))
                })?;

        Ok(AppendResult::AlreadyRecorded(EntryId::from_uuid(existing)))
    }

    async fn query_by_email(
        &self,
        email: &str,
        limit: usize,
    ) -> Result<Vec<LedgerEntry>, DomainError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows: Vec<LedgerRow> = sqlx::query_as(
            r#"
            SELECT id, provider, event_type, provider_reference, customer_email, amount,
                   currency, status, occurred_at, occurred_at_source, recorded_at, raw_payload
            FROM subscription_ledger
            WHERE customer_email = $1
            ORDER BY occurred_at DESC, recorded_at DESC
            LIMIT $2
            "#,
        )
        .bind(normalize_email(email))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to query ledger: {}", e)))?;

        rows.into_iter().map(LedgerEntry::try_from).collect()
    }

    async fn latest_of_types(
        &self,
        email: &str,
        event_types: &[LedgerEventType],
    ) -> Result<Option<LedgerEntry>, DomainError> {
        let types: Vec<String> = event_types.iter().map(|t| t.as_str().to_string()).collect();

        let row: Option<LedgerRow> = sqlx::query_as(
            r#"
            SELECT id, provider, event_type, provider_reference, customer_email, amount,
                   currency, status, occurred_at, occurred_at_source, recorded_at, raw_payload
            FROM subscription_ledger
            WHERE customer_email = $1 AND event_type = ANY($2)
            ORDER BY occurred_at DESC, recorded_at DESC
            LIMIT 1
            "#,
        )
        .bind(normalize_email(email))
        .bind(types)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to query ledger: {}", e)))?;

        row.map(LedgerEntry::try_from).transpose()
    }
}
