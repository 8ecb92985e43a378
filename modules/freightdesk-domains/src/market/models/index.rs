use anyhow::{bail, Result};
use chrono::{DateTime, NaiveDate, Utc};
use freightdesk_core::DomainError;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const DEFAULT_HISTORY_DAYS: i64 = 30;
const MAX_HISTORY_DAYS: i64 = 3650;

/// A published freight rate index (e.g. a container spot rate).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MarketIndex {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub unit: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct IndexPoint {
    pub index_id: Uuid,
    pub recorded_on: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct SnapshotRow {
    code: String,
    name: String,
    unit: Option<String>,
    recorded_on: NaiveDate,
    value: f64,
    previous_recorded_on: Option<NaiveDate>,
    previous_value: Option<f64>,
}

/// Latest value of an index with its movement since the previous point.
#[derive(Debug, Clone, Serialize)]
pub struct IndexSnapshot {
    pub code: String,
    pub name: String,
    pub unit: Option<String>,
    pub recorded_on: NaiveDate,
    pub value: f64,
    pub previous_recorded_on: Option<NaiveDate>,
    pub previous_value: Option<f64>,
    pub change: Option<f64>,
    pub change_pct: Option<f64>,
}

impl From<SnapshotRow> for IndexSnapshot {
    fn from(row: SnapshotRow) -> Self {
        let change = row.previous_value.map(|prev| row.value - prev);
        let change_pct = row
            .previous_value
            .filter(|prev| *prev != 0.0)
            .map(|prev| (row.value - prev) / prev.abs() * 100.0);
        Self {
            code: row.code,
            name: row.name,
            unit: row.unit,
            recorded_on: row.recorded_on,
            value: row.value,
            previous_recorded_on: row.previous_recorded_on,
            previous_value: row.previous_value,
            change,
            change_pct,
        }
    }
}

pub fn normalize_code(code: &str) -> Result<String> {
    let code = code.trim().to_ascii_uppercase();
    if code.is_empty() {
        bail!(DomainError::validation("index code must not be empty"));
    }
    Ok(code)
}

impl MarketIndex {
    /// Insert or refresh an index by code.
    pub async fn upsert(
        code: &str,
        name: &str,
        unit: Option<&str>,
        description: Option<&str>,
        pool: &PgPool,
    ) -> Result<Self> {
        let code = normalize_code(code)?;
        let name = match name.trim() {
            "" => code.as_str(),
            n => n,
        };
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO market_indices (code, name, unit, description)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (code) DO UPDATE SET
                name = EXCLUDED.name,
                unit = COALESCE(EXCLUDED.unit, market_indices.unit),
                description = COALESCE(EXCLUDED.description, market_indices.description)
            RETURNING *
            "#,
        )
        .bind(&code)
        .bind(name)
        .bind(unit)
        .bind(description)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_code(code: &str, pool: &PgPool) -> Result<Self> {
        let code = normalize_code(code)?;
        sqlx::query_as::<_, Self>("SELECT * FROM market_indices WHERE code = $1")
            .bind(&code)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| DomainError::not_found("market index", code).into())
    }

    /// Record the value for a day, replacing any earlier value for that day.
    pub async fn record_point(
        index_id: Uuid,
        recorded_on: NaiveDate,
        value: f64,
        pool: &PgPool,
    ) -> Result<IndexPoint> {
        if !value.is_finite() {
            bail!(DomainError::validation("index value must be a finite number"));
        }
        sqlx::query_as::<_, IndexPoint>(
            r#"
            INSERT INTO index_points (index_id, recorded_on, value)
            VALUES ($1, $2, $3)
            ON CONFLICT (index_id, recorded_on) DO UPDATE SET value = EXCLUDED.value
            RETURNING index_id, recorded_on, value
            "#,
        )
        .bind(index_id)
        .bind(recorded_on)
        .bind(value)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Each index's latest point alongside its previous one.
    pub async fn latest_snapshots(pool: &PgPool) -> Result<Vec<IndexSnapshot>> {
        let rows = sqlx::query_as::<_, SnapshotRow>(
            r#"
            WITH ranked AS (
                SELECT index_id, recorded_on, value,
                       ROW_NUMBER() OVER (PARTITION BY index_id ORDER BY recorded_on DESC) AS rn
                FROM index_points
            )
            SELECT i.code, i.name, i.unit,
                   cur.recorded_on, cur.value,
                   prev.recorded_on AS previous_recorded_on,
                   prev.value AS previous_value
            FROM market_indices i
            JOIN ranked cur ON cur.index_id = i.id AND cur.rn = 1
            LEFT JOIN ranked prev ON prev.index_id = i.id AND prev.rn = 2
            ORDER BY i.code
            "#,
        )
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(IndexSnapshot::from).collect())
    }

    /// Points for the last `days` days (default 30), oldest first.
    pub async fn history(code: &str, days: Option<i64>, pool: &PgPool) -> Result<Vec<IndexPoint>> {
        let index = Self::find_by_code(code, pool).await?;
        let days = days.unwrap_or(DEFAULT_HISTORY_DAYS).clamp(1, MAX_HISTORY_DAYS);
        let since = Utc::now().date_naive() - chrono::Duration::days(days);

        sqlx::query_as::<_, IndexPoint>(
            r#"
            SELECT index_id, recorded_on, value FROM index_points
            WHERE index_id = $1 AND recorded_on > $2
            ORDER BY recorded_on ASC
            "#,
        )
        .bind(index.id)
        .bind(since)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(value: f64, previous: Option<f64>) -> SnapshotRow {
        SnapshotRow {
            code: "SCFI".into(),
            name: "Shanghai Containerized Freight Index".into(),
            unit: Some("points".into()),
            recorded_on: NaiveDate::from_ymd_opt(2026, 10, 9).unwrap(),
            value,
            previous_recorded_on: previous.map(|_| NaiveDate::from_ymd_opt(2026, 10, 2).unwrap()),
            previous_value: previous,
        }
    }

    #[test]
    fn snapshot_change_and_percentage() {
        let snap = IndexSnapshot::from(row(1100.0, Some(1000.0)));
        assert_eq!(snap.change, Some(100.0));
        assert!((snap.change_pct.unwrap() - 10.0).abs() < 1e-9);

        let down = IndexSnapshot::from(row(900.0, Some(1000.0)));
        assert!((down.change_pct.unwrap() + 10.0).abs() < 1e-9);
    }

    #[test]
    fn snapshot_without_previous_point() {
        let snap = IndexSnapshot::from(row(1100.0, None));
        assert!(snap.change.is_none() && snap.change_pct.is_none());
    }

    #[test]
    fn zero_previous_has_no_percentage() {
        let snap = IndexSnapshot::from(row(5.0, Some(0.0)));
        assert_eq!(snap.change, Some(5.0));
        assert!(snap.change_pct.is_none());
    }

    #[test]
    fn codes_are_upper_cased() {
        assert_eq!(normalize_code(" wci ").unwrap(), "WCI");
        assert!(normalize_code("  ").is_err());
    }
}
