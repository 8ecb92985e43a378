use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use freightdesk_core::{normalize_currency, page_limit, page_offset, DomainError, ServiceMode};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::company::{escape_like, Company};

/// A freight service offering published by a company.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub service_mode: String,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub transit_days: Option<i32>,
    pub base_price: Option<f64>,
    pub currency: String,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub company_id: Uuid,
    pub name: String,
    pub service_mode: ServiceMode,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub transit_days: Option<i32>,
    pub base_price: Option<f64>,
    pub currency: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub service_mode: Option<ServiceMode>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub transit_days: Option<i32>,
    pub base_price: Option<f64>,
    pub currency: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilters {
    pub company_id: Option<Uuid>,
    pub service_mode: Option<ServiceMode>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn check_numbers(transit_days: Option<i32>, base_price: Option<f64>) -> Result<()> {
    if transit_days.is_some_and(|d| d < 0) {
        bail!(DomainError::validation("transit_days must not be negative"));
    }
    if base_price.is_some_and(|p| !p.is_finite() || p < 0.0) {
        bail!(DomainError::validation("base_price must be a non-negative number"));
    }
    Ok(())
}

impl Product {
    pub async fn create(input: &NewProduct, pool: &PgPool) -> Result<Self> {
        let name = input.name.trim();
        if name.is_empty() {
            bail!(DomainError::validation("product name must not be empty"));
        }
        check_numbers(input.transit_days, input.base_price)?;
        let currency = normalize_currency(input.currency.as_deref().unwrap_or("USD"))?;

        // Surface a 404 for the owner instead of a foreign-key error
        Company::find_by_id(input.company_id, pool).await?;

        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO products (
                company_id, name, service_mode, origin, destination,
                transit_days, base_price, currency, description
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(input.company_id)
        .bind(name)
        .bind(input.service_mode.as_str())
        .bind(&input.origin)
        .bind(&input.destination)
        .bind(input.transit_days)
        .bind(input.base_price)
        .bind(currency)
        .bind(&input.description)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| DomainError::not_found("product", id).into())
    }

    pub async fn update(id: Uuid, changes: &ProductUpdate, pool: &PgPool) -> Result<Self> {
        check_numbers(changes.transit_days, changes.base_price)?;
        let name = match changes.name.as_deref().map(str::trim) {
            Some("") => bail!(DomainError::validation("product name must not be empty")),
            other => other,
        };
        let currency = changes
            .currency
            .as_deref()
            .map(normalize_currency)
            .transpose()?;

        sqlx::query_as::<_, Self>(
            r#"
            UPDATE products SET
                name = COALESCE($2, name),
                service_mode = COALESCE($3, service_mode),
                origin = COALESCE($4, origin),
                destination = COALESCE($5, destination),
                transit_days = COALESCE($6, transit_days),
                base_price = COALESCE($7, base_price),
                currency = COALESCE($8, currency),
                description = COALESCE($9, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(changes.service_mode.map(|m| m.as_str()))
        .bind(&changes.origin)
        .bind(&changes.destination)
        .bind(changes.transit_days)
        .bind(changes.base_price)
        .bind(currency)
        .bind(&changes.description)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DomainError::not_found("product", id).into())
    }

    pub async fn list(filters: &ProductFilters, pool: &PgPool) -> Result<Vec<Self>> {
        let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new("SELECT * FROM products WHERE TRUE ");

        if !filters.include_inactive {
            qb.push("AND active ");
        }
        if let Some(company_id) = filters.company_id {
            qb.push("AND company_id = ");
            qb.push_bind(company_id);
            qb.push(" ");
        }
        if let Some(mode) = filters.service_mode {
            qb.push("AND service_mode = ");
            qb.push_bind(mode.as_str());
            qb.push(" ");
        }
        if let Some(origin) = filters.origin.as_deref().filter(|s| !s.trim().is_empty()) {
            qb.push("AND origin ILIKE ");
            qb.push_bind(format!("%{}%", escape_like(origin.trim())));
            qb.push(" ");
        }
        if let Some(dest) = filters.destination.as_deref().filter(|s| !s.trim().is_empty()) {
            qb.push("AND destination ILIKE ");
            qb.push_bind(format!("%{}%", escape_like(dest.trim())));
            qb.push(" ");
        }

        qb.push("ORDER BY created_at DESC LIMIT ");
        qb.push_bind(page_limit(filters.limit));
        qb.push(" OFFSET ");
        qb.push_bind(page_offset(filters.offset));

        qb.build_query_as::<Self>()
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn deactivate(id: Uuid, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "UPDATE products SET active = FALSE, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DomainError::not_found("product", id).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_numbers_are_rejected() {
        assert!(check_numbers(Some(-1), None).is_err());
        assert!(check_numbers(None, Some(-0.5)).is_err());
        assert!(check_numbers(None, Some(f64::NAN)).is_err());
        assert!(check_numbers(Some(0), Some(0.0)).is_ok());
        assert!(check_numbers(None, None).is_ok());
    }

    #[test]
    fn filters_default_to_active_only() {
        let filters: ProductFilters = serde_json::from_str("{}").unwrap();
        assert!(!filters.include_inactive);
    }
}
