use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use freightdesk_core::{page_limit, page_offset, CompanyType, DomainError};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub company_type: String,
    pub country: Option<String>,
    pub city: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub verified: bool,
    pub rating: Option<f32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCompany {
    pub name: String,
    pub company_type: CompanyType,
    pub country: Option<String>,
    pub city: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Partial update; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyUpdate {
    pub name: Option<String>,
    pub company_type: Option<CompanyType>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyFilters {
    pub company_type: Option<CompanyType>,
    pub country: Option<String>,
    pub verified: Option<bool>,
    pub q: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn clean_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        bail!(DomainError::validation("company name must not be empty"));
    }
    Ok(name.to_string())
}

impl Company {
    pub fn kind(&self) -> Result<CompanyType> {
        self.company_type.parse()
    }

    pub async fn create(input: &NewCompany, pool: &PgPool) -> Result<Self> {
        let name = clean_name(&input.name)?;

        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO companies (name, company_type, country, city, description, website, email, phone)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(input.company_type.as_str())
        .bind(&input.country)
        .bind(&input.city)
        .bind(&input.description)
        .bind(&input.website)
        .bind(&input.email)
        .bind(&input.phone)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Self> {
        Self::find_optional(id, pool)
            .await?
            .ok_or_else(|| DomainError::not_found("company", id).into())
    }

    pub async fn find_optional(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn update(id: Uuid, changes: &CompanyUpdate, pool: &PgPool) -> Result<Self> {
        let name = changes.name.as_deref().map(clean_name).transpose()?;

        sqlx::query_as::<_, Self>(
            r#"
            UPDATE companies SET
                name = COALESCE($2, name),
                company_type = COALESCE($3, company_type),
                country = COALESCE($4, country),
                city = COALESCE($5, city),
                description = COALESCE($6, description),
                website = COALESCE($7, website),
                email = COALESCE($8, email),
                phone = COALESCE($9, phone),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(changes.company_type.map(|t| t.as_str()))
        .bind(&changes.country)
        .bind(&changes.city)
        .bind(&changes.description)
        .bind(&changes.website)
        .bind(&changes.email)
        .bind(&changes.phone)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DomainError::not_found("company", id).into())
    }

    pub async fn list(filters: &CompanyFilters, pool: &PgPool) -> Result<Vec<Self>> {
        let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new("SELECT * FROM companies WHERE TRUE ");

        if let Some(kind) = filters.company_type {
            qb.push("AND company_type = ");
            qb.push_bind(kind.as_str());
            qb.push(" ");
        }
        if let Some(country) = &filters.country {
            qb.push("AND lower(country) = lower(");
            qb.push_bind(country.clone());
            qb.push(") ");
        }
        if let Some(verified) = filters.verified {
            qb.push("AND verified = ");
            qb.push_bind(verified);
            qb.push(" ");
        }
        if let Some(q) = filters.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let pattern = format!("%{}%", escape_like(q));
            qb.push("AND (name ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR description ILIKE ");
            qb.push_bind(pattern);
            qb.push(") ");
        }

        qb.push("ORDER BY verified DESC, name ASC LIMIT ");
        qb.push_bind(page_limit(filters.limit));
        qb.push(" OFFSET ");
        qb.push_bind(page_offset(filters.offset));

        qb.build_query_as::<Self>()
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn verify(id: Uuid, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "UPDATE companies SET verified = TRUE, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DomainError::not_found("company", id).into())
    }

    pub async fn set_rating(id: Uuid, rating: f32, pool: &PgPool) -> Result<Self> {
        if !(0.0..=5.0).contains(&rating) {
            bail!(DomainError::validation("rating must be between 0 and 5"));
        }

        sqlx::query_as::<_, Self>(
            "UPDATE companies SET rating = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(rating)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DomainError::not_found("company", id).into())
    }

    /// Fails with a conflict while the company is referenced by RFQs, bids or contracts.
    pub async fn delete(id: Uuid, pool: &PgPool) -> Result<()> {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => {
                bail!(DomainError::not_found("company", id))
            }
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                bail!(DomainError::conflict(
                    "company has RFQs, bids or contracts and cannot be deleted"
                ))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Escape `%`, `_` and `\` so user text matches literally inside ILIKE.
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_escapes_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("Maersk"), "Maersk");
    }

    #[test]
    fn blank_names_are_rejected() {
        let err = clean_name("   ").unwrap_err();
        assert!(err.downcast_ref::<DomainError>().is_some());
        assert_eq!(clean_name("  Kuehne + Nagel ").unwrap(), "Kuehne + Nagel");
    }
}
