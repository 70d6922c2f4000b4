//! Bearer-token auth for the HTTP surface.
//!
//! Token issuance is not an HTTP endpoint here; `issue_token` exists for
//! operators and tests. Verification is a plain lookup against the
//! sessions table, so any upstream identity flow can mint rows into it.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header, request::Parts};
use rand::{Rng, distr::Alphanumeric};
use sqlx::SqlitePool;

use crate::appresult::{AppError, AppResult};
use crate::clock;

const TOKEN_LEN: usize = 48;

/// Session tokens live for 24 hours.
pub const TOKEN_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// The authenticated caller of an HTTP request.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: String,
}

pub async fn issue_token(pool: &SqlitePool, user_id: &str) -> AppResult<String> {
    let token: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect();

    sqlx::query("INSERT INTO sessions (token,user_id,expires_at) VALUES (?,?,?)")
        .bind(&token)
        .bind(user_id)
        .bind(clock::now_ms() + TOKEN_TTL_MS)
        .execute(pool)
        .await?;

    Ok(token)
}

pub async fn verify(pool: &SqlitePool, token: &str) -> AppResult<Principal> {
    let row: Option<(String, i64)> =
        sqlx::query_as("SELECT user_id,expires_at FROM sessions WHERE token=?")
            .bind(token)
            .fetch_optional(pool)
            .await?;

    match row {
        Some((user_id, expires_at)) if expires_at > clock::now_ms() => Ok(Principal { user_id }),
        Some(_) => Err(AppError::Unauthorized("token expired".to_owned())),
        None => Err(AppError::Unauthorized("invalid token".to_owned())),
    }
}

impl<S> FromRequestParts<S> for Principal
where
    SqlitePool: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_owned()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("malformed authorization header".to_owned()))?;

        let pool = SqlitePool::from_ref(state);
        verify(&pool, token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::init_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn issue_then_verify() {
        let pool = pool().await;
        let token = issue_token(&pool, "u1").await.unwrap();
        assert_eq!(token.len(), TOKEN_LEN);

        let principal = verify(&pool, &token).await.unwrap();
        assert_eq!(principal.user_id, "u1");
    }

    #[tokio::test]
    async fn unknown_token_is_unauthorized() {
        let pool = pool().await;
        let err = verify(&pool, "nope").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn expired_token_is_unauthorized() {
        let pool = pool().await;
        sqlx::query("INSERT INTO sessions (token,user_id,expires_at) VALUES ('old','u1',?)")
            .bind(clock::now_ms() - 1)
            .execute(&pool)
            .await
            .unwrap();

        let err = verify(&pool, "old").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
