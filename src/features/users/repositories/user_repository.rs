use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::error::Result;
use crate::features::users::models::{Role, User};

/// Filters for listing directory entries
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// User to leave out of the result (usually the caller)
    pub exclude_id: Option<String>,
    pub role: Option<Role>,
    /// Case-insensitive match on first name, last name or email
    pub search: Option<String>,
    pub limit: i64,
}

/// Read-only access to the portal's user directory
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>>;

    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>>;
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, first_name, last_name, role, department, year, semester, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>> {
        let search_pattern = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        // NULL parameters disable their predicate
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, first_name, last_name, role, department, year, semester, created_at
            FROM users
            WHERE ($1::TEXT IS NULL OR id <> $1)
              AND ($2::user_role IS NULL OR role = $2)
              AND ($3::TEXT IS NULL
                   OR first_name ILIKE $3
                   OR last_name ILIKE $3
                   OR email ILIKE $3
                   OR (first_name || ' ' || last_name) ILIKE $3)
            ORDER BY first_name ASC, last_name ASC
            LIMIT $4
            "#,
        )
        .bind(filter.exclude_id.as_deref())
        .bind(filter.role)
        .bind(search_pattern)
        .bind(filter.limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}
