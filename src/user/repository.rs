//! Handle database requests.

use sqlx::{Pool, Postgres};

use crate::error::Result;
use crate::user::{User, UserPatch};

pub const USERNAME_TAKEN: &str = "Username already exists";

#[derive(Clone)]
pub struct UserRepository {
    pool: Pool<Postgres>,
}

impl UserRepository {
    /// Create a new [`UserRepository`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert [`User`] into database.
    pub async fn insert(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO users (id, username, email, password, profile_picture, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.profile_picture)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(unique_conflict)?;

        Ok(())
    }

    /// Find current user using `id` field.
    pub async fn find_by_id(&self, user_id: &str) -> Result<User> {
        let query = get_by_field_query(Field::Id);

        let user = sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    /// Find current user using `email` field.
    pub async fn find_by_email(&self, email: &str) -> Result<User> {
        let query = get_by_field_query(Field::Email);

        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    /// Apply a [`UserPatch`] and return the updated row.
    /// Untouched fields keep their stored value.
    pub async fn update(&self, user_id: &str, patch: &UserPatch) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"UPDATE users
                SET username = COALESCE($2, username),
                    email = COALESCE($3, email),
                    password = COALESCE($4, password),
                    profile_picture = COALESCE($5, profile_picture)
                WHERE id = $1
                RETURNING id, username, email, password, profile_picture, created_at"#,
        )
        .bind(user_id)
        .bind(&patch.username)
        .bind(&patch.email)
        .bind(&patch.password)
        .bind(&patch.profile_picture)
        .fetch_one(&self.pool)
        .await
        .map_err(unique_conflict)?;

        Ok(user)
    }

    /// Delete current user. Deleting an absent row is not an error.
    pub async fn delete(&self, user_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Field {
    Id,
    Email,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Field::Id => write!(f, "id"),
            Field::Email => write!(f, "email"),
        }
    }
}

fn get_by_field_query(field: Field) -> String {
    format!(
        r#"SELECT id, username, email, password, profile_picture, created_at
            FROM users
            WHERE {field} = $1"#
    )
}

/// Unique violations on the username or email index surface as a
/// username conflict.
fn unique_conflict(err: sqlx::Error) -> crate::error::ServerError {
    if err
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation())
    {
        crate::error::ServerError::Conflict(USERNAME_TAKEN)
    } else {
        err.into()
    }
}
