use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::AppError;
use crate::users::repo_types::{User, UserRecord};

/// Persistence seam for user records. Every returned `User` has its role resolved.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn insert(&self, record: &UserRecord, role_id: i32) -> Result<User, AppError>;
    async fn list(&self) -> Result<Vec<User>, AppError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    /// Full replace of the profile fields; the role is kept. `None` when no such user exists.
    async fn update(&self, id: i32, record: &UserRecord) -> Result<Option<User>, AppError>;
    /// Hard delete. `false` when no row matched.
    async fn delete(&self, id: i32) -> Result<bool, AppError>;
    async fn set_role_id(&self, id: i32, role_id: i32) -> Result<bool, AppError>;
}

const USER_COLUMNS: &str = r#"
    u.id, u.name, u.username, u.email, u.password, u.profile_picture, u.image_format,
    u.verification_code, u.is_verified, u.role_id, r.name AS role_name
"#;

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn find_where(&self, predicate: &str, value: &str) -> Result<Option<User>, AppError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users u LEFT JOIN roles r ON r.id = u.role_id WHERE {predicate}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(value)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn insert(&self, record: &UserRecord, role_id: i32) -> Result<User, AppError> {
        let sql = format!(
            r#"
            WITH u AS (
                INSERT INTO users (name, username, email, password, profile_picture,
                                   image_format, verification_code, is_verified, role_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING *
            )
            SELECT {USER_COLUMNS} FROM u LEFT JOIN roles r ON r.id = u.role_id
            "#
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&record.name)
            .bind(&record.username)
            .bind(&record.email)
            .bind(&record.password)
            .bind(&record.profile_picture)
            .bind(&record.image_format)
            .bind(&record.verification_code)
            .bind(record.is_verified)
            .bind(role_id)
            .fetch_one(&self.db)
            .await?;
        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users u LEFT JOIN roles r ON r.id = u.role_id ORDER BY u.id"
        );
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(&self.db).await?;
        Ok(users)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users u LEFT JOIN roles r ON r.id = u.role_id WHERE u.id = $1"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.find_where("u.email = $1", email).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        self.find_where("u.username = $1", username).await
    }

    async fn update(&self, id: i32, record: &UserRecord) -> Result<Option<User>, AppError> {
        let sql = format!(
            r#"
            WITH u AS (
                UPDATE users
                   SET name = $2, username = $3, email = $4, password = $5,
                       profile_picture = $6, image_format = $7, verification_code = $8,
                       is_verified = $9
                 WHERE id = $1
                RETURNING *
            )
            SELECT {USER_COLUMNS} FROM u LEFT JOIN roles r ON r.id = u.role_id
            "#
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(&record.name)
            .bind(&record.username)
            .bind(&record.email)
            .bind(&record.password)
            .bind(&record.profile_picture)
            .bind(&record.image_format)
            .bind(&record.verification_code)
            .bind(record.is_verified)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn set_role_id(&self, id: i32, role_id: i32) -> Result<bool, AppError> {
        let res = sqlx::query("UPDATE users SET role_id = $2 WHERE id = $1")
            .bind(id)
            .bind(role_id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
