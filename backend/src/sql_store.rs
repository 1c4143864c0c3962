use async_trait::async_trait;
use common::{ImageDto, ImageOwner, ImageStatus, UserDto};
use sqlx::FromRow;

use crate::db::DbPool;
use crate::store::{RecordStore, StoreError, UserRecord};

/// SQLite-backed [`RecordStore`].
#[derive(Clone)]
pub struct SqlStore {
    pool: DbPool,
}

impl SqlStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password_hash: String,
    is_admin: bool,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        UserRecord {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            is_admin: row.is_admin,
        }
    }
}

// Flat join row; the owner column is folded into the nested DTO below.
#[derive(FromRow)]
struct ImageRow {
    id: i64,
    file_name: String,
    status: String,
    owner_email: String,
}

impl TryFrom<ImageRow> for ImageDto {
    type Error = StoreError;

    fn try_from(row: ImageRow) -> Result<Self, StoreError> {
        let status = row.status.parse::<ImageStatus>().map_err(StoreError::new)?;
        Ok(ImageDto {
            id: row.id,
            file_name: row.file_name,
            status,
            owner: ImageOwner {
                email: row.owner_email,
            },
        })
    }
}

#[async_trait]
impl RecordStore for SqlStore {
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<i64, StoreError> {
        let result = sqlx::query("INSERT INTO users (email, password_hash) VALUES (?, ?)")
            .bind(email)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, is_admin FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(UserRecord::from))
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, is_admin FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(UserRecord::from))
    }

    async fn find_all_users(&self) -> Result<Vec<UserDto>, StoreError> {
        let users = sqlx::query_as::<_, UserDto>("SELECT id, email FROM users")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn find_images_by_status(
        &self,
        status: ImageStatus,
    ) -> Result<Vec<ImageDto>, StoreError> {
        let rows = sqlx::query_as::<_, ImageRow>(
            r#"
            SELECT i.id, i.file_name, i.status, u.email AS owner_email
            FROM images i
            JOIN users u ON u.id = i.user_id
            WHERE i.status = ?
            ORDER BY i.id
            "#,
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ImageDto::try_from).collect()
    }

    async fn delete_user_by_id(&self, id: i64) -> Result<Option<UserDto>, StoreError> {
        let prior = sqlx::query_as::<_, UserDto>("SELECT id, email FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        if prior.is_some() {
            sqlx::query("DELETE FROM users WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
                .await?;
        }

        Ok(prior)
    }
}
