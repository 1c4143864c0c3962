use async_trait::async_trait;
use common::{ImageDto, ImageStatus, UserDto};
use thiserror::Error;

/// The single failure kind observable above the store: an operation against
/// the backing database did not complete. Handlers never inspect or rewrite
/// the message; it travels to the error boundary verbatim.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StoreError(String);

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        StoreError(message.into())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError(e.to_string())
    }
}

/// A full account row, including the secret hash and the admin flag.
/// Internal to the backend and intentionally not serializable; anything that
/// goes on the wire is a [`UserDto`].
#[derive(Clone, Debug)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
}

/// Persistence collaborator for the Account and Image collections. Handlers
/// receive it as an `Arc<dyn RecordStore>` through [`AppState`], so tests can
/// substitute a stub without patching a concrete client.
///
/// [`AppState`]: crate::web_server::AppState
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<i64, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn find_user_by_id(&self, id: i64) -> Result<Option<UserRecord>, StoreError>;

    /// All accounts, with the password projected away by the return type.
    async fn find_all_users(&self) -> Result<Vec<UserDto>, StoreError>;

    /// Images matching `status`, each with its owning account expanded to
    /// the owner's email.
    async fn find_images_by_status(&self, status: ImageStatus)
        -> Result<Vec<ImageDto>, StoreError>;

    /// Deletes the account with `id`, returning its prior contents when one
    /// existed. Deleting an absent account is a no-op success, not an error.
    async fn delete_user_by_id(&self, id: i64) -> Result<Option<UserDto>, StoreError>;
}
