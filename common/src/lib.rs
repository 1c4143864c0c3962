use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[cfg(not(target_arch = "wasm32"))]
use sqlx::FromRow;

/// Login / registration payload.
#[derive(Serialize, Deserialize, Clone, Debug, Validate, ToSchema)]
pub struct Credentials {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

/// An account as it appears on the wire. There is deliberately no password
/// field here: every listing and profile response serializes this type, so
/// secrets cannot leak through it.
#[cfg_attr(not(target_arch = "wasm32"), derive(FromRow))]
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, ToSchema)]
pub struct UserDto {
    pub id: i64,
    pub email: String,
}

/// Moderation state of an uploaded image.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImageStatus {
    Pending,
    Approved,
    Rejected,
}

impl ImageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageStatus::Pending => "pending",
            ImageStatus::Approved => "approved",
            ImageStatus::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for ImageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ImageStatus::Pending),
            "approved" => Ok(ImageStatus::Approved),
            "rejected" => Ok(ImageStatus::Rejected),
            other => Err(format!("unknown image status: {other}")),
        }
    }
}

/// The owning account, expanded in place of the stored reference on reads.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, ToSchema)]
pub struct ImageOwner {
    pub email: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, ToSchema)]
pub struct ImageDto {
    pub id: i64,
    pub file_name: String,
    pub status: ImageStatus,
    pub owner: ImageOwner,
}

// --- Response envelopes ---
// Each handler answers with exactly one of these; the keys `user`, `images`,
// `users` and `message` never appear together in one body.

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, ToSchema)]
pub struct ProfileResponse {
    pub user: UserDto,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, ToSchema)]
pub struct ImagesResponse {
    pub images: Vec<ImageDto>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, ToSchema)]
pub struct UsersResponse {
    pub users: Vec<UserDto>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}
