use chrono::NaiveDateTime;
use database::entities::user;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Shortest password accepted for a new or reset account
pub const MIN_PASSWORD_LEN: u64 = 8;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub department: Option<String>,
    pub phone: Option<String>,
    /// `student` or `admin`
    pub role: String,
    pub created_at: NaiveDateTime,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            full_name: model.full_name,
            email: model.email,
            department: model.department,
            phone: model.phone,
            role: model.role.to_string(),
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateUserRequest {
    pub full_name: String,
    #[validate(email(message = "email address is not valid"))]
    pub email: String,
    #[validate(length(min = MIN_PASSWORD_LEN, message = "password must be at least 8 characters"))]
    pub password: String,
    pub department: Option<String>,
    pub phone: Option<String>,
    /// Defaults to `student`
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct UserQueryParams {
    /// `student` or `admin`
    pub role: Option<String>,
}

/// Fields left out stay as they are
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    #[validate(email(message = "email address is not valid"))]
    pub email: Option<String>,
    /// An empty string clears the department
    pub department: Option<String>,
    /// An empty string clears the phone number
    pub phone: Option<String>,
    /// `student` or `admin`
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ResetPasswordRequest {
    #[serde(alias = "newPassword")]
    #[validate(length(min = MIN_PASSWORD_LEN, message = "password must be at least 8 characters"))]
    pub new_password: String,
}

/// Contact details a user may change on their own account
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub department: Option<String>,
    pub phone: Option<String>,
}
