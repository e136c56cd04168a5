use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::features::users::models::{Role, User};

/// Directory entry as seen by another user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponseDto {
    pub id: String,
    /// Only visible to staff and to the user themself
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    /// "{first_name} {last_name}"
    pub name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semester: Option<i32>,
}

impl UserResponseDto {
    /// Build the response, keeping the email only when `show_email` is set
    pub fn project(user: User, show_email: bool) -> Self {
        let name = user.display_name();
        Self {
            id: user.id,
            email: show_email.then_some(user.email),
            first_name: user.first_name,
            last_name: user.last_name,
            name,
            role: user.role,
            department: user.department,
            year: user.year,
            semester: user.semester,
        }
    }
}

/// Query parameters for the contact list
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
pub struct ContactQuery {
    /// Only return users with this role
    pub role: Option<Role>,

    /// Case-insensitive match on name or email
    #[validate(length(max = 100, message = "search must not exceed 100 characters"))]
    pub search: Option<String>,

    /// Maximum number of contacts (default: 100, max: 500)
    #[param(minimum = 1, maximum = 500)]
    pub limit: Option<i64>,
}

impl ContactQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(100).clamp(1, 500)
    }
}
