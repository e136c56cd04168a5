use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::model::SessionUser;
use crate::features::users::dtos::UserResponseDto;

/// DTO for /api/auth/me response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponseDto {
    pub session: SessionUser,
    /// Directory entry, absent when the user is not in the directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserResponseDto>,
}
