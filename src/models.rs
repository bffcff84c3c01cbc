use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    /// Admin username or employee code
    #[schema(example = "EMP-001")]
    pub username: Option<String>,
    #[schema(example = "EMP-001")]
    pub password: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginUser {
    pub id: String,
    pub username: String,
    pub name: String,
    #[schema(value_type = String, example = "employee")]
    pub role: Role,
    pub store_id: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: LoginUser,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// User id for admins, employee id for employees
    pub sub: String,
    pub username: String,
    pub role: Role,
    /// Present only for employees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,
}
