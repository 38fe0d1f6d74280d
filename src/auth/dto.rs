use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::Role;

/// Request body for sign-up. Fields are optional so that missing input
/// maps to the contract's own validation errors instead of a
/// deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Public part of the account echoed back after sign-up.
#[derive(Debug, Serialize)]
pub struct RegisteredUser {
    pub email: String,
    pub is_verified: bool,
    pub role: Option<Role>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: RegisteredUser,
    pub refresh: String,
    pub access: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub role: Role,
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub email: String,
    pub is_verified: bool,
    pub role: Option<Role>,
    pub id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_tolerates_missing_fields() {
        let req: RegisterRequest = serde_json::from_str("{}").unwrap();
        assert!(req.email.is_none());
        assert!(req.password.is_none());
        assert!(req.role.is_none());
    }

    #[test]
    fn login_response_uses_wire_field_names() {
        let resp = LoginResponse {
            access: "a".into(),
            refresh: "r".into(),
            role: Role::Engineer,
            id: Uuid::new_v4(),
        };
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v["role"], "engineer");
        assert!(v["access"].is_string());
        assert!(v["refresh"].is_string());
        assert!(v["id"].is_string());
    }
}
