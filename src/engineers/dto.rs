use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo::Engineer;

/// Query string for the recruiter-facing listing. Filter names follow the
/// frontend's camelCase convention.
#[derive(Debug, Deserialize)]
pub struct EngineerQuery {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default, rename = "roleType")]
    pub role_type: Option<String>,
    #[serde(default, rename = "roleLevel")]
    pub role_level: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}
fn default_limit() -> i64 {
    10
}

#[derive(Debug, Serialize)]
pub struct EngineerListResponse {
    pub engineers: Vec<Engineer>,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct EngineerCountResponse {
    pub count: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateEngineerRequest {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub tag_line: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub search_status: Option<String>,
    #[serde(default)]
    pub role_type: Option<String>,
    #[serde(default)]
    pub role_level: Option<String>,
}

/// Partial update; absent fields keep their stored values.
#[derive(Debug, Deserialize)]
pub struct UpdateEngineerRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub tag_line: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub search_status: Option<String>,
    #[serde(default)]
    pub role_type: Option<String>,
    #[serde(default)]
    pub role_level: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedEngineerResponse {
    #[serde(rename = "engineerId")]
    pub engineer_id: Uuid,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
    pub key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_defaults_to_first_page_of_ten() {
        let q: EngineerQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.page, 1);
        assert_eq!(q.limit, 10);
        assert!(q.country.is_none());
        assert!(q.role_type.is_none());
        assert!(q.role_level.is_none());
    }

    #[test]
    fn query_filters_use_camel_case_names() {
        let q: EngineerQuery = serde_json::from_value(serde_json::json!({
            "country": "Portugal",
            "roleType": "contract_full_time",
            "roleLevel": "senior",
            "page": 3,
            "limit": 25,
        }))
        .unwrap();
        assert_eq!(q.country.as_deref(), Some("Portugal"));
        assert_eq!(q.role_type.as_deref(), Some("contract_full_time"));
        assert_eq!(q.role_level.as_deref(), Some("senior"));
        assert_eq!(q.page, 3);
        assert_eq!(q.limit, 25);
    }

    #[test]
    fn created_response_uses_engineer_id_key() {
        let v = serde_json::to_value(CreatedEngineerResponse {
            engineer_id: Uuid::new_v4(),
            message: "Engineer profile created successfully".into(),
        })
        .unwrap();
        assert!(v.get("engineerId").is_some());
    }
}
