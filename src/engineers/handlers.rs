use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{
    CreateEngineerRequest, CreatedEngineerResponse, EngineerCountResponse, EngineerListResponse,
    EngineerQuery, UpdateEngineerRequest, UploadResponse,
};
use super::repo::{self, Engineer, ROLE_LEVELS, ROLE_TYPES};
use crate::{
    auth::extractors::{require_role, CurrentUser},
    error::ApiError,
    state::AppState,
    storage::StorageClient,
    users::Role,
};

const AVATAR_URL_TTL_SECS: u64 = 24 * 60 * 60;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/engineers", get(list_engineers).post(create_engineer))
        .route("/engineers/", get(list_engineers).post(create_engineer))
        .route("/engineers/count", get(count_engineers))
        .route("/engineers/count/", get(count_engineers))
        .route("/engineers/me", get(my_profile).put(update_my_profile))
        .route("/engineers/me/", get(my_profile).put(update_my_profile))
        .route("/engineers/upload", post(upload_avatar))
        .route("/engineers/upload/", post(upload_avatar))
        .route("/engineers/:id", get(engineer_details))
        .route("/engineers/:id/", get(engineer_details))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
}

#[instrument(skip(state))]
pub async fn count_engineers(
    State(state): State<AppState>,
) -> Result<Json<EngineerCountResponse>, ApiError> {
    let count = repo::count(&state.db).await?;
    Ok(Json(EngineerCountResponse { count }))
}

/// Recruiter-facing browse with pagination and filters.
#[instrument(skip(state, user))]
pub async fn list_engineers(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<EngineerQuery>,
) -> Result<Json<EngineerListResponse>, ApiError> {
    require_role(&user, Role::Recruiter)?;

    let (engineers, total) = repo::list(
        &state.db,
        query.country.as_deref(),
        query.role_type.as_deref(),
        query.role_level.as_deref(),
        query.page,
        query.limit,
    )
    .await?;
    Ok(Json(EngineerListResponse { engineers, total }))
}

fn validate_choice(value: Option<&str>, allowed: &[&str], field: &str) -> Result<(), ApiError> {
    match value {
        Some(v) if !allowed.contains(&v) => {
            Err(ApiError::validation(format!("Invalid {field}")))
        }
        _ => Ok(()),
    }
}

#[instrument(skip(state, user, payload))]
pub async fn create_engineer(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateEngineerRequest>,
) -> Result<(StatusCode, Json<CreatedEngineerResponse>), ApiError> {
    require_role(&user, Role::Engineer)?;

    if payload.first_name.is_empty() || payload.last_name.is_empty() {
        return Err(ApiError::validation("First and last name are required"));
    }
    validate_choice(payload.role_type.as_deref(), &ROLE_TYPES, "role_type")?;
    validate_choice(payload.role_level.as_deref(), &ROLE_LEVELS, "role_level")?;

    if repo::find_by_user(&state.db, user.id).await?.is_some() {
        return Err(ApiError::validation("Engineer profile already exists"));
    }

    let engineer = repo::insert(&state.db, user.id, &payload).await?;
    info!(user_id = %user.id, engineer_id = %engineer.id, "engineer profile created");
    Ok((
        StatusCode::CREATED,
        Json(CreatedEngineerResponse {
            engineer_id: engineer.id,
            message: "Engineer profile created successfully".into(),
        }),
    ))
}

#[instrument(skip(state, user))]
pub async fn engineer_details(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Engineer>, ApiError> {
    require_role(&user, Role::Recruiter)?;

    repo::find_by_id(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Engineer not found"))
}

#[instrument(skip(state, user))]
pub async fn my_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Engineer>, ApiError> {
    repo::find_by_user(&state.db, user.id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Engineer profile not found"))
}

#[instrument(skip(state, user, payload))]
pub async fn update_my_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UpdateEngineerRequest>,
) -> Result<Json<Engineer>, ApiError> {
    require_role(&user, Role::Engineer)?;

    validate_choice(payload.role_type.as_deref(), &ROLE_TYPES, "role_type")?;
    validate_choice(payload.role_level.as_deref(), &ROLE_LEVELS, "role_level")?;

    repo::update_by_user(&state.db, user.id, &payload)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Engineer profile not found"))
}

/// Accepts a single multipart `file` field, stores it and returns a
/// time-limited URL the frontend can embed as the avatar.
#[instrument(skip(state, user, multipart))]
pub async fn upload_avatar(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".into());
        let data = field
            .bytes()
            .await
            .map_err(|_| ApiError::validation("Invalid file upload"))?;

        let ext = ext_from_mime(&content_type).unwrap_or("bin");
        let key = format!("avatars/{}/{}.{}", user.id, Uuid::new_v4(), ext);
        state.storage.put_object(&key, data, &content_type).await?;
        let url = state.storage.presign_get(&key, AVATAR_URL_TTL_SECS).await?;

        info!(user_id = %user.id, %key, "avatar uploaded");
        return Ok(Json(UploadResponse { url, key }));
    }

    Err(ApiError::validation("No file provided"))
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::User;
    use time::OffsetDateTime;

    fn user_with_role(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            email: "someone@example.com".into(),
            password_hash: "$argon2id$fake".into(),
            role: Some(role),
            is_verified: true,
            verification_code: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn minimal_profile() -> CreateEngineerRequest {
        CreateEngineerRequest {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            tag_line: None,
            city: None,
            country: None,
            avatar: None,
            bio: None,
            search_status: None,
            role_type: None,
            role_level: None,
        }
    }

    // The gate fires before any storage access, so these run against the
    // fake state without a database.
    #[tokio::test]
    async fn recruiter_cannot_create_an_engineer_profile() {
        let state = AppState::fake();
        let err = create_engineer(
            State(state),
            CurrentUser(user_with_role(Role::Recruiter)),
            Json(minimal_profile()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Authorization(m) if m == "Engineer access required"));
    }

    #[tokio::test]
    async fn engineer_cannot_browse_the_listing() {
        let state = AppState::fake();
        let err = list_engineers(
            State(state),
            CurrentUser(user_with_role(Role::Engineer)),
            Query(EngineerQuery {
                country: None,
                role_type: None,
                role_level: None,
                page: 1,
                limit: 10,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Authorization(m) if m == "Recruiter access required"));
    }

    #[test]
    fn ext_from_mime_maps_known_image_types() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
    }

    #[test]
    fn choice_validation_accepts_known_values_and_absence() {
        assert!(validate_choice(None, &ROLE_TYPES, "role_type").is_ok());
        assert!(validate_choice(Some("contract_full_time"), &ROLE_TYPES, "role_type").is_ok());
        assert!(validate_choice(Some("senior"), &ROLE_LEVELS, "role_level").is_ok());

        let err = validate_choice(Some("freelance"), &ROLE_TYPES, "role_type").unwrap_err();
        assert!(matches!(err, ApiError::Validation(m) if m == "Invalid role_type"));
    }
}
