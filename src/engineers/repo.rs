use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{CreateEngineerRequest, UpdateEngineerRequest};

pub const ROLE_TYPES: [&str; 4] = [
    "contract_part_time",
    "contract_full_time",
    "employee_part_time",
    "employee_full_time",
];

pub const ROLE_LEVELS: [&str; 5] = [
    "junior",
    "mid_level",
    "senior",
    "principal_staff",
    "c_level",
];

/// Engineer profile document, one per engineer-role user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Engineer {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub tag_line: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub search_status: Option<String>,
    pub role_type: Option<String>,
    pub role_level: Option<String>,
    pub created_at: OffsetDateTime,
}

const ENGINEER_COLUMNS: &str = "id, user_id, first_name, last_name, tag_line, city, country, \
     avatar, bio, search_status, role_type, role_level, created_at";

pub async fn count(db: &PgPool) -> anyhow::Result<i64> {
    let (count,): (i64,) = sqlx::query_as(r#"SELECT COUNT(*) FROM engineers"#)
        .fetch_one(db)
        .await?;
    Ok(count)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Engineer>> {
    let row = sqlx::query_as::<_, Engineer>(&format!(
        r#"SELECT {ENGINEER_COLUMNS} FROM engineers WHERE id = $1"#,
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn find_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<Engineer>> {
    let row = sqlx::query_as::<_, Engineer>(&format!(
        r#"SELECT {ENGINEER_COLUMNS} FROM engineers WHERE user_id = $1"#,
    ))
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Filtered page plus the total match count, both over the same
/// predicate. NULL filter binds disable the corresponding condition.
pub async fn list(
    db: &PgPool,
    country: Option<&str>,
    role_type: Option<&str>,
    role_level: Option<&str>,
    page: i64,
    limit: i64,
) -> anyhow::Result<(Vec<Engineer>, i64)> {
    let page = page.max(1);
    let limit = limit.clamp(1, 100);
    let offset = (page - 1) * limit;

    let rows = sqlx::query_as::<_, Engineer>(&format!(
        r#"
        SELECT {ENGINEER_COLUMNS}
        FROM engineers
        WHERE ($1::text IS NULL OR country = $1)
          AND ($2::text IS NULL OR role_type = $2)
          AND ($3::text IS NULL OR role_level = $3)
        ORDER BY created_at DESC
        LIMIT $4 OFFSET $5
        "#,
    ))
    .bind(country)
    .bind(role_type)
    .bind(role_level)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;

    let (total,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM engineers
        WHERE ($1::text IS NULL OR country = $1)
          AND ($2::text IS NULL OR role_type = $2)
          AND ($3::text IS NULL OR role_level = $3)
        "#,
    )
    .bind(country)
    .bind(role_type)
    .bind(role_level)
    .fetch_one(db)
    .await?;

    Ok((rows, total))
}

pub async fn insert(
    db: &PgPool,
    user_id: Uuid,
    profile: &CreateEngineerRequest,
) -> anyhow::Result<Engineer> {
    let row = sqlx::query_as::<_, Engineer>(&format!(
        r#"
        INSERT INTO engineers
            (user_id, first_name, last_name, tag_line, city, country,
             avatar, bio, search_status, role_type, role_level)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING {ENGINEER_COLUMNS}
        "#,
    ))
    .bind(user_id)
    .bind(&profile.first_name)
    .bind(&profile.last_name)
    .bind(&profile.tag_line)
    .bind(&profile.city)
    .bind(&profile.country)
    .bind(&profile.avatar)
    .bind(&profile.bio)
    .bind(&profile.search_status)
    .bind(&profile.role_type)
    .bind(&profile.role_level)
    .fetch_one(db)
    .await?;
    Ok(row)
}

/// Partial update of the caller's own profile; absent fields are kept.
pub async fn update_by_user(
    db: &PgPool,
    user_id: Uuid,
    changes: &UpdateEngineerRequest,
) -> anyhow::Result<Option<Engineer>> {
    let row = sqlx::query_as::<_, Engineer>(&format!(
        r#"
        UPDATE engineers SET
            first_name = COALESCE($2, first_name),
            last_name = COALESCE($3, last_name),
            tag_line = COALESCE($4, tag_line),
            city = COALESCE($5, city),
            country = COALESCE($6, country),
            avatar = COALESCE($7, avatar),
            bio = COALESCE($8, bio),
            search_status = COALESCE($9, search_status),
            role_type = COALESCE($10, role_type),
            role_level = COALESCE($11, role_level)
        WHERE user_id = $1
        RETURNING {ENGINEER_COLUMNS}
        "#,
    ))
    .bind(user_id)
    .bind(&changes.first_name)
    .bind(&changes.last_name)
    .bind(&changes.tag_line)
    .bind(&changes.city)
    .bind(&changes.country)
    .bind(&changes.avatar)
    .bind(&changes.bio)
    .bind(&changes.search_status)
    .bind(&changes.role_type)
    .bind(&changes.role_level)
    .fetch_optional(db)
    .await?;
    Ok(row)
}
