//! Roles database operations

use crate::db::models::{Role, RoleId};
use crate::db::DbPool;
use crate::error::Result;

/// Get a role by ID
pub async fn get_role_by_id(pool: &DbPool, role_id: &RoleId) -> Result<Option<Role>> {
    let role = sqlx::query_as::<_, Role>(
        r#"
        SELECT id, title, description, location, employment_type, seniority,
               COALESCE(must_have_skills, '{}') AS must_have_skills,
               COALESCE(nice_to_have_skills, '{}') AS nice_to_have_skills,
               salary_min, salary_max, salary_currency,
               knockout_criteria, scoring_weights, is_active
        FROM roles
        WHERE id = $1
        "#,
    )
    .bind(role_id)
    .fetch_optional(pool)
    .await?;

    Ok(role)
}
