//! Screenings database operations

use crate::db::models::{CandidateId, NewScreening, RoleId, Screening};
use crate::db::DbPool;
use crate::error::Result;

/// Insert or overwrite the screening for (role_id, candidate_id)
///
/// A single `INSERT .. ON CONFLICT` statement, so concurrent recomputations of
/// one pair leave exactly one row: whichever write commits last.
pub async fn upsert_screening(pool: &DbPool, screening: &NewScreening) -> Result<Screening> {
    let result = &screening.result;

    let row = sqlx::query_as::<_, Screening>(
        r#"
        INSERT INTO screenings (
            role_id, candidate_id, score_total, score_breakdown,
            must_haves_satisfied, missing_must_haves, knockout, reasons, flags,
            scorer, created_at
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, clock_timestamp()
        )
        ON CONFLICT (role_id, candidate_id) DO UPDATE
        SET score_total = EXCLUDED.score_total,
            score_breakdown = EXCLUDED.score_breakdown,
            must_haves_satisfied = EXCLUDED.must_haves_satisfied,
            missing_must_haves = EXCLUDED.missing_must_haves,
            knockout = EXCLUDED.knockout,
            reasons = EXCLUDED.reasons,
            flags = EXCLUDED.flags,
            scorer = EXCLUDED.scorer,
            created_at = EXCLUDED.created_at
        RETURNING id, role_id, candidate_id, score_total, score_breakdown,
                  must_haves_satisfied, missing_must_haves, knockout, reasons, flags,
                  scorer, created_at
        "#,
    )
    .bind(&screening.role_id)
    .bind(&screening.candidate_id)
    .bind(result.score_total)
    .bind(&result.score_breakdown)
    .bind(&result.must_haves_satisfied)
    .bind(&result.missing_must_haves)
    .bind(result.knockout)
    .bind(&result.reasons)
    .bind(&result.flags)
    .bind(&screening.scorer)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Get the screening for a pair, if it has been scored
pub async fn get_screening(
    pool: &DbPool,
    role_id: &RoleId,
    candidate_id: &CandidateId,
) -> Result<Option<Screening>> {
    let row = sqlx::query_as::<_, Screening>(
        r#"
        SELECT id, role_id, candidate_id, score_total, score_breakdown,
               must_haves_satisfied, missing_must_haves, knockout, reasons, flags,
               scorer, created_at
        FROM screenings
        WHERE role_id = $1 AND candidate_id = $2
        "#,
    )
    .bind(role_id)
    .bind(candidate_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
