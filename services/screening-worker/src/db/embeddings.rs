//! Candidate embeddings database operations

use crate::db::models::{CandidateEmbedding, NewCandidateEmbedding};
use crate::db::DbPool;
use crate::error::Result;
use pgvector::Vector;

/// Insert or wholesale-overwrite a candidate's embedding
pub async fn upsert_embedding(
    pool: &DbPool,
    embedding: &NewCandidateEmbedding,
) -> Result<CandidateEmbedding> {
    let dimensions = i32::try_from(embedding.embedding.len()).unwrap_or(i32::MAX);
    let vector = Vector::from(embedding.embedding.clone());

    let row = sqlx::query_as::<_, CandidateEmbedding>(
        r#"
        INSERT INTO candidate_embeddings (
            candidate_id, embedding, model, dimensions, source_hash, updated_at
        ) VALUES ($1, $2, $3, $4, $5, NOW())
        ON CONFLICT (candidate_id) DO UPDATE
        SET embedding = EXCLUDED.embedding,
            model = EXCLUDED.model,
            dimensions = EXCLUDED.dimensions,
            source_hash = EXCLUDED.source_hash,
            updated_at = EXCLUDED.updated_at
        RETURNING candidate_id, embedding, model, dimensions, source_hash, updated_at
        "#,
    )
    .bind(&embedding.candidate_id)
    .bind(vector)
    .bind(&embedding.model)
    .bind(dimensions)
    .bind(&embedding.source_hash)
    .fetch_one(pool)
    .await?;

    Ok(row)
}
