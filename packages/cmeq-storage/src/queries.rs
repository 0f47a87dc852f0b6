use crate::{
	Error, Result,
	db::Db,
	models::{CatalogMatch, ChunkHit, CmeEvent, PhysicianPreference, PhysicianRecord},
};

pub struct NearestChunks<'a> {
	pub vector: &'a [f32],
	pub embedding_model: &'a str,
	pub source_type: Option<&'a str>,
	pub top_k: u32,
}

pub struct NearestEvents<'a> {
	pub vector: &'a [f32],
	pub embedding_model: &'a str,
	pub source_type: &'a str,
	pub limit: u32,
}

/// Renders a vector as a pgvector text literal, e.g. `[0.1,0.2]`.
pub fn vector_literal(vec: &[f32]) -> Result<String> {
	if vec.is_empty() {
		return Err(Error::InvalidArgument("Query vector must not be empty.".to_string()));
	}

	let mut out = String::with_capacity(vec.len() * 10 + 2);

	out.push('[');

	for (i, value) in vec.iter().enumerate() {
		if !value.is_finite() {
			return Err(Error::InvalidArgument(format!(
				"Query vector component {i} is not a finite number."
			)));
		}
		if i > 0 {
			out.push(',');
		}

		out.push_str(&value.to_string());
	}

	out.push(']');

	Ok(out)
}

pub async fn nearest_chunks(db: &Db, args: NearestChunks<'_>) -> Result<Vec<ChunkHit>> {
	let literal = vector_literal(args.vector)?;
	let rows = sqlx::query_as::<_, ChunkHit>(
		"\
SELECT
	id::bigint AS id,
	knowledge_chunk_id::bigint AS knowledge_chunk_id,
	source_type,
	source_id::bigint AS source_id,
	chunk_id,
	chunk_text,
	embedding_model,
	(1.0 - (embedding <=> $1::text::vector))::float8 AS score
FROM embedding_store
WHERE embedding_model = $2
	AND ($3::text IS NULL OR source_type = $3)
ORDER BY embedding <=> $1::text::vector
LIMIT $4",
	)
	.bind(literal.as_str())
	.bind(args.embedding_model)
	.bind(args.source_type)
	.bind(i64::from(args.top_k))
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn nearest_events(db: &Db, args: NearestEvents<'_>) -> Result<Vec<CatalogMatch>> {
	let literal = vector_literal(args.vector)?;
	let rows = sqlx::query_as::<_, CatalogMatch>(
		"\
SELECT
	ce.id::bigint AS cme_id,
	ce.title,
	ce.description,
	ce.credit_type,
	ce.credits::float8 AS credits,
	ce.provider_name,
	ce.format,
	ce.audience,
	(1.0 - (es.embedding <=> $1::text::vector))::float8 AS score
FROM embedding_store es
JOIN cme_event ce
	ON es.source_type = $3
	AND es.source_id = ce.id
WHERE ce.is_active = TRUE
	AND es.embedding_model = $2
ORDER BY es.embedding <=> $1::text::vector
LIMIT $4",
	)
	.bind(literal.as_str())
	.bind(args.embedding_model)
	.bind(args.source_type)
	.bind(i64::from(args.limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn events_by_ids(db: &Db, ids: &[i64]) -> Result<Vec<CmeEvent>> {
	if ids.is_empty() {
		return Ok(Vec::new());
	}

	let rows = sqlx::query_as::<_, CmeEvent>(
		"\
SELECT
	id::bigint AS id,
	title,
	description,
	provider_name,
	credits::float8 AS credits,
	credit_type,
	format,
	audience,
	url,
	is_active
FROM cme_event
WHERE id = ANY($1)",
	)
	.bind(ids)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn physician(db: &Db, physician_id: i64) -> Result<Option<PhysicianRecord>> {
	let row = sqlx::query_as::<_, PhysicianRecord>(
		"\
SELECT
	p.id::bigint AS physician_id,
	s.name AS specialty_name
FROM physician p
LEFT JOIN specialty s
	ON s.id = p.primary_specialty_id
WHERE p.id = $1",
	)
	.bind(physician_id)
	.fetch_optional(&db.pool)
	.await?;

	Ok(row)
}

pub async fn physician_preference(
	db: &Db,
	physician_id: i64,
) -> Result<Option<PhysicianPreference>> {
	let row = sqlx::query_as::<_, PhysicianPreference>(
		"\
SELECT
	travel_pref,
	modality_pref
FROM physician_preference
WHERE physician_id = $1
LIMIT 1",
	)
	.bind(physician_id)
	.fetch_optional(&db.pool)
	.await?;

	Ok(row)
}

pub async fn completed_event_ids(db: &Db, physician_id: i64) -> Result<Vec<i64>> {
	let ids = sqlx::query_scalar::<_, i64>(
		"\
SELECT cme_event_id::bigint
FROM physician_completed_cme
WHERE physician_id = $1
	AND cme_event_id IS NOT NULL
ORDER BY cme_event_id",
	)
	.bind(physician_id)
	.fetch_all(&db.pool)
	.await?;

	Ok(ids)
}
