use serde::{Deserialize, Serialize};

/// One row of `cme_event`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CmeEvent {
	pub id: i64,
	pub title: String,
	pub description: Option<String>,
	pub provider_name: Option<String>,
	pub credits: Option<f64>,
	pub credit_type: Option<String>,
	pub format: Option<String>,
	pub audience: Option<String>,
	pub url: Option<String>,
	pub is_active: bool,
}

/// A chunk returned by nearest-neighbour search over `embedding_store`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChunkHit {
	pub id: i64,
	pub knowledge_chunk_id: i64,
	pub source_type: String,
	/// Owning entity, e.g. the `cme_event.id` for `source_type = 'cme_event'`.
	pub source_id: Option<i64>,
	pub chunk_id: Option<String>,
	pub chunk_text: String,
	pub embedding_model: String,
	/// Cosine similarity, `1 - distance`.
	pub score: f64,
}

/// An active event matched through one of its chunks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CatalogMatch {
	pub cme_id: i64,
	pub title: String,
	pub description: Option<String>,
	pub credit_type: Option<String>,
	pub credits: Option<f64>,
	pub provider_name: Option<String>,
	pub format: Option<String>,
	pub audience: Option<String>,
	pub score: f64,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PhysicianRecord {
	pub physician_id: i64,
	pub specialty_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, sqlx::FromRow)]
pub struct PhysicianPreference {
	pub travel_pref: Option<String>,
	pub modality_pref: Option<String>,
}
