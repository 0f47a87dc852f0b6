pub mod ask;
pub mod profile;
pub mod search;

mod error;

pub use ask::{
	AskRequest, AskResponse, EMPTY_QUESTION_ANSWER, GENERATION_FALLBACK_ANSWER, MATCH_REASON,
	NO_ELIGIBLE_ANSWER, NO_MATCH_ANSWER, Recommendation,
};
pub use error::{Error, Result};
pub use profile::{EffectiveProfile, ProfileOverrides};
pub use search::{CatalogSearchRequest, VectorSearchRequest};

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;

use cmeq_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use cmeq_providers::{completion, embedding};
use cmeq_storage::{
	db::Db,
	models::{CatalogMatch, ChunkHit, CmeEvent, PhysicianPreference, PhysicianRecord},
	queries::{self, NearestChunks, NearestEvents},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Embedding Gateway: text in, fixed-length vectors out.
pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

/// Answer Generator: chat messages in, answer text out.
pub trait CompletionProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

/// Similarity Search over embedded chunks. Results are ordered best-first.
pub trait ChunkIndex
where
	Self: Send + Sync,
{
	fn nearest_chunks<'a>(
		&'a self,
		args: NearestChunks<'a>,
	) -> BoxFuture<'a, cmeq_storage::Result<Vec<ChunkHit>>>;

	fn nearest_events<'a>(
		&'a self,
		args: NearestEvents<'a>,
	) -> BoxFuture<'a, cmeq_storage::Result<Vec<CatalogMatch>>>;
}

pub trait CatalogStore
where
	Self: Send + Sync,
{
	fn events_by_ids<'a>(
		&'a self,
		ids: &'a [i64],
	) -> BoxFuture<'a, cmeq_storage::Result<Vec<CmeEvent>>>;
}

pub trait PhysicianStore
where
	Self: Send + Sync,
{
	fn physician(
		&self,
		physician_id: i64,
	) -> BoxFuture<'_, cmeq_storage::Result<Option<PhysicianRecord>>>;

	fn preference(
		&self,
		physician_id: i64,
	) -> BoxFuture<'_, cmeq_storage::Result<Option<PhysicianPreference>>>;

	fn completed_event_ids(&self, physician_id: i64) -> BoxFuture<'_, cmeq_storage::Result<Vec<i64>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub completion: Arc<dyn CompletionProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		completion: Arc<dyn CompletionProvider>,
	) -> Self {
		Self { embedding, completion }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(HttpProviders);

		Self { embedding: provider.clone(), completion: provider }
	}
}

#[derive(Clone)]
pub struct Stores {
	pub chunks: Arc<dyn ChunkIndex>,
	pub catalog: Arc<dyn CatalogStore>,
	pub physicians: Arc<dyn PhysicianStore>,
}
impl Stores {
	pub fn new(
		chunks: Arc<dyn ChunkIndex>,
		catalog: Arc<dyn CatalogStore>,
		physicians: Arc<dyn PhysicianStore>,
	) -> Self {
		Self { chunks, catalog, physicians }
	}

	pub fn postgres(db: Db) -> Self {
		let db = Arc::new(db);

		Self { chunks: db.clone(), catalog: db.clone(), physicians: db }
	}
}

pub struct CmeService {
	pub cfg: Config,
	pub providers: Providers,
	pub stores: Stores,
}
impl CmeService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self { cfg, providers: Providers::default(), stores: Stores::postgres(db) }
	}

	pub fn with_parts(cfg: Config, providers: Providers, stores: Stores) -> Self {
		Self { cfg, providers, stores }
	}
}

struct HttpProviders;
impl EmbeddingProvider for HttpProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}
impl CompletionProvider for HttpProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(completion::complete(cfg, messages))
	}
}

impl ChunkIndex for Db {
	fn nearest_chunks<'a>(
		&'a self,
		args: NearestChunks<'a>,
	) -> BoxFuture<'a, cmeq_storage::Result<Vec<ChunkHit>>> {
		Box::pin(queries::nearest_chunks(self, args))
	}

	fn nearest_events<'a>(
		&'a self,
		args: NearestEvents<'a>,
	) -> BoxFuture<'a, cmeq_storage::Result<Vec<CatalogMatch>>> {
		Box::pin(queries::nearest_events(self, args))
	}
}
impl CatalogStore for Db {
	fn events_by_ids<'a>(
		&'a self,
		ids: &'a [i64],
	) -> BoxFuture<'a, cmeq_storage::Result<Vec<CmeEvent>>> {
		Box::pin(queries::events_by_ids(self, ids))
	}
}
impl PhysicianStore for Db {
	fn physician(
		&self,
		physician_id: i64,
	) -> BoxFuture<'_, cmeq_storage::Result<Option<PhysicianRecord>>> {
		Box::pin(queries::physician(self, physician_id))
	}

	fn preference(
		&self,
		physician_id: i64,
	) -> BoxFuture<'_, cmeq_storage::Result<Option<PhysicianPreference>>> {
		Box::pin(queries::physician_preference(self, physician_id))
	}

	fn completed_event_ids(&self, physician_id: i64) -> BoxFuture<'_, cmeq_storage::Result<Vec<i64>>> {
		Box::pin(queries::completed_event_ids(self, physician_id))
	}
}
