use std::{
	collections::HashMap,
	sync::{
		Mutex,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use color_eyre::eyre;
use serde_json::Value;

use cmeq_config::{EmbeddingProviderConfig, LlmProviderConfig};
use cmeq_service::{
	BoxFuture, CatalogStore, ChunkIndex, CompletionProvider, EmbeddingProvider, PhysicianStore,
};
use cmeq_storage::{
	Error as StorageError,
	models::{CatalogMatch, ChunkHit, CmeEvent, PhysicianPreference, PhysicianRecord},
	queries::{NearestChunks, NearestEvents},
};

/// Catalog, physician, and chunk tables held in memory. Chunks are returned in insertion order,
/// so tests list them best-first.
#[derive(Default)]
pub struct InMemoryStore {
	chunks: Vec<ChunkHit>,
	events: Vec<CmeEvent>,
	physicians: HashMap<i64, PhysicianRecord>,
	preferences: HashMap<i64, PhysicianPreference>,
	completed: HashMap<i64, Vec<i64>>,
	fail_search: bool,
	fail_physicians: bool,
	search_delay: Option<Duration>,
	search_calls: AtomicUsize,
	physician_calls: AtomicUsize,
	last_top_k: Mutex<Option<u32>>,
}
impl InMemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_chunk(mut self, chunk: ChunkHit) -> Self {
		self.chunks.push(chunk);

		self
	}

	pub fn with_event(mut self, event: CmeEvent) -> Self {
		self.events.push(event);

		self
	}

	pub fn with_physician(mut self, physician_id: i64, specialty: Option<&str>) -> Self {
		self.physicians.insert(
			physician_id,
			PhysicianRecord { physician_id, specialty_name: specialty.map(str::to_string) },
		);

		self
	}

	pub fn with_preference(
		mut self,
		physician_id: i64,
		travel_pref: Option<&str>,
		modality_pref: Option<&str>,
	) -> Self {
		self.preferences.insert(
			physician_id,
			PhysicianPreference {
				travel_pref: travel_pref.map(str::to_string),
				modality_pref: modality_pref.map(str::to_string),
			},
		);

		self
	}

	pub fn with_completed(mut self, physician_id: i64, event_ids: &[i64]) -> Self {
		self.completed.entry(physician_id).or_default().extend_from_slice(event_ids);

		self
	}

	/// Makes every similarity query fail.
	pub fn failing_search(mut self) -> Self {
		self.fail_search = true;

		self
	}

	/// Delays every chunk similarity query by `delay`.
	pub fn slow_search(mut self, delay: Duration) -> Self {
		self.search_delay = Some(delay);

		self
	}

	/// Makes every physician lookup fail.
	pub fn failing_physicians(mut self) -> Self {
		self.fail_physicians = true;

		self
	}

	pub fn search_calls(&self) -> usize {
		self.search_calls.load(Ordering::SeqCst)
	}

	pub fn physician_calls(&self) -> usize {
		self.physician_calls.load(Ordering::SeqCst)
	}

	pub fn last_top_k(&self) -> Option<u32> {
		*self.last_top_k.lock().unwrap_or_else(|err| err.into_inner())
	}

	fn search_failure(&self) -> Option<StorageError> {
		self.fail_search.then(|| StorageError::Sqlx(sqlx::Error::PoolTimedOut))
	}

	fn physician_failure(&self) -> Option<StorageError> {
		self.fail_physicians.then(|| StorageError::Sqlx(sqlx::Error::PoolTimedOut))
	}
}
impl ChunkIndex for InMemoryStore {
	fn nearest_chunks<'a>(
		&'a self,
		args: NearestChunks<'a>,
	) -> BoxFuture<'a, cmeq_storage::Result<Vec<ChunkHit>>> {
		Box::pin(async move {
			self.search_calls.fetch_add(1, Ordering::SeqCst);
			*self.last_top_k.lock().unwrap_or_else(|err| err.into_inner()) = Some(args.top_k);

			if let Some(delay) = self.search_delay {
				tokio::time::sleep(delay).await;
			}

			if let Some(err) = self.search_failure() {
				return Err(err);
			}

			Ok(self
				.chunks
				.iter()
				.filter(|chunk| chunk.embedding_model == args.embedding_model)
				.filter(|chunk| args.source_type.is_none_or(|source| chunk.source_type == source))
				.take(args.top_k as usize)
				.cloned()
				.collect())
		})
	}

	fn nearest_events<'a>(
		&'a self,
		args: NearestEvents<'a>,
	) -> BoxFuture<'a, cmeq_storage::Result<Vec<CatalogMatch>>> {
		Box::pin(async move {
			self.search_calls.fetch_add(1, Ordering::SeqCst);

			if let Some(err) = self.search_failure() {
				return Err(err);
			}

			Ok(self
				.chunks
				.iter()
				.filter(|chunk| {
					chunk.embedding_model == args.embedding_model
						&& chunk.source_type == args.source_type
				})
				.filter_map(|chunk| {
					let event = self
						.events
						.iter()
						.find(|event| Some(event.id) == chunk.source_id && event.is_active)?;

					Some(CatalogMatch {
						cme_id: event.id,
						title: event.title.clone(),
						description: event.description.clone(),
						credit_type: event.credit_type.clone(),
						credits: event.credits,
						provider_name: event.provider_name.clone(),
						format: event.format.clone(),
						audience: event.audience.clone(),
						score: chunk.score,
					})
				})
				.take(args.limit as usize)
				.collect())
		})
	}
}
impl CatalogStore for InMemoryStore {
	fn events_by_ids<'a>(
		&'a self,
		ids: &'a [i64],
	) -> BoxFuture<'a, cmeq_storage::Result<Vec<CmeEvent>>> {
		Box::pin(async move {
			Ok(self.events.iter().filter(|event| ids.contains(&event.id)).cloned().collect())
		})
	}
}
impl PhysicianStore for InMemoryStore {
	fn physician(
		&self,
		physician_id: i64,
	) -> BoxFuture<'_, cmeq_storage::Result<Option<PhysicianRecord>>> {
		Box::pin(async move {
			self.physician_calls.fetch_add(1, Ordering::SeqCst);

			if let Some(err) = self.physician_failure() {
				return Err(err);
			}

			Ok(self.physicians.get(&physician_id).cloned())
		})
	}

	fn preference(
		&self,
		physician_id: i64,
	) -> BoxFuture<'_, cmeq_storage::Result<Option<PhysicianPreference>>> {
		Box::pin(async move {
			if let Some(err) = self.physician_failure() {
				return Err(err);
			}

			Ok(self.preferences.get(&physician_id).cloned())
		})
	}

	fn completed_event_ids(
		&self,
		physician_id: i64,
	) -> BoxFuture<'_, cmeq_storage::Result<Vec<i64>>> {
		Box::pin(async move {
			if let Some(err) = self.physician_failure() {
				return Err(err);
			}

			Ok(self.completed.get(&physician_id).cloned().unwrap_or_default())
		})
	}
}

/// Returns a constant vector of the configured width for every input.
pub struct StubEmbedding {
	dim: AtomicUsize,
	calls: AtomicUsize,
}
impl StubEmbedding {
	pub fn new(dim: usize) -> Self {
		Self { dim: AtomicUsize::new(dim), calls: AtomicUsize::new(0) }
	}

	/// Changes the width of subsequent vectors.
	pub fn set_dim(&self, dim: usize) {
		self.dim.store(dim, Ordering::SeqCst);
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl EmbeddingProvider for StubEmbedding {
	fn embed<'a>(
		&'a self,
		_: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let dim = self.dim.load(Ordering::SeqCst);
		let vectors = texts.iter().map(|_| vec![0.1; dim]).collect();

		Box::pin(async move { Ok(vectors) })
	}
}

#[derive(Debug, Clone)]
pub enum CompletionMode {
	Reply(String),
	Fail,
	Blank,
	/// Sleeps before replying; pair with a short `providers.llm.timeout_ms`.
	Slow(Duration),
}

pub struct StubCompletion {
	mode: CompletionMode,
	calls: AtomicUsize,
	last_messages: Mutex<Vec<Value>>,
}
impl StubCompletion {
	pub fn new(mode: CompletionMode) -> Self {
		Self { mode, calls: AtomicUsize::new(0), last_messages: Mutex::new(Vec::new()) }
	}

	pub fn reply(text: &str) -> Self {
		Self::new(CompletionMode::Reply(text.to_string()))
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn last_messages(&self) -> Vec<Value> {
		self.last_messages.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl CompletionProvider for StubCompletion {
	fn complete<'a>(
		&'a self,
		_: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		*self.last_messages.lock().unwrap_or_else(|err| err.into_inner()) = messages.to_vec();

		let mode = self.mode.clone();

		Box::pin(async move {
			match mode {
				CompletionMode::Reply(text) => Ok(text),
				CompletionMode::Fail => Err(eyre::eyre!("Completion provider unavailable.")),
				CompletionMode::Blank => Ok("   ".to_string()),
				CompletionMode::Slow(delay) => {
					tokio::time::sleep(delay).await;

					Ok("Too late.".to_string())
				},
			}
		})
	}
}
