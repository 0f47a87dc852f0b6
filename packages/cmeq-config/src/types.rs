use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub query: Query,
	#[serde(default)]
	pub search: Search,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub vector: VectorIndex,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

/// The pgvector-backed `embedding_store` table.
#[derive(Debug, Deserialize)]
pub struct VectorIndex {
	/// Must equal the column dimension of `embedding_store.embedding`.
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub llm: LlmProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	/// Also used to select rows in `embedding_store.embedding_model`.
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	#[serde(default = "default_temperature")]
	pub temperature: f32,
	#[serde(default = "default_max_tokens")]
	pub max_tokens: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

/// Knobs of the ask pipeline.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Query {
	pub source_type: String,
	pub vector_top_k: u32,
	pub max_events: u32,
	pub retrieval_timeout_ms: u64,
	/// Event pages without a canonical URL resolve to `<fallback_url_base>/<event id>`.
	pub fallback_url_base: String,
}
impl Default for Query {
	fn default() -> Self {
		Self {
			source_type: "cme_event".to_string(),
			vector_top_k: 24,
			max_events: 5,
			retrieval_timeout_ms: 30_000,
			fallback_url_base: "https://mycertiq-demo.local/cme".to_string(),
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	pub vector_default_top_k: u32,
	pub catalog_default_limit: u32,
	pub max_top_k: u32,
	pub default_source_type: Option<String>,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			vector_default_top_k: 5,
			catalog_default_limit: 10,
			max_top_k: 50,
			default_source_type: None,
		}
	}
}

fn default_temperature() -> f32 {
	0.4
}

fn default_max_tokens() -> u32 {
	600
}
