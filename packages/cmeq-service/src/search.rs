use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{CmeService, Error, Result};
use cmeq_storage::{
	models::{CatalogMatch, ChunkHit},
	queries::{NearestChunks, NearestEvents},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorSearchRequest {
	pub query: String,
	#[serde(default)]
	pub top_k: Option<u32>,
	#[serde(default)]
	pub source_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSearchRequest {
	#[serde(default)]
	pub q: String,
	#[serde(default)]
	pub limit: Option<u32>,
}

impl CmeService {
	pub async fn vector_search(&self, req: VectorSearchRequest) -> Result<Vec<ChunkHit>> {
		let query = required_text(&req.query, "query")?;
		let top_k = self.bounded(req.top_k, self.cfg.search.vector_default_top_k, "top_k")?;
		let source_type = req
			.source_type
			.as_deref()
			.map(str::trim)
			.filter(|value| !value.is_empty())
			.or(self.cfg.search.default_source_type.as_deref());
		let vector = self.embed_query(query).await?;

		Ok(self
			.stores
			.chunks
			.nearest_chunks(NearestChunks {
				vector: &vector,
				embedding_model: &self.cfg.providers.embedding.model,
				source_type,
				top_k,
			})
			.await?)
	}

	pub async fn catalog_search(&self, req: CatalogSearchRequest) -> Result<Vec<CatalogMatch>> {
		let query = required_text(&req.q, "q")?;
		let limit = self.bounded(req.limit, self.cfg.search.catalog_default_limit, "limit")?;
		let vector = self.embed_query(query).await?;

		Ok(self
			.stores
			.chunks
			.nearest_events(NearestEvents {
				vector: &vector,
				embedding_model: &self.cfg.providers.embedding.model,
				source_type: &self.cfg.query.source_type,
				limit,
			})
			.await?)
	}

	pub(crate) async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
		let cfg = &self.cfg.providers.embedding;
		let texts = [query.to_string()];
		let mut vectors = self.providers.embedding.embed(cfg, &texts).await?;
		let vector = vectors.pop().ok_or_else(|| Error::Provider {
			message: "Embedding provider returned no vectors.".to_string(),
		})?;
		let expected = self.cfg.storage.vector.vector_dim as usize;

		if vector.len() != expected {
			return Err(Error::Provider {
				message: format!(
					"Embedding dimension mismatch: expected {expected}, got {}.",
					vector.len()
				),
			});
		}

		Ok(vector)
	}

	/// Ask-pipeline retrieval. Every failure, including the timeout, surfaces as
	/// [`Error::Retrieval`].
	pub(crate) async fn retrieve_chunks(&self, question: &str) -> Result<Vec<ChunkHit>> {
		let query = &self.cfg.query;
		let search = async {
			let vector = self.embed_query(question).await?;
			let chunks = self
				.stores
				.chunks
				.nearest_chunks(NearestChunks {
					vector: &vector,
					embedding_model: &self.cfg.providers.embedding.model,
					source_type: Some(query.source_type.as_str()),
					top_k: query.vector_top_k,
				})
				.await?;

			Ok::<_, Error>(chunks)
		};

		match tokio::time::timeout(Duration::from_millis(query.retrieval_timeout_ms), search).await {
			Ok(Ok(chunks)) => Ok(chunks),
			Ok(Err(err)) => Err(Error::Retrieval { message: err.to_string() }),
			Err(_) => Err(Error::Retrieval {
				message: format!("timed out after {} ms", query.retrieval_timeout_ms),
			}),
		}
	}

	fn bounded(&self, value: Option<u32>, default: u32, key: &str) -> Result<u32> {
		let max = self.cfg.search.max_top_k;
		let value = value.unwrap_or(default);

		if value == 0 || value > max {
			return Err(Error::InvalidRequest {
				message: format!("{key} must be between 1 and {max}."),
			});
		}

		Ok(value)
	}
}

fn required_text<'a>(value: &'a str, key: &str) -> Result<&'a str> {
	let trimmed = value.trim();

	if trimmed.is_empty() {
		return Err(Error::InvalidRequest { message: format!("{key} must not be empty.") });
	}

	Ok(trimmed)
}
