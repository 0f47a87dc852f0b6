use std::{cmp::Ordering, collections::HashMap};

use cmeq_storage::models::ChunkHit;

/// Retrieved chunks grouped under their owning event.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<'a> {
	pub event_id: i64,
	pub score: f64,
	/// In retrieval order.
	pub chunks: Vec<&'a ChunkHit>,
}

/// Groups best-first chunks by event. The chunk at position `i` of `n` contributes `n - i`, so
/// events with several early chunks rank highest. Ties keep first-seen order.
pub fn aggregate(chunks: &[ChunkHit]) -> Vec<Candidate<'_>> {
	let total = chunks.len();
	let mut candidates: Vec<Candidate<'_>> = Vec::new();
	let mut slots: HashMap<i64, usize> = HashMap::new();

	for (position, chunk) in chunks.iter().enumerate() {
		let Some(event_id) = chunk.source_id else {
			tracing::debug!(chunk_row_id = chunk.id, "Dropping chunk without an owning event.");

			continue;
		};
		let slot = *slots.entry(event_id).or_insert_with(|| {
			candidates.push(Candidate { event_id, score: 0.0, chunks: Vec::new() });

			candidates.len() - 1
		});
		let candidate = &mut candidates[slot];

		candidate.score += (total - position) as f64;
		candidate.chunks.push(chunk);
	}

	candidates.sort_by(|a, b| cmp_f64_desc(a.score, b.score));

	candidates
}

pub fn cmp_f64_desc(a: f64, b: f64) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}
