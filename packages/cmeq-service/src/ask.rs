pub mod answer;
pub mod context;
pub mod eligibility;
pub mod ranking;
pub mod recommend;

use std::{collections::HashMap, time::Instant};

use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::{CmeService, Result, profile::{self, ProfileOverrides}};
use cmeq_storage::models::CmeEvent;

pub const EMPTY_QUESTION_ANSWER: &str =
	"Please provide a non-empty question about what CME you are looking for.";
pub const NO_MATCH_ANSWER: &str =
	"I couldn\u{2019}t find any CME activities that match your question in the current catalog.";
pub const NO_ELIGIBLE_ANSWER: &str =
	"I found CME content in the system, but none matched the filters/preferences provided.";
pub const GENERATION_FALLBACK_ANSWER: &str = "I found CME activities matching your question, but could not generate a personalized explanation at this moment. Here are the recommended CME activities based on semantic relevance.";
pub const MATCH_REASON: &str =
	"High semantic similarity to your question and alignment with your profile/preferences.";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AskRequest {
	pub question: String,
	#[serde(default)]
	pub physician_id: Option<i64>,
	#[serde(default)]
	pub specialty: Option<String>,
	#[serde(default)]
	pub state: Option<String>,
	#[serde(default)]
	pub preferred_format: Option<String>,
	#[serde(default)]
	pub min_credits: Option<f64>,
	#[serde(default)]
	pub credit_type: Option<String>,
	#[serde(default)]
	pub travel_ok: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
	/// Echoed exactly as received.
	pub question: String,
	pub answer: String,
	pub recommendations: Vec<Recommendation>,
}
impl AskResponse {
	fn canned(question: &str, answer: &str) -> Self {
		Self { question: question.to_string(), answer: answer.to_string(), recommendations: Vec::new() }
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
	pub entity_id: i64,
	/// 1-based.
	pub rank: u32,
	pub title: String,
	pub provider: Option<String>,
	pub credit_hours: Option<f64>,
	pub url: Option<String>,
	/// In `[0, 1]`, relative to the best recommendation.
	pub score: Option<f64>,
	pub reason: String,
}

impl CmeService {
	pub async fn ask(&self, req: AskRequest) -> Result<AskResponse> {
		let span = tracing::info_span!("ask_cme", request_id = %uuid::Uuid::new_v4());

		self.ask_inner(req).instrument(span).await
	}

	async fn ask_inner(&self, req: AskRequest) -> Result<AskResponse> {
		let started = Instant::now();
		let question = req.question.trim();

		if question.is_empty() {
			return Ok(AskResponse::canned(&req.question, EMPTY_QUESTION_ANSWER));
		}

		let chunks = self.retrieve_chunks(question).await?;

		tracing::info!(
			chunk_count = chunks.len(),
			elapsed_ms = started.elapsed().as_millis() as u64,
			"Vector search complete."
		);

		if chunks.is_empty() {
			return Ok(AskResponse::canned(&req.question, NO_MATCH_ANSWER));
		}

		let overrides = ProfileOverrides::from(&req);
		let profile = profile::resolve(self.stores.physicians.as_ref(), &overrides).await?;

		tracing::info!(
			physician_id = ?profile.physician_id,
			completed_count = profile.completed_event_ids.len(),
			elapsed_ms = started.elapsed().as_millis() as u64,
			"Profile resolved."
		);

		let ranked = ranking::aggregate(&chunks);
		let event_ids = ranked.iter().map(|candidate| candidate.event_id).collect::<Vec<_>>();
		let events = self
			.stores
			.catalog
			.events_by_ids(&event_ids)
			.await?
			.into_iter()
			.map(|event| (event.id, event))
			.collect::<HashMap<i64, CmeEvent>>();
		let max_events = self.cfg.query.max_events as usize;
		let shortlist = eligibility::shortlist(&ranked, &events, &profile, max_events);

		tracing::info!(
			candidate_count = ranked.len(),
			event_count = events.len(),
			shortlisted = shortlist.items.len(),
			relaxed = shortlist.relaxed,
			elapsed_ms = started.elapsed().as_millis() as u64,
			"Candidates ranked and filtered."
		);

		if shortlist.items.is_empty() {
			return Ok(AskResponse::canned(&req.question, NO_ELIGIBLE_ANSWER));
		}

		let base = self.cfg.query.fallback_url_base.as_str();
		let context = context::build(&shortlist.items, &profile, base);
		let answer = self.generate_answer(question, &context).await;
		let recommendations = recommend::build(&shortlist.items, base);

		tracing::info!(
			recommendation_count = recommendations.len(),
			elapsed_ms = started.elapsed().as_millis() as u64,
			"Ask complete."
		);

		Ok(AskResponse { question: req.question.clone(), answer, recommendations })
	}
}

/// Canonical event URL, or `<base>/<id>` when the event has none.
pub(crate) fn resolve_url(event: &CmeEvent, fallback_url_base: &str) -> String {
	match event.url.as_deref().map(str::trim) {
		Some(url) if !url.is_empty() => url.to_string(),
		_ => format!("{}/{}", fallback_url_base.trim_end_matches('/'), event.id),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn event(url: Option<&str>) -> CmeEvent {
		CmeEvent {
			id: 17,
			title: "Stroke Care".to_string(),
			description: None,
			provider_name: None,
			credits: None,
			credit_type: None,
			format: None,
			audience: None,
			url: url.map(str::to_string),
			is_active: true,
		}
	}

	#[test]
	fn canonical_url_wins_over_fallback() {
		assert_eq!(
			resolve_url(&event(Some("https://cme.example.org/stroke")), "https://fallback.test/cme"),
			"https://cme.example.org/stroke"
		);
	}

	#[test]
	fn blank_url_uses_fallback_base() {
		assert_eq!(resolve_url(&event(Some("  ")), "https://fallback.test/cme/"), "https://fallback.test/cme/17");
		assert_eq!(resolve_url(&event(None), "https://fallback.test/cme"), "https://fallback.test/cme/17");
	}

	#[test]
	fn ask_request_accepts_question_only() {
		let req: AskRequest =
			serde_json::from_str(r#"{"question":"sepsis updates"}"#).expect("Failed to parse request.");

		assert_eq!(req.question, "sepsis updates");
		assert_eq!(req.physician_id, None);
		assert_eq!(req.travel_ok, None);
	}
}
