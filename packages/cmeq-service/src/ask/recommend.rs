use super::{MATCH_REASON, Recommendation, eligibility::Shortlisted, resolve_url};

/// Scores are relative to the first item, so the best match is always `1.0`.
pub fn build(items: &[Shortlisted<'_>], fallback_url_base: &str) -> Vec<Recommendation> {
	let top = items.first().map(|item| item.candidate.score).unwrap_or_default();

	items
		.iter()
		.enumerate()
		.map(|(idx, item)| {
			let event = item.event;
			let title = event.title.trim();

			Recommendation {
				entity_id: event.id,
				rank: (idx + 1) as u32,
				title: if title.is_empty() { format!("CME {}", event.id) } else { title.to_string() },
				provider: event.provider_name.clone(),
				credit_hours: event.credits,
				url: Some(resolve_url(event, fallback_url_base)),
				score: Some(normalize_score(item.candidate.score, top)),
				reason: MATCH_REASON.to_string(),
			}
		})
		.collect()
}

fn normalize_score(score: f64, top: f64) -> f64 {
	if !top.is_finite() || top <= 0.0 {
		return 0.0;
	}

	score / top
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ask::ranking::Candidate;
	use cmeq_storage::models::CmeEvent;

	fn event(id: i64, title: &str, url: Option<&str>) -> CmeEvent {
		CmeEvent {
			id,
			title: title.to_string(),
			description: None,
			provider_name: Some("Mayo Clinic".to_string()),
			credits: Some(1.5),
			credit_type: None,
			format: None,
			audience: None,
			url: url.map(str::to_string),
			is_active: true,
		}
	}

	#[test]
	fn ranks_are_contiguous_and_scores_relative_to_top() {
		let candidates = [
			Candidate { event_id: 1, score: 8.0, chunks: Vec::new() },
			Candidate { event_id: 2, score: 2.0, chunks: Vec::new() },
		];
		let events = [
			event(1, "Sepsis Update", Some("https://cme.example.org/sepsis")),
			event(2, "  ", None),
		];
		let items = [
			Shortlisted { candidate: &candidates[0], event: &events[0] },
			Shortlisted { candidate: &candidates[1], event: &events[1] },
		];
		let recs = build(&items, "https://cme.example.org/events");

		assert_eq!(recs.iter().map(|rec| rec.rank).collect::<Vec<_>>(), vec![1, 2]);
		assert_eq!(recs[0].score, Some(1.0));
		assert_eq!(recs[1].score, Some(0.25));
		assert_eq!(recs[0].url.as_deref(), Some("https://cme.example.org/sepsis"));
		assert_eq!(recs[1].url.as_deref(), Some("https://cme.example.org/events/2"));
		assert_eq!(recs[1].title, "CME 2");
		assert_eq!(recs[0].credit_hours, Some(1.5));
		assert_eq!(recs[0].reason, MATCH_REASON);
	}

	#[test]
	fn non_positive_top_score_yields_zero() {
		assert_eq!(normalize_score(3.0, 0.0), 0.0);
		assert_eq!(normalize_score(3.0, f64::NAN), 0.0);
		assert_eq!(normalize_score(3.0, 6.0), 0.5);
	}

	#[test]
	fn empty_shortlist_yields_no_recommendations() {
		assert!(build(&[], "https://cme.example.org").is_empty());
	}
}
