use std::collections::HashMap;

use super::ranking::Candidate;
use crate::EffectiveProfile;
use cmeq_storage::models::CmeEvent;

/// A candidate that made the final cut, paired with its catalog row.
#[derive(Debug, Clone, Copy)]
pub struct Shortlisted<'a> {
	pub candidate: &'a Candidate<'a>,
	pub event: &'a CmeEvent,
}

#[derive(Debug)]
pub struct Shortlist<'a> {
	pub items: Vec<Shortlisted<'a>>,
	/// True when nothing passed the profile filters and only completed events were excluded.
	pub relaxed: bool,
}

/// Walks candidates in score order and keeps up to `max_events` that pass [`is_eligible`].
/// Candidates without a catalog row are skipped. When nothing passes, the preference filters are
/// dropped and the best `max_events` candidates with a catalog row are taken instead; completed
/// events stay excluded either way.
pub fn shortlist<'a>(
	ranked: &'a [Candidate<'a>],
	events: &'a HashMap<i64, CmeEvent>,
	profile: &EffectiveProfile,
	max_events: usize,
) -> Shortlist<'a> {
	let mut items = Vec::new();

	for candidate in ranked {
		if items.len() >= max_events {
			break;
		}

		let Some(event) = events.get(&candidate.event_id) else {
			continue;
		};

		if !is_eligible(event, profile) {
			continue;
		}
		if credit_type_matches(event, profile) == Some(false) {
			tracing::debug!(event_id = event.id, "Credit type differs from preference; kept.");
		}

		items.push(Shortlisted { candidate, event });
	}

	if !items.is_empty() {
		return Shortlist { items, relaxed: false };
	}

	let items = ranked
		.iter()
		.filter(|candidate| !profile.completed_event_ids.contains(&candidate.event_id))
		.filter_map(|candidate| {
			events.get(&candidate.event_id).map(|event| Shortlisted { candidate, event })
		})
		.take(max_events)
		.collect();

	Shortlist { items, relaxed: true }
}

/// Hard constraints only. Missing catalog data never excludes an event, except for credits,
/// where a missing count is treated as zero.
pub fn is_eligible(event: &CmeEvent, profile: &EffectiveProfile) -> bool {
	if profile.completed_event_ids.contains(&event.id) {
		return false;
	}

	if let Some(min_credits) = profile.min_credits {
		let credits = event.credits.filter(|value| value.is_finite()).unwrap_or(0.0);

		if credits < min_credits {
			return false;
		}
	}
	if let Some(preferred) = profile.preferred_format.as_deref() {
		let format = normalized(event.format.as_deref());

		if !format.is_empty() && format != preferred {
			return false;
		}
	}

	true
}

/// Soft signal: `None` when either side is unknown.
pub fn credit_type_matches(event: &CmeEvent, profile: &EffectiveProfile) -> Option<bool> {
	let preferred = normalized(profile.credit_type.as_deref());
	let offered = normalized(event.credit_type.as_deref());

	if preferred.is_empty() || offered.is_empty() {
		return None;
	}

	Some(offered.contains(&preferred))
}

fn normalized(value: Option<&str>) -> String {
	value.unwrap_or_default().trim().to_lowercase()
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeSet;

	use super::*;

	fn profile() -> EffectiveProfile {
		EffectiveProfile {
			physician_id: None,
			specialty: None,
			state: None,
			preferred_format: None,
			min_credits: None,
			credit_type: None,
			travel_ok: true,
			missing_requirements: Vec::new(),
			completed_event_ids: BTreeSet::new(),
		}
	}

	fn event(id: i64, credits: Option<f64>, format: Option<&str>) -> CmeEvent {
		CmeEvent {
			id,
			title: format!("Event {id}"),
			description: None,
			provider_name: Some("Provider".to_string()),
			credits,
			credit_type: Some("AMA PRA Category 1".to_string()),
			format: format.map(str::to_string),
			audience: None,
			url: None,
			is_active: true,
		}
	}

	fn candidate(event_id: i64, score: f64) -> Candidate<'static> {
		Candidate { event_id, score, chunks: Vec::new() }
	}

	fn catalog(events: Vec<CmeEvent>) -> HashMap<i64, CmeEvent> {
		events.into_iter().map(|event| (event.id, event)).collect()
	}

	#[test]
	fn completed_events_are_excluded() {
		let mut profile = profile();

		profile.completed_event_ids.insert(3);

		assert!(!is_eligible(&event(3, Some(2.0), None), &profile));
		assert!(is_eligible(&event(4, Some(2.0), None), &profile));
	}

	#[test]
	fn min_credits_treats_missing_as_zero() {
		let profile = EffectiveProfile { min_credits: Some(1.0), ..profile() };

		assert!(is_eligible(&event(1, Some(1.0), None), &profile));
		assert!(!is_eligible(&event(2, Some(0.5), None), &profile));
		assert!(!is_eligible(&event(3, None, None), &profile));
		assert!(!is_eligible(&event(4, Some(f64::NAN), None), &profile));
	}

	#[test]
	fn unknown_format_passes_format_preference() {
		let profile = EffectiveProfile { preferred_format: Some("online".to_string()), ..profile() };

		assert!(is_eligible(&event(1, None, Some(" Online ")), &profile));
		assert!(!is_eligible(&event(2, None, Some("live")), &profile));
		assert!(is_eligible(&event(3, None, Some("  ")), &profile));
		assert!(is_eligible(&event(4, None, None), &profile));
	}

	#[test]
	fn credit_type_never_excludes() {
		let profile = EffectiveProfile { credit_type: Some("Ethics".to_string()), ..profile() };
		let event = event(1, Some(1.0), None);

		assert_eq!(credit_type_matches(&event, &profile), Some(false));
		assert!(is_eligible(&event, &profile));
	}

	#[test]
	fn shortlist_keeps_score_order_and_caps_results() {
		let ranked = vec![candidate(1, 9.0), candidate(2, 8.0), candidate(3, 7.0), candidate(4, 6.0)];
		let events = catalog(vec![
			event(1, Some(1.0), None),
			event(2, Some(1.0), None),
			event(3, Some(1.0), None),
			event(4, Some(1.0), None),
		]);
		let result = shortlist(&ranked, &events, &profile(), 2);

		assert!(!result.relaxed);
		assert_eq!(result.items.iter().map(|item| item.event.id).collect::<Vec<_>>(), vec![1, 2]);
	}

	#[test]
	fn missing_metadata_is_skipped_not_counted() {
		let ranked = vec![candidate(1, 9.0), candidate(2, 8.0), candidate(3, 7.0)];
		let events = catalog(vec![event(2, Some(1.0), None), event(3, Some(1.0), None)]);
		let result = shortlist(&ranked, &events, &profile(), 2);

		assert_eq!(result.items.iter().map(|item| item.event.id).collect::<Vec<_>>(), vec![2, 3]);
	}

	#[test]
	fn over_filtering_falls_back_to_top_candidates() {
		let ranked = vec![candidate(1, 9.0), candidate(2, 8.0), candidate(3, 7.0)];
		let events =
			catalog(vec![event(1, Some(0.5), None), event(2, None, None), event(3, Some(0.25), None)]);
		let profile = EffectiveProfile { min_credits: Some(10.0), ..profile() };
		let result = shortlist(&ranked, &events, &profile, 2);

		assert!(result.relaxed);
		assert_eq!(result.items.iter().map(|item| item.event.id).collect::<Vec<_>>(), vec![1, 2]);
	}

	#[test]
	fn fallback_skips_missing_metadata_and_completed_events() {
		let ranked =
			vec![candidate(1, 9.0), candidate(2, 8.0), candidate(3, 7.0), candidate(4, 6.0)];
		let events = catalog(vec![
			event(2, Some(0.5), None),
			event(3, Some(0.5), None),
			event(4, Some(0.5), None),
		]);
		let mut profile = EffectiveProfile { min_credits: Some(10.0), ..profile() };

		profile.completed_event_ids.insert(2);

		let result = shortlist(&ranked, &events, &profile, 2);

		assert!(result.relaxed);
		assert_eq!(result.items.iter().map(|item| item.event.id).collect::<Vec<_>>(), vec![3, 4]);
	}

	#[test]
	fn nothing_left_after_fallback_is_empty() {
		let ranked = vec![candidate(1, 9.0)];
		let events = catalog(vec![event(1, Some(1.0), None)]);
		let mut profile = profile();

		profile.completed_event_ids.insert(1);

		let result = shortlist(&ranked, &events, &profile, 5);

		assert!(result.items.is_empty());
	}
}
