use super::{eligibility::Shortlisted, resolve_url};
use crate::EffectiveProfile;

const BLOCK_SEPARATOR: &str = "\n\n-----\n\n";
const NOT_PROVIDED: &str = "Not provided";

/// Text handed to the answer generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerContext {
	/// One block per shortlisted event, in rank order.
	pub candidates: String,
	pub profile: String,
}

pub fn build(
	items: &[Shortlisted<'_>],
	profile: &EffectiveProfile,
	fallback_url_base: &str,
) -> AnswerContext {
	let candidates = items
		.iter()
		.enumerate()
		.map(|(idx, item)| render_candidate(idx + 1, item, fallback_url_base))
		.collect::<Vec<_>>()
		.join(BLOCK_SEPARATOR);

	AnswerContext { candidates, profile: render_profile(profile) }
}

fn render_candidate(rank: usize, item: &Shortlisted<'_>, fallback_url_base: &str) -> String {
	let event = item.event;
	let snippets = item
		.candidate
		.chunks
		.iter()
		.map(|chunk| chunk.chunk_text.trim())
		.filter(|text| !text.is_empty())
		.collect::<Vec<_>>()
		.join("\n\n");
	let credits = match event.credits {
		Some(credits) => format!("Credits: {credits}"),
		None => "Credits: N/A".to_string(),
	};

	format!(
		"Rank: {rank}\n\
		 CME ID: {id}\n\
		 Title: {title}\n\
		 Provider: {provider}\n\
		 {credits}\n\
		 Credit Type: {credit_type}\n\
		 Format: {format}\n\
		 Audience: {audience}\n\
		 URL: {url}\n\
		 Content Snippets:\n\
		 {snippets}",
		id = event.id,
		title = event.title.trim(),
		provider = text_or_empty(event.provider_name.as_deref()),
		credit_type = text_or_empty(event.credit_type.as_deref()),
		format = text_or_empty(event.format.as_deref()),
		audience = text_or_empty(event.audience.as_deref()),
		url = resolve_url(event, fallback_url_base),
	)
}

pub fn render_profile(profile: &EffectiveProfile) -> String {
	let missing = if profile.missing_requirements.is_empty() {
		"None listed".to_string()
	} else {
		profile.missing_requirements.join(", ")
	};
	let completed =
		profile.completed_event_ids.iter().map(i64::to_string).collect::<Vec<_>>().join(", ");

	format!(
		"Physician Profile (if available):\n\
		 - Physician ID: {physician_id}\n\
		 - Specialty: {specialty}\n\
		 - State: {state}\n\
		 - Preferred format: {preferred_format}\n\
		 - Minimum credits per activity: {min_credits}\n\
		 - Preferred credit type: {credit_type}\n\
		 - Travel ok: {travel_ok}\n\
		 - Missing requirements (if any): {missing}\n\
		 - Completed CME IDs (avoid recommending again): [{completed}]\n",
		physician_id = display_or_missing(profile.physician_id),
		specialty = display_or_missing(profile.specialty.as_deref()),
		state = display_or_missing(profile.state.as_deref()),
		preferred_format = display_or_missing(profile.preferred_format.as_deref()),
		min_credits = display_or_missing(profile.min_credits),
		credit_type = display_or_missing(profile.credit_type.as_deref()),
		travel_ok = profile.travel_ok,
	)
}

fn text_or_empty(value: Option<&str>) -> &str {
	value.map(str::trim).unwrap_or_default()
}

fn display_or_missing<T: ToString>(value: Option<T>) -> String {
	value.map(|value| value.to_string()).unwrap_or_else(|| NOT_PROVIDED.to_string())
}
