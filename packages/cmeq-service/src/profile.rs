use std::collections::BTreeSet;

use serde::Serialize;

use crate::{AskRequest, PhysicianStore, Result};
use cmeq_storage::models::PhysicianPreference;

/// Travel classifications that mean the physician will not travel for CME.
const NO_TRAVEL_PREFS: [&str; 2] = ["no_travel", "local_only"];

/// Explicit personalization fields supplied with a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileOverrides {
	pub physician_id: Option<i64>,
	pub specialty: Option<String>,
	pub state: Option<String>,
	pub preferred_format: Option<String>,
	pub min_credits: Option<f64>,
	pub credit_type: Option<String>,
	pub travel_ok: Option<bool>,
}
impl From<&AskRequest> for ProfileOverrides {
	fn from(req: &AskRequest) -> Self {
		Self {
			physician_id: req.physician_id,
			specialty: req.specialty.clone(),
			state: req.state.clone(),
			preferred_format: req.preferred_format.clone(),
			min_credits: req.min_credits,
			credit_type: req.credit_type.clone(),
			travel_ok: req.travel_ok,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveProfile {
	pub physician_id: Option<i64>,
	pub specialty: Option<String>,
	pub state: Option<String>,
	/// Trimmed and lowercased.
	pub preferred_format: Option<String>,
	pub min_credits: Option<f64>,
	pub credit_type: Option<String>,
	pub travel_ok: bool,
	/// Requirement-gap tracking is not wired to any store yet; always empty.
	pub missing_requirements: Vec<String>,
	pub completed_event_ids: BTreeSet<i64>,
}

#[derive(Debug, Default)]
struct ProfileDraft {
	physician_id: Option<i64>,
	specialty: Option<String>,
	state: Option<String>,
	preferred_format: Option<String>,
	min_credits: Option<f64>,
	credit_type: Option<String>,
	travel_ok: Option<bool>,
	completed_event_ids: BTreeSet<i64>,
}
impl ProfileDraft {
	fn from_overrides(overrides: &ProfileOverrides) -> Self {
		Self {
			physician_id: overrides.physician_id,
			specialty: non_blank(overrides.specialty.as_deref()),
			state: non_blank(overrides.state.as_deref()),
			preferred_format: non_blank(overrides.preferred_format.as_deref()),
			min_credits: overrides.min_credits.filter(|value| value.is_finite()),
			credit_type: non_blank(overrides.credit_type.as_deref()),
			travel_ok: overrides.travel_ok,
			completed_event_ids: BTreeSet::new(),
		}
	}

	fn fill_specialty(&mut self, stored: Option<&str>) {
		if self.specialty.is_none() {
			self.specialty = non_blank(stored);
		}
	}

	fn apply_preference(&mut self, preference: &PhysicianPreference) {
		if self.preferred_format.is_none() {
			self.preferred_format = non_blank(preference.modality_pref.as_deref());
		}
		if self.travel_ok.is_none() {
			self.travel_ok = Some(travel_ok_from_pref(preference.travel_pref.as_deref()));
		}
	}

	fn finish(self) -> EffectiveProfile {
		EffectiveProfile {
			physician_id: self.physician_id,
			specialty: self.specialty,
			state: self.state,
			preferred_format: self
				.preferred_format
				.map(|format| format.trim().to_lowercase())
				.filter(|format| !format.is_empty()),
			min_credits: self.min_credits,
			credit_type: self.credit_type,
			travel_ok: self.travel_ok.unwrap_or(true),
			missing_requirements: Vec::new(),
			completed_event_ids: self.completed_event_ids,
		}
	}
}

/// Builds the profile for one request. An unknown physician id contributes nothing.
pub async fn resolve(
	store: &dyn PhysicianStore,
	overrides: &ProfileOverrides,
) -> Result<EffectiveProfile> {
	let mut draft = ProfileDraft::from_overrides(overrides);

	if let Some(physician_id) = overrides.physician_id {
		match store.physician(physician_id).await? {
			Some(record) => draft.fill_specialty(record.specialty_name.as_deref()),
			None => tracing::debug!(physician_id, "Physician not found; using request overrides."),
		}

		if let Some(preference) = store.preference(physician_id).await? {
			draft.apply_preference(&preference);
		}

		draft.completed_event_ids = store.completed_event_ids(physician_id).await?.into_iter().collect();
	}

	Ok(draft.finish())
}

pub fn travel_ok_from_pref(travel_pref: Option<&str>) -> bool {
	let normalized = travel_pref.unwrap_or_default().trim().to_lowercase();

	!NO_TRAVEL_PREFS.contains(&normalized.as_str())
}

fn non_blank(value: Option<&str>) -> Option<String> {
	value.map(str::trim).filter(|value| !value.is_empty()).map(str::to_string)
}
