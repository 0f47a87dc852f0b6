use std::time::{Duration, Instant};

use serde_json::{Value, json};

use super::{GENERATION_FALLBACK_ANSWER, context::AnswerContext};
use crate::{CmeService, Error, Result};

pub const SYSTEM_PROMPT: &str = "\
You are an assistant helping physicians choose CME activities.
You will receive:
1) The physician's question.
2) A set of candidate CME activities (with IDs, titles, providers, credits, URLs, and content snippets).
3) A physician profile with specialty, state, preferences, and any missing requirements.

Your job is to:
- Answer the physician's question in clear, practical clinical language.
- Prefer CME activities that match the physician's specialty, state, format and credit preferences, and outstanding requirements.
- Avoid recommending CME that is already listed as completed, unless there are no other good options.
- ONLY use the CME activities provided in the context; do NOT invent new courses.
- Then recommend the best 3-5 CME activities, based on the question AND the profile.
- If information about credits or URLs is missing, just omit it.";

const ANSWER_STRUCTURE: &str = "\
Write your answer in this structure:
1. A concise 1-3 paragraph answer to the question, explicitly tailoring it to the physician's specialty and state when relevant.
2. A bulleted list titled 'Recommended CME Activities' with each bullet containing:
   - CME ID
   - Title
   - Provider (if available)
   - Credits (if available)
   - Format (online/live, etc.)
   - URL (if available)
3. Briefly explain why each activity is a good match for this physician and how it relates to their missing requirements or preferences when applicable.
";

pub fn user_message(question: &str, context: &AnswerContext) -> String {
	format!(
		"Physician Question:\n{question}\n\n{profile}\n\nCME Context:\n{candidates}\n\n{ANSWER_STRUCTURE}",
		profile = context.profile,
		candidates = context.candidates,
	)
}

pub fn build_messages(question: &str, context: &AnswerContext) -> Vec<Value> {
	vec![
		json!({ "role": "system", "content": SYSTEM_PROMPT }),
		json!({ "role": "user", "content": user_message(question, context) }),
	]
}

impl CmeService {
	/// Never fails: any generator problem degrades to [`GENERATION_FALLBACK_ANSWER`].
	pub(crate) async fn generate_answer(&self, question: &str, context: &AnswerContext) -> String {
		let started = Instant::now();

		match self.try_generate(question, context).await {
			Ok(answer) => {
				tracing::info!(
					elapsed_ms = started.elapsed().as_millis() as u64,
					"Answer generated."
				);

				answer
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					elapsed_ms = started.elapsed().as_millis() as u64,
					"Answer generation failed; using fallback answer."
				);

				GENERATION_FALLBACK_ANSWER.to_string()
			},
		}
	}

	async fn try_generate(&self, question: &str, context: &AnswerContext) -> Result<String> {
		let cfg = &self.cfg.providers.llm;
		let messages = build_messages(question, context);
		let call = self.providers.completion.complete(cfg, &messages);
		let text = tokio::time::timeout(Duration::from_millis(cfg.timeout_ms), call)
			.await
			.map_err(|_| Error::Provider {
				message: format!("Completion timed out after {} ms.", cfg.timeout_ms),
			})??;
		let text = text.trim();

		if text.is_empty() {
			return Err(Error::Provider { message: "Completion returned no text.".to_string() });
		}

		Ok(text.to_string())
	}
}
