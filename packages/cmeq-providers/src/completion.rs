use color_eyre::{Result, eyre};
use serde::Deserialize;
use serde_json::Value;

use cmeq_config::LlmProviderConfig;

#[derive(Debug, Deserialize)]
struct ChatCompletion {
	#[serde(default)]
	choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
	message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
	content: Option<String>,
}

/// Sends one chat-completion request and returns the trimmed text of the first choice.
pub async fn complete(cfg: &LlmProviderConfig, messages: &[Value]) -> Result<String> {
	let client = crate::client(cfg.timeout_ms)?;
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"max_tokens": cfg.max_tokens,
		"messages": messages,
	});
	let res = client
		.post(crate::endpoint(&cfg.api_base, &cfg.path))
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let completion: ChatCompletion = res.error_for_status()?.json().await?;

	first_choice_text(completion)
}

fn first_choice_text(completion: ChatCompletion) -> Result<String> {
	let content = completion
		.choices
		.into_iter()
		.next()
		.and_then(|choice| choice.message.content)
		.ok_or_else(|| eyre::eyre!("Completion response has no message content."))?;
	let text = content.trim();

	if text.is_empty() {
		return Err(eyre::eyre!("Completion response content is empty."));
	}

	Ok(text.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(json: Value) -> ChatCompletion {
		serde_json::from_value(json).expect("Failed to decode completion.")
	}

	#[test]
	fn returns_trimmed_first_choice() {
		let completion = parse(serde_json::json!({
			"id": "chatcmpl-1",
			"choices": [
				{ "index": 0, "message": { "role": "assistant", "content": "  Take the sepsis update.\n" } },
				{ "index": 1, "message": { "role": "assistant", "content": "ignored" } }
			]
		}));

		assert_eq!(first_choice_text(completion).expect("Expected text."), "Take the sepsis update.");
	}

	#[test]
	fn blank_or_missing_content_is_an_error() {
		let blank = parse(serde_json::json!({
			"choices": [{ "message": { "role": "assistant", "content": "   " } }]
		}));
		let missing = parse(serde_json::json!({ "choices": [] }));

		assert!(first_choice_text(blank).is_err());
		assert!(first_choice_text(missing).is_err());
	}
}
