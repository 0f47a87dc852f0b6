pub mod completion;
pub mod embedding;

use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::{
	Client,
	header::{AUTHORIZATION, HeaderMap, HeaderName},
};
use serde_json::{Map, Value};

pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(eyre::eyre!("Default header {key} must be a string."));
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

/// Joins `api_base` and `path` with exactly one slash between them.
pub fn endpoint(api_base: &str, path: &str) -> String {
	let base = api_base.trim_end_matches('/');
	let path = path.trim_start_matches('/');

	if path.is_empty() { base.to_string() } else { format!("{base}/{path}") }
}

pub(crate) fn client(timeout_ms: u64) -> Result<Client> {
	Ok(Client::builder().timeout(Duration::from_millis(timeout_ms)).build()?)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn endpoint_joins_with_single_slash() {
		assert_eq!(
			endpoint("https://api.openai.com/", "/v1/embeddings"),
			"https://api.openai.com/v1/embeddings"
		);
		assert_eq!(endpoint("http://localhost:8080", "v1/chat"), "http://localhost:8080/v1/chat");
		assert_eq!(endpoint("http://localhost:8080/", ""), "http://localhost:8080");
	}
}
