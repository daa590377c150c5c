//! Token results produced by acquisition attempts.

// crates.io
use serde::{Deserializer, de::Error as DeError};
use serde_json::Value;
// self
use crate::{_prelude::*, auth::TokenSecret};

/// Classification of a [`TokenResult`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenOutcome {
	/// An access token is present.
	Success,
	/// No access token, but the provider reported `error` and/or `error_description`.
	ErrorResult,
	/// Neither an access token nor any error detail.
	Indeterminate,
}

/// Raw result of one acquisition attempt.
///
/// Mirrors the token endpoint's JSON payload: the well-known fields are typed, everything else
/// the provider returns is kept verbatim in [`extra`](Self::extra). A result is successful iff
/// [`access_token`](Self::access_token) is present and non-null.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenResult {
	/// Access token issued by the provider.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub access_token: Option<TokenSecret>,
	/// Refresh token issued alongside the access token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
	/// Token type reported by the provider (usually `Bearer`).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_type: Option<String>,
	/// Lifetime of the access token in seconds.
	#[serde(
		default,
		deserialize_with = "deserialize_seconds",
		skip_serializing_if = "Option::is_none"
	)]
	pub expires_in: Option<u64>,
	/// OAuth error code.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	/// Human-readable error description.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error_description: Option<String>,
	/// Provider fields this crate does not interpret.
	#[serde(flatten)]
	pub extra: BTreeMap<String, Value>,
}
impl TokenResult {
	/// Successful result carrying `access_token`.
	pub fn success(access_token: impl Into<String>) -> Self {
		Self { access_token: Some(TokenSecret::new(access_token)), ..Default::default() }
	}

	/// Error result carrying an OAuth error code and optional description.
	pub fn error(error: impl Into<String>, description: Option<&str>) -> Self {
		Self {
			error: Some(error.into()),
			error_description: description.map(str::to_owned),
			..Default::default()
		}
	}

	/// Parses a token endpoint payload, reporting the JSON path of any mismatch.
	pub fn from_json_slice(
		bytes: &[u8],
	) -> Result<Self, serde_path_to_error::Error<serde_json::Error>> {
		let mut deserializer = serde_json::Deserializer::from_slice(bytes);

		serde_path_to_error::deserialize(&mut deserializer)
	}

	/// Sets the token lifetime.
	pub fn with_expires_in(mut self, seconds: u64) -> Self {
		self.expires_in = Some(seconds);

		self
	}

	/// Sets the refresh token.
	pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Classifies the result.
	pub fn outcome(&self) -> TokenOutcome {
		if self.access_token.is_some() {
			TokenOutcome::Success
		} else if self.error.is_some() || self.error_description.is_some() {
			TokenOutcome::ErrorResult
		} else {
			TokenOutcome::Indeterminate
		}
	}

	/// Returns true when an access token is present.
	///
	/// An explicit `"access_token": null` counts as absent.
	pub fn is_success(&self) -> bool {
		self.access_token.is_some()
	}

	/// Absolute expiry relative to `issued_at`, when the provider reported a lifetime.
	pub fn expires_at(&self, issued_at: OffsetDateTime) -> Option<OffsetDateTime> {
		let seconds = i64::try_from(self.expires_in?).ok()?;

		issued_at.checked_add(Duration::seconds(seconds))
	}

	/// Looks up a provider field that is not modeled explicitly.
	pub fn extra(&self, key: &str) -> Option<&Value> {
		self.extra.get(key)
	}
}

fn deserialize_seconds<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
	D: Deserializer<'de>,
{
	match Option::<Value>::deserialize(deserializer)? {
		None | Some(Value::Null) => Ok(None),
		Some(Value::Number(number)) =>
			number.as_u64().map(Some).ok_or_else(|| DeError::custom("expires_in must be non-negative")),
		Some(Value::String(text)) => text.trim().parse().map(Some).map_err(DeError::custom),
		Some(other) => Err(DeError::custom(format!("unexpected expires_in value: {other}"))),
	}
}
