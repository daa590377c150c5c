//! HTTP transport handle shared by every client application of a credential.
//!
//! Client applications talk to the identity provider (token endpoint, instance discovery)
//! through an [`HttpTransport`] owned by the credential, so one connection pool serves every
//! tenant and capability partition. [`ReqwestHttpClient`] is the default transport; custom
//! stacks implement the trait and pass themselves to
//! [`BrokerCredential::with_http_transport`](crate::flows::BrokerCredential::with_http_transport).

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")] use reqwest::header::{HeaderMap, RETRY_AFTER};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, auth::TokenResult, error::TransportError};

/// Boxed future returned by [`HttpTransport::send`].
pub type HttpFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks used to reach the identity provider.
///
/// Implementations must be `Send + Sync + 'static` so a single handle can be shared by every
/// client application the registry constructs.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Dispatches `request` and resolves with the full response.
	fn send(&self, request: HttpRequest) -> HttpFuture<'_>;
}

/// HTTP methods used against identity provider endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
	/// `GET`, used for metadata discovery.
	Get,
	/// `POST`, used for token requests.
	Post,
}
impl HttpMethod {
	/// Returns the method token.
	pub const fn as_str(self) -> &'static str {
		match self {
			HttpMethod::Get => "GET",
			HttpMethod::Post => "POST",
		}
	}
}

/// Outgoing request.
#[derive(Clone, Debug)]
pub struct HttpRequest {
	/// Request method.
	pub method: HttpMethod,
	/// Target URL.
	pub url: Url,
	/// Header name/value pairs.
	pub headers: Vec<(String, String)>,
	/// Request body.
	pub body: Vec<u8>,
}
impl HttpRequest {
	/// `GET` request without headers.
	pub fn get(url: Url) -> Self {
		Self { method: HttpMethod::Get, url, headers: Vec::new(), body: Vec::new() }
	}

	/// Form-encoded `POST` request.
	pub fn form<'a, I>(url: Url, pairs: I) -> Self
	where
		I: IntoIterator<Item = (&'a str, &'a str)>,
	{
		let mut encoder = url::form_urlencoded::Serializer::new(String::new());

		for (key, value) in pairs {
			encoder.append_pair(key, value);
		}

		Self {
			method: HttpMethod::Post,
			url,
			headers: vec![(
				"content-type".to_owned(),
				"application/x-www-form-urlencoded".to_owned(),
			)],
			body: encoder.finish().into_bytes(),
		}
	}
}

/// Metadata captured from a response for downstream error mapping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseMetadata {
	/// HTTP status code returned by the provider.
	pub status: Option<u16>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}

/// Response returned by an [`HttpTransport`].
#[derive(Clone, Debug)]
pub struct HttpResponse {
	/// Status code and retry hints.
	pub metadata: ResponseMetadata,
	/// Response body.
	pub body: Vec<u8>,
}
impl HttpResponse {
	/// Parses the body as a token endpoint payload.
	///
	/// OAuth error payloads parse into error results rather than failing, so status codes do
	/// not need to be inspected first.
	pub fn token_result(&self) -> Result<TokenResult, TransportError> {
		TokenResult::from_json_slice(&self.body).map_err(|source| {
			TransportError::MalformedResponse { source, status: self.metadata.status }
		})
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Token requests should not follow redirects; configure any custom [`ReqwestClient`] the same
/// way before wrapping it.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestHttpClient {
	fn send(&self, request: HttpRequest) -> HttpFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let method = match request.method {
				HttpMethod::Get => reqwest::Method::GET,
				HttpMethod::Post => reqwest::Method::POST,
			};
			let mut builder = client.request(method, request.url);

			for (name, value) in &request.headers {
				builder = builder.header(name.as_str(), value.as_str());
			}

			let response = builder.body(request.body).send().await?;
			let status = response.status().as_u16();
			let retry_after = parse_retry_after(response.headers());
			let body = response.bytes().await?.to_vec();

			Ok(HttpResponse { metadata: ResponseMetadata { status: Some(status), retry_after }, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u32>() {
		return Some(Duration::seconds(i64::from(secs)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
