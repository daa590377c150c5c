//! Credential-level error types shared across the registry, strategy, and façade.

// self
use crate::_prelude::*;

/// Credential-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error used for failures raised by external collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical credential error exposed by public APIs.
///
/// [`Error::CredentialUnavailable`] and [`Error::AuthenticationFailed`] are the two classified
/// outcomes; callers in a credential chain move on after the former and stop after the latter.
/// Every other variant is propagated as raised and never reclassified.
#[derive(Debug, ThisError)]
pub enum Error {
	/// The credential cannot produce a token here; try the next credential.
	#[error("{message}")]
	CredentialUnavailable {
		/// Operational message describing why the credential is unavailable.
		message: String,
		/// Underlying failure, when one exists.
		#[source]
		source: Option<BoxError>,
	},
	/// Authentication ran but did not yield a token; surface to the user.
	#[error("{message}")]
	AuthenticationFailed {
		/// Provider-supplied description, or a generic message.
		message: String,
		/// OAuth error code reported by the provider, if any.
		error: Option<String>,
	},

	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The requested tenant could not be resolved.
	#[error(transparent)]
	Tenant(#[from] crate::auth::TenantError),
	/// Token cache failure.
	#[error("{0}")]
	Cache(
		#[from]
		#[source]
		crate::cache::CacheError,
	),
	/// The client application collaborator refused to construct a handle.
	#[error("Client application could not be constructed.")]
	ClientBuild {
		/// Collaborator-specific construction failure.
		#[source]
		source: BoxError,
	},
	/// The acquisition collaborator failed outside the classified shapes.
	#[error("Token acquisition failed: {source}")]
	Acquisition {
		/// Collaborator-specific failure, propagated unmodified.
		#[source]
		source: BoxError,
	},
}
impl Error {
	/// Builds [`Error::CredentialUnavailable`] without an underlying source.
	pub fn unavailable(message: impl Into<String>) -> Self {
		Self::CredentialUnavailable { message: message.into(), source: None }
	}

	/// Builds [`Error::AuthenticationFailed`] without an OAuth error code.
	pub fn authentication_failed(message: impl Into<String>) -> Self {
		Self::AuthenticationFailed { message: message.into(), error: None }
	}

	/// Returns true when a credential chain should continue with its next member.
	pub fn is_unavailable(&self) -> bool {
		matches!(self, Self::CredentialUnavailable { .. })
	}
}

/// Configuration and validation failures raised while building a credential.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Authority host cannot be parsed.
	#[error("Authority host `{authority}` is not a valid URL.")]
	InvalidAuthority {
		/// Authority host as supplied.
		authority: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Authority host does not use HTTPS.
	#[error("Authority host must use HTTPS: {url}.")]
	InsecureAuthority {
		/// Authority URL that failed validation.
		url: String,
	},
	/// Redirect URI cannot be parsed.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Redirect URI lacks the host or port a loopback listener needs.
	#[error("Redirect URI must be a URL with a host and port number, for example http://localhost:8400: {url}.")]
	RedirectMissingPort {
		/// Redirect URI that failed validation.
		url: String,
	},
	/// Interactive timeout must be positive.
	#[error("Interactive timeout must be positive.")]
	NonPositiveTimeout,
	/// Identifier validation failed.
	#[error(transparent)]
	Identifier(#[from] crate::auth::IdentifierError),
	/// Requested scopes are invalid.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// A token request named no scopes.
	#[error("Token requests require at least one scope.")]
	MissingScope,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, sockets, IO).
///
/// Client applications report a loopback listener that cannot be bound as
/// [`TransportError::Io`]; the acquisition strategy treats every variant as socket-level.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the identity provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure (socket bind, accept, read).
	#[error("I/O error occurred during token acquisition.")]
	Io(#[from] std::io::Error),
	/// The provider answered with a body that is not a token payload.
	#[error("Identity provider returned a malformed token response.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as _;
	// self
	use super::*;

	#[test]
	fn classified_errors_display_their_message() {
		let err = Error::unavailable("Couldn't start an HTTP server.");

		assert!(err.is_unavailable());
		assert_eq!(err.to_string(), "Couldn't start an HTTP server.");

		let err = Error::authentication_failed("AADSTS50126: Invalid username or password.");

		assert!(!err.is_unavailable());
		assert_eq!(err.to_string(), "AADSTS50126: Invalid username or password.");
	}

	#[test]
	fn unavailable_keeps_transport_source() {
		let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port 8400 in use");
		let err = Error::CredentialUnavailable {
			message: "Couldn't start an HTTP server.".into(),
			source: Some(Box::new(TransportError::from(io))),
		};
		let source = err.source().expect("Transport failure should be exposed as the source.");

		assert_eq!(source.to_string(), "I/O error occurred during token acquisition.");
	}
}
