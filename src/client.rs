//! Client application collaborator contracts.
//!
//! A client application performs the actual acquisition (authorization code + PKCE behind a
//! loopback listener, or the platform broker reusing the signed-in account) and owns writes to
//! its token cache. The credential only decides which application to use, which attempts to
//! make, and how to read the outcome.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, ScopeList, TokenResult},
	cache::TokenCache,
	config::{ClientCredential, WindowHandle},
	error::{BoxError, TransportError},
	http::HttpTransport,
};

/// Boxed future returned by [`ClientApplication::acquire_token_interactive`].
pub type AcquireFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TokenResult, AcquireError>> + 'a + Send>>;

/// Stateful handle bound to one authority and one token cache.
pub trait ClientApplication
where
	Self: Send + Sync,
{
	/// Runs one interactive (or broker-silent, with [`Prompt::None`]) acquisition.
	///
	/// Resolves with the provider's [`TokenResult`], which may be an error result. Fails with
	/// [`AcquireError::Transport`] when no loopback listener can be bound or the configured
	/// timeout expires while waiting for the redirect.
	fn acquire_token_interactive<'a>(&'a self, request: &'a InteractiveRequest) -> AcquireFuture<'a>;
}

/// Builds client application handles for the registry.
pub trait ClientApplicationFactory
where
	Self: Send + Sync,
{
	/// Constructs a handle from the provided parameters.
	fn new_client_application(
		&self,
		params: ClientApplicationParams,
	) -> Result<Arc<dyn ClientApplication>, BoxError>;
}

/// Failures raised by [`ClientApplication::acquire_token_interactive`].
#[derive(Debug, ThisError)]
pub enum AcquireError {
	/// Socket-level failure: no listener, refused connection, or timeout.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Any other collaborator failure.
	#[error("{source}")]
	Other {
		/// Collaborator-specific failure.
		#[source]
		source: BoxError,
	},
}
impl AcquireError {
	/// Wraps an arbitrary collaborator failure.
	pub fn other(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Other { source: Box::new(src) }
	}

	/// Returns true for socket-level failures.
	pub fn is_transport(&self) -> bool {
		matches!(self, Self::Transport(_))
	}
}

/// Account selection policy for an acquisition attempt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prompt {
	/// Never show UI; succeed only with an account the broker can use silently.
	None,
	/// Let the user pick an account.
	#[default]
	SelectAccount,
}
impl Prompt {
	/// Returns the OIDC `prompt` parameter value.
	pub const fn as_str(self) -> &'static str {
		match self {
			Prompt::None => "none",
			Prompt::SelectAccount => "select_account",
		}
	}
}
impl Display for Prompt {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Parameters of one acquisition attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InteractiveRequest {
	/// Scopes in caller order.
	pub scopes: ScopeList,
	/// Username suggestion pre-filled on the sign-in page.
	pub login_hint: Option<String>,
	/// Claims challenge from a resource provider, passed through verbatim.
	pub claims_challenge: Option<String>,
	/// How long to wait for the user to finish signing in.
	pub timeout: Duration,
	/// Account selection policy.
	pub prompt: Prompt,
	/// Fixed loopback port; `None` lets the listener pick one.
	pub port: Option<u16>,
	/// Window the broker UI should be parented to.
	pub parent_window_handle: Option<WindowHandle>,
	/// Enables Microsoft Account passthrough for legacy first-party applications.
	pub enable_msa_passthrough: bool,
}

/// Everything a factory needs to construct a [`ClientApplication`].
#[derive(Clone)]
pub struct ClientApplicationParams {
	/// Client the user signs in to.
	pub client_id: ClientId,
	/// Confidential client credential, if configured.
	pub client_credential: Option<ClientCredential>,
	/// Declared client capabilities; `Some(["CP1"])` for continuous access evaluation.
	pub capabilities: Option<Vec<String>>,
	/// `{authority_host}/{tenant}`.
	pub authority: String,
	/// Regional authority hint.
	pub regional_authority: Option<String>,
	/// Cache shared by every application of the same capability mode.
	pub token_cache: Arc<dyn TokenCache>,
	/// Transport shared by every application of the credential.
	pub http_client: Arc<dyn HttpTransport>,
	/// Whether authority metadata is discovered and validated.
	pub instance_discovery: bool,
	/// Whether the platform broker may be used. Always true for this credential.
	pub enable_broker: bool,
	/// Whether the application may log personally identifiable information.
	pub enable_pii_log: bool,
}
impl Debug for ClientApplicationParams {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientApplicationParams")
			.field("client_id", &self.client_id)
			.field("client_credential_set", &self.client_credential.is_some())
			.field("capabilities", &self.capabilities)
			.field("authority", &self.authority)
			.field("regional_authority", &self.regional_authority)
			.field("instance_discovery", &self.instance_discovery)
			.field("enable_broker", &self.enable_broker)
			.field("enable_pii_log", &self.enable_pii_log)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn prompt_labels_match_oidc_values() {
		assert_eq!(Prompt::None.to_string(), "none");
		assert_eq!(Prompt::SelectAccount.as_str(), "select_account");
		assert_eq!(Prompt::default(), Prompt::SelectAccount);
	}

	#[test]
	fn acquire_error_keeps_transport_shape() {
		let err = AcquireError::from(TransportError::Io(std::io::Error::new(
			std::io::ErrorKind::AddrInUse,
			"port 8400 in use",
		)));

		assert!(err.is_transport());

		let err = AcquireError::other(std::fmt::Error);

		assert!(!err.is_transport());
		assert_eq!(err.to_string(), std::fmt::Error.to_string());
	}
}
