//! Immutable credential configuration and its validating builder.
//!
//! Everything that does not change between calls lives here: the client, the authority host,
//! the configured tenant and its allow-list, the interactive timeout, the optional fixed
//! redirect URI, and the platform broker options. Per-call options live in
//! [`TokenRequestOptions`](crate::flows::TokenRequestOptions).

// self
use crate::{
	_prelude::*,
	auth::{AllowedTenants, ClientId, TenantId, TokenSecret},
	cache::TokenCachePersistenceOptions,
	error::ConfigError,
};

/// Opaque platform window handle the broker UI is parented to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowHandle(pub u64);

/// Confidential client credential forwarded to client applications.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientCredential {
	/// Shared client secret.
	Secret(TokenSecret),
	/// Signed client assertion.
	Assertion(TokenSecret),
}

/// Options specific to the platform authentication broker.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerOptions {
	/// Window the sign-in UI pops up on top of. GUI applications on Windows should set this.
	pub parent_window_handle: Option<WindowHandle>,
	/// Enables Microsoft Account passthrough; only select legacy first-party apps need it.
	pub enable_msa_passthrough: bool,
	/// Try the signed-in operating system account before prompting.
	pub use_operating_system_account: bool,
}

/// Validated credential configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialConfig {
	/// Client the user signs in to.
	pub client_id: ClientId,
	/// Normalized authority host without a trailing slash.
	pub authority_host: String,
	/// Tenant requests target unless overridden per call.
	pub tenant_id: TenantId,
	/// Tenants per-call overrides may select.
	#[serde(default)]
	pub additionally_allowed_tenants: AllowedTenants,
	/// Username suggestion for the sign-in page.
	#[serde(default)]
	pub login_hint: Option<String>,
	/// Seconds to wait for the user to finish signing in.
	pub timeout_secs: u64,
	/// Redirect URI naming the fixed loopback host and port.
	#[serde(default)]
	pub redirect_uri: Option<Url>,
	/// Regional authority hint forwarded to client applications.
	#[serde(default)]
	pub regional_authority: Option<String>,
	/// Skips authority metadata discovery and validation.
	#[serde(default)]
	pub disable_instance_discovery: bool,
	/// Lets client applications log personally identifiable information.
	#[serde(default)]
	pub enable_support_logging: bool,
	/// Confidential client credential.
	#[serde(default)]
	pub client_credential: Option<ClientCredential>,
	/// File-backed cache location; in-memory caches are used when absent.
	#[serde(default)]
	pub cache_persistence: Option<TokenCachePersistenceOptions>,
	/// Platform broker options.
	#[serde(default)]
	pub broker: BrokerOptions,
}
impl CredentialConfig {
	/// Public cloud authority host.
	pub const DEFAULT_AUTHORITY_HOST: &'static str = "https://login.microsoftonline.com";
	/// Default interactive timeout (5 minutes).
	pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

	/// Creates a new builder for the provided client.
	pub fn builder(client_id: ClientId) -> CredentialConfigBuilder {
		CredentialConfigBuilder::new(client_id)
	}

	/// Authority string for `tenant`.
	pub fn authority(&self, tenant: &TenantId) -> String {
		format!("{}/{tenant}", self.authority_host)
	}

	/// Interactive timeout as a [`Duration`].
	pub fn timeout(&self) -> Duration {
		Duration::seconds(i64::try_from(self.timeout_secs).unwrap_or(i64::MAX))
	}

	/// Fixed loopback port named by the redirect URI.
	pub fn port(&self) -> Option<u16> {
		self.redirect_uri.as_ref().and_then(Url::port)
	}

	/// Validates invariants; deserialized configurations should be checked before use.
	pub fn validate(&self) -> Result<(), ConfigError> {
		parse_authority_host(&self.authority_host)?;

		if self.timeout_secs == 0 {
			return Err(ConfigError::NonPositiveTimeout);
		}
		if let Some(redirect) = self.redirect_uri.as_ref() {
			validate_redirect(redirect)?;
		}

		Ok(())
	}
}

/// Builder for [`CredentialConfig`] values.
#[derive(Debug)]
pub struct CredentialConfigBuilder {
	/// Client the user signs in to.
	pub client_id: ClientId,
	/// Authority host as supplied; a scheme is added when missing.
	pub authority_host: Option<String>,
	/// Configured tenant; defaults to `organizations`.
	pub tenant_id: Option<TenantId>,
	/// Tenants per-call overrides may select.
	pub additionally_allowed_tenants: AllowedTenants,
	/// Username suggestion for the sign-in page.
	pub login_hint: Option<String>,
	/// Interactive timeout in seconds.
	pub timeout_secs: u64,
	/// Redirect URI as supplied.
	pub redirect_uri: Option<String>,
	/// Regional authority hint.
	pub regional_authority: Option<String>,
	/// Skips authority metadata discovery and validation.
	pub disable_instance_discovery: bool,
	/// Lets client applications log personally identifiable information.
	pub enable_support_logging: bool,
	/// Confidential client credential.
	pub client_credential: Option<ClientCredential>,
	/// File-backed cache location.
	pub cache_persistence: Option<TokenCachePersistenceOptions>,
	/// Platform broker options.
	pub broker: BrokerOptions,
}
impl CredentialConfigBuilder {
	/// Creates a new builder seeded with the provided client.
	pub fn new(client_id: ClientId) -> Self {
		Self {
			client_id,
			authority_host: None,
			tenant_id: None,
			additionally_allowed_tenants: AllowedTenants::default(),
			login_hint: None,
			timeout_secs: CredentialConfig::DEFAULT_TIMEOUT_SECS,
			redirect_uri: None,
			regional_authority: None,
			disable_instance_discovery: false,
			enable_support_logging: false,
			client_credential: None,
			cache_persistence: None,
			broker: BrokerOptions::default(),
		}
	}

	/// Sets the authority host, for example `login.microsoftonline.us`.
	pub fn authority_host(mut self, host: impl Into<String>) -> Self {
		self.authority_host = Some(host.into());

		self
	}

	/// Sets the configured tenant.
	pub fn tenant_id(mut self, tenant: TenantId) -> Self {
		self.tenant_id = Some(tenant);

		self
	}

	/// Sets the tenants per-call overrides may select.
	pub fn additionally_allowed_tenants(mut self, tenants: AllowedTenants) -> Self {
		self.additionally_allowed_tenants = tenants;

		self
	}

	/// Sets the username suggestion.
	pub fn login_hint(mut self, hint: impl Into<String>) -> Self {
		self.login_hint = Some(hint.into());

		self
	}

	/// Overrides the interactive timeout in seconds.
	pub fn timeout_secs(mut self, secs: u64) -> Self {
		self.timeout_secs = secs;

		self
	}

	/// Sets a redirect URI naming the loopback host and port.
	pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
		self.redirect_uri = Some(uri.into());

		self
	}

	/// Sets the regional authority hint.
	pub fn regional_authority(mut self, region: impl Into<String>) -> Self {
		self.regional_authority = Some(region.into());

		self
	}

	/// Toggles authority metadata discovery.
	pub fn disable_instance_discovery(mut self, disable: bool) -> Self {
		self.disable_instance_discovery = disable;

		self
	}

	/// Toggles PII logging in client applications.
	pub fn enable_support_logging(mut self, enable: bool) -> Self {
		self.enable_support_logging = enable;

		self
	}

	/// Attaches a confidential client credential.
	pub fn client_credential(mut self, credential: ClientCredential) -> Self {
		self.client_credential = Some(credential);

		self
	}

	/// Persists caches to disk instead of keeping them in memory.
	pub fn cache_persistence(mut self, options: TokenCachePersistenceOptions) -> Self {
		self.cache_persistence = Some(options);

		self
	}

	/// Replaces the broker options wholesale.
	pub fn broker_options(mut self, options: BrokerOptions) -> Self {
		self.broker = options;

		self
	}

	/// Sets the parent window handle.
	pub fn parent_window_handle(mut self, handle: WindowHandle) -> Self {
		self.broker.parent_window_handle = Some(handle);

		self
	}

	/// Toggles Microsoft Account passthrough.
	pub fn enable_msa_passthrough(mut self, enable: bool) -> Self {
		self.broker.enable_msa_passthrough = enable;

		self
	}

	/// Toggles the operating system account attempt.
	pub fn use_operating_system_account(mut self, enable: bool) -> Self {
		self.broker.use_operating_system_account = enable;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<CredentialConfig, ConfigError> {
		let host = parse_authority_host(
			self.authority_host.as_deref().unwrap_or(CredentialConfig::DEFAULT_AUTHORITY_HOST),
		)?;
		let redirect_uri = self
			.redirect_uri
			.map(|raw| Url::parse(&raw).map_err(|source| ConfigError::InvalidRedirect { source }))
			.transpose()?;
		let config = CredentialConfig {
			client_id: self.client_id,
			authority_host: host.as_str().trim_end_matches('/').to_owned(),
			tenant_id: self.tenant_id.unwrap_or_default(),
			additionally_allowed_tenants: self.additionally_allowed_tenants,
			login_hint: self.login_hint,
			timeout_secs: self.timeout_secs,
			redirect_uri,
			regional_authority: self.regional_authority,
			disable_instance_discovery: self.disable_instance_discovery,
			enable_support_logging: self.enable_support_logging,
			client_credential: self.client_credential,
			cache_persistence: self.cache_persistence,
			broker: self.broker,
		};

		config.validate()?;

		Ok(config)
	}
}

fn parse_authority_host(raw: &str) -> Result<Url, ConfigError> {
	let trimmed = raw.trim().trim_end_matches('/');
	let candidate =
		if trimmed.contains("://") { trimmed.to_owned() } else { format!("https://{trimmed}") };
	let url = Url::parse(&candidate)
		.map_err(|source| ConfigError::InvalidAuthority { authority: raw.to_owned(), source })?;

	if url.scheme() != "https" {
		return Err(ConfigError::InsecureAuthority { url: url.to_string() });
	}

	Ok(url)
}

fn validate_redirect(url: &Url) -> Result<(), ConfigError> {
	if url.host_str().is_none() || url.port().is_none() {
		Err(ConfigError::RedirectMissingPort { url: url.to_string() })
	} else {
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn builder() -> CredentialConfigBuilder {
		CredentialConfig::builder(ClientId::new("client-1").expect("Client fixture should be valid."))
	}

	#[test]
	fn defaults_target_public_cloud_organizations() {
		let config = builder().build().expect("Default configuration should build.");

		assert_eq!(config.authority_host, CredentialConfig::DEFAULT_AUTHORITY_HOST);
		assert_eq!(config.tenant_id, TenantId::organizations());
		assert_eq!(config.timeout(), Duration::minutes(5));
		assert_eq!(config.port(), None);
		assert_eq!(config.broker, BrokerOptions::default());
		assert_eq!(
			config.authority(&config.tenant_id),
			"https://login.microsoftonline.com/organizations"
		);
	}

	#[test]
	fn authority_host_gains_scheme_and_loses_trailing_slash() {
		let config = builder()
			.authority_host("login.microsoftonline.us/")
			.build()
			.expect("Bare host should be normalized.");

		assert_eq!(config.authority_host, "https://login.microsoftonline.us");
	}

	#[test]
	fn insecure_authority_is_rejected() {
		let err = builder()
			.authority_host("http://login.example.com")
			.build()
			.expect_err("HTTP authorities must be rejected.");

		assert!(matches!(err, ConfigError::InsecureAuthority { .. }));
	}

	#[test]
	fn redirect_uri_must_name_a_port() {
		let config = builder()
			.redirect_uri("http://localhost:8400")
			.build()
			.expect("Redirect URI with a port should be accepted.");

		assert_eq!(config.port(), Some(8400));

		let err = builder()
			.redirect_uri("http://localhost")
			.build()
			.expect_err("Redirect URI without a port must be rejected.");

		assert!(matches!(err, ConfigError::RedirectMissingPort { .. }));

		let err = builder()
			.redirect_uri("not a url")
			.build()
			.expect_err("Unparseable redirect URI must be rejected.");

		assert!(matches!(err, ConfigError::InvalidRedirect { .. }));
	}

	#[test]
	fn zero_timeout_is_rejected() {
		let err = builder().timeout_secs(0).build().expect_err("Zero timeout must be rejected.");

		assert!(matches!(err, ConfigError::NonPositiveTimeout));
	}

	#[test]
	fn broker_options_round_trip_through_json() {
		let config = builder()
			.parent_window_handle(WindowHandle(0x1234))
			.enable_msa_passthrough(true)
			.use_operating_system_account(true)
			.additionally_allowed_tenants(AllowedTenants::any())
			.build()
			.expect("Broker configuration should build.");
		let json = serde_json::to_string(&config).expect("Configuration should serialize.");
		let parsed: CredentialConfig =
			serde_json::from_str(&json).expect("Configuration should deserialize.");

		assert_eq!(parsed, config);
		assert!(parsed.validate().is_ok());
		assert_eq!(parsed.broker.parent_window_handle, Some(WindowHandle(0x1234)));
	}
}
