//! The broker credential façade and the acquisition pipeline behind it.

pub mod classify;
pub mod strategy;

pub use classify::*;
pub use strategy::*;

// self
use crate::{
	_prelude::*,
	auth::{ScopeList, TenantId, TenantResolver, TokenResult},
	cache::CacheInitializer,
	chain::{TokenCredential, TokenFuture},
	client::ClientApplicationFactory,
	config::{BrokerOptions, CredentialConfig},
	error::ConfigError,
	http::HttpTransport,
	registry::{CapabilityMode, ClientApplicationRegistry},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Per-call token request options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenRequestOptions {
	/// Claims challenge from a resource provider, passed through verbatim.
	pub claims: Option<String>,
	/// Tenant override, checked against the configured allow-list.
	pub tenant: Option<TenantId>,
	/// Requests a token carrying continuous access evaluation claims.
	pub enable_cae: bool,
	/// Whether the call runs inside a credential chain.
	pub chain_context: ChainContext,
}
impl TokenRequestOptions {
	/// Attaches a claims challenge.
	pub fn with_claims(mut self, claims: impl Into<String>) -> Self {
		self.claims = Some(claims.into());

		self
	}

	/// Targets `tenant` instead of the configured tenant.
	pub fn with_tenant(mut self, tenant: TenantId) -> Self {
		self.tenant = Some(tenant);

		self
	}

	/// Toggles continuous access evaluation.
	pub fn with_cae(mut self, enable: bool) -> Self {
		self.enable_cae = enable;

		self
	}

	/// Overrides the chain context.
	pub fn with_chain_context(mut self, context: ChainContext) -> Self {
		self.chain_context = context;

		self
	}
}

/// Interactive credential that prefers the platform broker.
///
/// Each call selects (or lazily creates) the client application for the resolved tenant and
/// capability mode, runs the [`AcquisitionStrategy`], and [`classify`]s the outcome. Token
/// persistence belongs to the client application; the credential never writes to a cache.
pub struct BrokerCredential {
	config: Arc<CredentialConfig>,
	registry: ClientApplicationRegistry,
	strategy: AcquisitionStrategy,
}
impl BrokerCredential {
	/// Creates a credential that hands `http` to every client application it constructs.
	///
	/// The configuration is validated again, so values deserialized without the builder are held
	/// to the same rules.
	pub fn with_http_transport(
		config: CredentialConfig,
		factory: Arc<dyn ClientApplicationFactory>,
		http: impl HttpTransport,
	) -> Result<Self> {
		config.validate()?;

		let config = Arc::new(config);
		let strategy = AcquisitionStrategy::from_config(&config);
		let registry = ClientApplicationRegistry::new(config.clone(), factory, Arc::new(http));

		Ok(Self { config, registry, strategy })
	}

	/// Replaces the token cache initializer.
	pub fn with_cache_initializer(mut self, initializer: Arc<dyn CacheInitializer>) -> Self {
		self.registry = self.registry.with_cache_initializer(initializer);

		self
	}

	/// Replaces the tenant resolver.
	pub fn with_tenant_resolver(mut self, resolver: Arc<dyn TenantResolver>) -> Self {
		self.registry = self.registry.with_tenant_resolver(resolver);

		self
	}

	/// Configuration the credential was built with.
	pub fn config(&self) -> &CredentialConfig {
		&self.config
	}

	/// Broker options captured at construction time.
	pub fn broker_options(&self) -> &BrokerOptions {
		&self.strategy.broker
	}

	/// Registry holding this credential's client applications.
	pub fn registry(&self) -> &ClientApplicationRegistry {
		&self.registry
	}

	/// Acquires a token for `scopes`.
	///
	/// Returns the client application's result unchanged on success. Token-less outcomes fail
	/// with [`Error::CredentialUnavailable`] or [`Error::AuthenticationFailed`] depending on
	/// [`TokenRequestOptions::chain_context`]; tenant, cache, construction, and collaborator
	/// failures propagate as their own variants.
	pub async fn request_token(
		&self,
		scopes: &ScopeList,
		options: &TokenRequestOptions,
	) -> Result<TokenResult> {
		if scopes.is_empty() {
			return Err(ConfigError::MissingScope.into());
		}

		let mode = CapabilityMode::from_cae(options.enable_cae);
		let app = self.registry.get_or_create(options.tenant.as_ref(), mode)?;
		let outcome = self.strategy.acquire(app.as_ref(), scopes, options.claims.as_deref()).await;

		classify(outcome, options.chain_context)
	}
}
#[cfg(feature = "reqwest")]
impl BrokerCredential {
	/// Creates a credential backed by the crate's reqwest transport.
	///
	/// The transport never follows redirects.
	pub fn new(config: CredentialConfig, factory: Arc<dyn ClientApplicationFactory>) -> Result<Self> {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(ConfigError::from)?;

		Self::with_http_transport(config, factory, ReqwestHttpClient::with_client(client))
	}
}
impl TokenCredential for BrokerCredential {
	fn get_token<'a>(
		&'a self,
		scopes: &'a ScopeList,
		options: &'a TokenRequestOptions,
	) -> TokenFuture<'a> {
		Box::pin(self.request_token(scopes, options))
	}
}
impl Debug for BrokerCredential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BrokerCredential")
			.field("client_id", &self.config.client_id)
			.field("authority_host", &self.config.authority_host)
			.field("tenant_id", &self.config.tenant_id)
			.field("broker", &self.strategy.broker)
			.field("registry", &self.registry)
			.finish()
	}
}
