//! Per-tenant, per-capability client application registry.
//!
//! Handles are created lazily on first use for a `(tenant, mode)` key and live as long as the
//! registry. Each [`CapabilityMode`] owns a partition holding its token cache and its
//! applications; the partition mutex is held across lookup and construction, so concurrent first
//! calls for one key publish a single handle.

// self
use crate::{
	_prelude::*,
	auth::{DefaultTenantResolver, TenantId, TenantResolver},
	cache::{CacheInitializer, MemoryCacheInitializer, PersistentCacheInitializer, TokenCache},
	client::{ClientApplication, ClientApplicationFactory, ClientApplicationParams},
	config::CredentialConfig,
	http::HttpTransport,
};

/// Client capability declared by continuous access evaluation applications.
pub const CAE_CAPABILITY: &str = "CP1";

/// Selects the cache and application partition a request uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityMode {
	/// Regular tokens.
	#[default]
	Standard,
	/// Tokens that carry continuous access evaluation claims.
	ContinuousAccessEvaluation,
}
impl CapabilityMode {
	/// Maps the per-call CAE flag onto a mode.
	pub const fn from_cae(enable_cae: bool) -> Self {
		if enable_cae { Self::ContinuousAccessEvaluation } else { Self::Standard }
	}

	/// Client capabilities applications of this mode declare.
	pub fn capabilities(self) -> Option<Vec<String>> {
		match self {
			Self::Standard => None,
			Self::ContinuousAccessEvaluation => Some(vec![CAE_CAPABILITY.to_owned()]),
		}
	}

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Standard => "standard",
			Self::ContinuousAccessEvaluation => "cae",
		}
	}
}

#[derive(Default)]
struct Partition {
	cache: Option<Arc<dyn TokenCache>>,
	applications: HashMap<TenantId, Arc<dyn ClientApplication>>,
}

/// Owns the client applications and token caches of one credential.
pub struct ClientApplicationRegistry {
	config: Arc<CredentialConfig>,
	factory: Arc<dyn ClientApplicationFactory>,
	cache_initializer: Arc<dyn CacheInitializer>,
	tenant_resolver: Arc<dyn TenantResolver>,
	http: Arc<dyn HttpTransport>,
	standard: Mutex<Partition>,
	cae: Mutex<Partition>,
}
impl ClientApplicationRegistry {
	/// Creates an empty registry.
	///
	/// Caches come from a [`PersistentCacheInitializer`] when the configuration names a
	/// persistence location and from a [`MemoryCacheInitializer`] otherwise; tenants resolve
	/// through [`DefaultTenantResolver`].
	pub fn new(
		config: Arc<CredentialConfig>,
		factory: Arc<dyn ClientApplicationFactory>,
		http: Arc<dyn HttpTransport>,
	) -> Self {
		let cache_initializer: Arc<dyn CacheInitializer> = match config.cache_persistence.clone() {
			Some(options) => Arc::new(PersistentCacheInitializer::new(options)),
			None => Arc::new(MemoryCacheInitializer),
		};

		Self {
			config,
			factory,
			cache_initializer,
			tenant_resolver: Arc::new(DefaultTenantResolver::default()),
			http,
			standard: Mutex::default(),
			cae: Mutex::default(),
		}
	}

	/// Replaces the cache initializer.
	pub fn with_cache_initializer(mut self, initializer: Arc<dyn CacheInitializer>) -> Self {
		self.cache_initializer = initializer;

		self
	}

	/// Replaces the tenant resolver.
	pub fn with_tenant_resolver(mut self, resolver: Arc<dyn TenantResolver>) -> Self {
		self.tenant_resolver = resolver;

		self
	}

	/// Returns the application for the resolved tenant and `mode`, creating it on first use.
	///
	/// Fails with [`Error::Tenant`] when the requested tenant is not allowed, [`Error::Cache`]
	/// when the mode's cache cannot be initialized, and [`Error::ClientBuild`] when the factory
	/// rejects the parameters.
	pub fn get_or_create(
		&self,
		requested_tenant: Option<&TenantId>,
		mode: CapabilityMode,
	) -> Result<Arc<dyn ClientApplication>> {
		let tenant = self.tenant_resolver.resolve_tenant(
			&self.config.tenant_id,
			&self.config.additionally_allowed_tenants,
			requested_tenant,
		)?;
		let mut partition = self.partition(mode).lock();
		let token_cache = match partition.cache.as_ref() {
			Some(cache) => cache.clone(),
			None => {
				let cache = self.cache_initializer.initialize_cache(mode)?;

				partition.cache = Some(cache.clone());

				cache
			},
		};

		if let Some(app) = partition.applications.get(&tenant) {
			return Ok(app.clone());
		}

		let params = ClientApplicationParams {
			client_id: self.config.client_id.clone(),
			client_credential: self.config.client_credential.clone(),
			capabilities: mode.capabilities(),
			authority: self.config.authority(&tenant),
			regional_authority: self.config.regional_authority.clone(),
			token_cache,
			http_client: self.http.clone(),
			instance_discovery: !self.config.disable_instance_discovery,
			enable_broker: true,
			enable_pii_log: self.config.enable_support_logging,
		};
		let app = self
			.factory
			.new_client_application(params)
			.map_err(|source| Error::ClientBuild { source })?;

		partition.applications.insert(tenant, app.clone());

		Ok(app)
	}

	/// Cache of `mode`, if it has been initialized.
	pub fn cache(&self, mode: CapabilityMode) -> Option<Arc<dyn TokenCache>> {
		self.partition(mode).lock().cache.clone()
	}

	/// Number of live applications in `mode`.
	pub fn len(&self, mode: CapabilityMode) -> usize {
		self.partition(mode).lock().applications.len()
	}

	fn partition(&self, mode: CapabilityMode) -> &Mutex<Partition> {
		match mode {
			CapabilityMode::Standard => &self.standard,
			CapabilityMode::ContinuousAccessEvaluation => &self.cae,
		}
	}
}
impl Debug for ClientApplicationRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientApplicationRegistry")
			.field("client_id", &self.config.client_id)
			.field("standard_applications", &self.len(CapabilityMode::Standard))
			.field("cae_applications", &self.len(CapabilityMode::ContinuousAccessEvaluation))
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::thread;
	// self
	use super::*;
	use crate::{
		_preludet::*,
		auth::AllowedTenants,
		cache::TokenCachePersistenceOptions,
	};

	fn same_handle(a: &Arc<dyn ClientApplication>, b: &Arc<dyn ClientApplication>) -> bool {
		Arc::as_ptr(a).cast::<()>() == Arc::as_ptr(b).cast::<()>()
	}

	fn registry(
		config: CredentialConfig,
	) -> (ClientApplicationRegistry, Arc<MockFactory>, Arc<CountingCacheInitializer>) {
		let factory = Arc::new(MockFactory::default());
		let caches = Arc::new(CountingCacheInitializer::default());
		let registry =
			ClientApplicationRegistry::new(Arc::new(config), factory.clone(), Arc::new(NullHttpTransport))
				.with_cache_initializer(caches.clone());

		(registry, factory, caches)
	}

	fn tenant(value: &str) -> TenantId {
		TenantId::new(value).expect("Tenant fixture should be valid.")
	}

	#[test]
	fn repeated_keys_reuse_handle_and_cache() {
		let (registry, factory, caches) = registry(test_config());
		let first = registry
			.get_or_create(None, CapabilityMode::Standard)
			.expect("First lookup should construct an application.");
		let second = registry
			.get_or_create(None, CapabilityMode::Standard)
			.expect("Second lookup should reuse the application.");

		assert!(same_handle(&first, &second));
		assert_eq!(factory.built().len(), 1);
		assert_eq!(caches.count(CapabilityMode::Standard), 1);
		assert_eq!(caches.count(CapabilityMode::ContinuousAccessEvaluation), 0);
	}

	#[test]
	fn construction_parameters_follow_configuration() {
		let config = CredentialConfig::builder(
			crate::auth::ClientId::new("client-test").expect("Client fixture should be valid."),
		)
		.tenant_id(tenant("contoso"))
		.regional_authority("westus2")
		.disable_instance_discovery(true)
		.enable_support_logging(true)
		.build()
		.expect("Configuration fixture should build.");
		let (registry, factory, _) = registry(config);

		registry
			.get_or_create(None, CapabilityMode::Standard)
			.expect("Lookup should construct an application.");

		let built = factory.built();
		let params = &built[0].params;

		assert_eq!(params.authority, "https://login.microsoftonline.com/contoso");
		assert_eq!(params.capabilities, None);
		assert_eq!(params.regional_authority.as_deref(), Some("westus2"));
		assert!(!params.instance_discovery);
		assert!(params.enable_broker);
		assert!(params.enable_pii_log);
		assert!(params.client_credential.is_none());
	}

	#[test]
	fn cae_uses_a_separate_partition() {
		let (registry, factory, caches) = registry(test_config());
		let standard = registry
			.get_or_create(None, CapabilityMode::Standard)
			.expect("Standard lookup should succeed.");
		let cae = registry
			.get_or_create(None, CapabilityMode::ContinuousAccessEvaluation)
			.expect("CAE lookup should succeed.");
		let built = factory.built();

		assert!(!same_handle(&standard, &cae));
		assert_eq!(built.len(), 2);
		assert_eq!(built[1].params.capabilities, Some(vec!["CP1".to_owned()]));
		assert_eq!(caches.count(CapabilityMode::ContinuousAccessEvaluation), 1);

		let standard_cache =
			registry.cache(CapabilityMode::Standard).expect("Standard cache should exist.");
		let cae_cache = registry
			.cache(CapabilityMode::ContinuousAccessEvaluation)
			.expect("CAE cache should exist.");

		assert!(
			Arc::as_ptr(&standard_cache).cast::<()>() != Arc::as_ptr(&cae_cache).cast::<()>()
		);
	}

	#[test]
	fn tenants_share_the_mode_cache() {
		let config = CredentialConfig::builder(
			crate::auth::ClientId::new("client-test").expect("Client fixture should be valid."),
		)
		.additionally_allowed_tenants(AllowedTenants::any())
		.build()
		.expect("Configuration fixture should build.");
		let (registry, factory, caches) = registry(config);
		let home = registry
			.get_or_create(None, CapabilityMode::Standard)
			.expect("Configured tenant lookup should succeed.");
		let guest = registry
			.get_or_create(Some(&tenant("guest")), CapabilityMode::Standard)
			.expect("Allowed tenant lookup should succeed.");
		let built = factory.built();

		assert!(!same_handle(&home, &guest));
		assert_eq!(registry.len(CapabilityMode::Standard), 2);
		assert_eq!(caches.count(CapabilityMode::Standard), 1);
		assert_eq!(built[1].params.authority, "https://login.microsoftonline.com/guest");
		assert!(
			Arc::as_ptr(&built[0].params.token_cache).cast::<()>()
				== Arc::as_ptr(&built[1].params.token_cache).cast::<()>()
		);
	}

	#[test]
	fn concurrent_first_use_publishes_one_handle() {
		let (registry, factory, caches) = registry(test_config());
		let handles = thread::scope(|scope| {
			let workers = (0..8)
				.map(|_| scope.spawn(|| registry.get_or_create(None, CapabilityMode::Standard)))
				.collect::<Vec<_>>();

			workers
				.into_iter()
				.map(|worker| {
					worker
						.join()
						.expect("Registry worker should not panic.")
						.expect("Concurrent lookup should succeed.")
				})
				.collect::<Vec<_>>()
		});

		assert_eq!(factory.built().len(), 1);
		assert_eq!(caches.count(CapabilityMode::Standard), 1);
		assert!(handles.iter().all(|handle| same_handle(handle, &handles[0])));
	}

	#[test]
	fn disallowed_tenant_never_reaches_the_factory() {
		let (registry, factory, caches) = registry(test_config());
		let err = match registry.get_or_create(Some(&tenant("rogue")), CapabilityMode::Standard) {
			Ok(_) => panic!("Tenants outside the allow-list must be rejected."),
			Err(err) => err,
		};

		assert!(matches!(err, Error::Tenant(_)));
		assert!(factory.built().is_empty());
		assert_eq!(caches.count(CapabilityMode::Standard), 0);
	}

	#[test]
	fn construction_failures_propagate_unclassified() {
		let (registry, factory, _) = registry(test_config());

		factory.fail_construction("bad authority");

		let err = match registry.get_or_create(None, CapabilityMode::Standard) {
			Ok(_) => panic!("Factory failures must propagate."),
			Err(err) => err,
		};

		assert!(matches!(err, Error::ClientBuild { .. }));
		assert!(!err.is_unavailable());
		assert_eq!(registry.len(CapabilityMode::Standard), 0);
	}

	#[test]
	fn persistence_options_select_file_caches() {
		let directory = std::env::temp_dir().join(format!(
			"broker_credential_registry_{}_{}",
			std::process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		));
		let config = CredentialConfig::builder(
			crate::auth::ClientId::new("client-test").expect("Client fixture should be valid."),
		)
		.cache_persistence(TokenCachePersistenceOptions::new(&directory))
		.build()
		.expect("Configuration fixture should build.");
		let factory = Arc::new(MockFactory::default());
		let registry =
			ClientApplicationRegistry::new(Arc::new(config), factory, Arc::new(NullHttpTransport));

		registry
			.get_or_create(None, CapabilityMode::ContinuousAccessEvaluation)
			.expect("Lookup with a persistent cache should succeed.");

		assert!(registry.cache(CapabilityMode::ContinuousAccessEvaluation).is_some());
		assert!(registry.cache(CapabilityMode::Standard).is_none());

		std::fs::remove_dir_all(&directory).unwrap_or_else(|e| {
			panic!("Failed to remove temporary cache directory {}: {e}", directory.display())
		});
	}
}
