//! Token cache contracts and built-in cache implementations.
//!
//! One cache exists per [`CapabilityMode`]; every client application of that mode reads and
//! appends through the same [`TokenCache`] handle, so implementations synchronize internally.

pub mod file;
pub mod memory;

pub use file::FileTokenCache;
pub use memory::MemoryTokenCache;

// std
use std::path::PathBuf;
// self
use crate::{
	_prelude::*,
	auth::{ClientId, ScopeList, TokenResult, TokenSecret},
	registry::CapabilityMode,
};

/// Shared token cache contract implemented by cache engines.
pub trait TokenCache
where
	Self: Send + Sync,
{
	/// Persists or replaces a cached token.
	fn save(&self, token: CachedToken) -> Result<(), CacheError>;

	/// Looks up the token for an authority + client + scope combination.
	fn find(
		&self,
		authority: &str,
		client_id: &ClientId,
		scopes: &ScopeList,
	) -> Result<Option<CachedToken>, CacheError>;

	/// Removes the token for an authority + client + scope combination.
	fn remove(
		&self,
		authority: &str,
		client_id: &ClientId,
		scopes: &ScopeList,
	) -> Result<Option<CachedToken>, CacheError>;

	/// Number of cached tokens.
	fn len(&self) -> usize;

	/// Returns true when the cache holds no tokens.
	fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Creates the token cache for a capability mode the first time it is needed.
pub trait CacheInitializer
where
	Self: Send + Sync,
{
	/// Builds the cache backing every client application of `mode`.
	fn initialize_cache(&self, mode: CapabilityMode) -> Result<Arc<dyn TokenCache>, CacheError>;
}

/// Error type produced by [`TokenCache`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CacheError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the cache engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Token material stored for one authority + client + scope combination.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedToken {
	/// Authority (`{host}/{tenant}`) that issued the token.
	pub authority: String,
	/// Client the token was issued to.
	pub client_id: ClientId,
	/// Scopes the token was requested for.
	pub scopes: ScopeList,
	/// Access token secret.
	pub access_token: TokenSecret,
	/// Refresh token secret, if one was issued.
	pub refresh_token: Option<TokenSecret>,
	/// Expiry instant, when the provider reported a lifetime.
	pub expires_at: Option<OffsetDateTime>,
}
impl CachedToken {
	/// Converts a successful [`TokenResult`]; error and indeterminate results yield `None`.
	pub fn from_result(
		authority: &str,
		client_id: &ClientId,
		scopes: &ScopeList,
		result: &TokenResult,
		issued_at: OffsetDateTime,
	) -> Option<Self> {
		let access_token = result.access_token.clone()?;

		Some(Self {
			authority: authority.to_owned(),
			client_id: client_id.clone(),
			scopes: scopes.clone(),
			access_token,
			refresh_token: result.refresh_token.clone(),
			expires_at: result.expires_at(issued_at),
		})
	}

	/// Returns true when the token has a known expiry at or before `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| expires_at <= instant)
	}

	/// Key under which this token is stored.
	pub fn key(&self) -> CacheKey {
		CacheKey::new(&self.authority, &self.client_id, &self.scopes)
	}
}

/// Unique key identifying a cached token.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
	/// Authority component.
	pub authority: String,
	/// Client component.
	pub client_id: ClientId,
	/// Order-insensitive scope fingerprint used for partitioning.
	pub scope_fingerprint: String,
}
impl CacheKey {
	/// Builds a key for the provided authority, client, and scopes.
	pub fn new(authority: &str, client_id: &ClientId, scopes: &ScopeList) -> Self {
		Self {
			authority: authority.to_ascii_lowercase(),
			client_id: client_id.clone(),
			scope_fingerprint: scopes.fingerprint(),
		}
	}
}

/// Location of a persistent, file-backed token cache.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCachePersistenceOptions {
	/// Directory holding the cache files.
	pub directory: PathBuf,
	/// Base name of the cache; CAE caches append `.cae`.
	pub name: String,
}
impl TokenCachePersistenceOptions {
	/// Default cache base name.
	pub const DEFAULT_NAME: &'static str = "broker_credential";

	/// Persistence options rooted at `directory` with the default name.
	pub fn new(directory: impl Into<PathBuf>) -> Self {
		Self { directory: directory.into(), name: Self::DEFAULT_NAME.to_owned() }
	}

	/// Overrides the cache base name.
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = name.into();

		self
	}

	/// File backing the cache for `mode`.
	pub fn path_for(&self, mode: CapabilityMode) -> PathBuf {
		let file = match mode {
			CapabilityMode::Standard => format!("{}.json", self.name),
			CapabilityMode::ContinuousAccessEvaluation => format!("{}.cae.json", self.name),
		};

		self.directory.join(file)
	}
}

/// Initializer handing out a fresh in-memory cache per mode.
#[derive(Clone, Copy, Debug, Default)]
pub struct MemoryCacheInitializer;
impl CacheInitializer for MemoryCacheInitializer {
	fn initialize_cache(&self, _mode: CapabilityMode) -> Result<Arc<dyn TokenCache>, CacheError> {
		Ok(Arc::new(MemoryTokenCache::default()))
	}
}

/// Initializer opening one [`FileTokenCache`] per mode.
#[derive(Clone, Debug)]
pub struct PersistentCacheInitializer {
	/// Where the cache files live.
	pub options: TokenCachePersistenceOptions,
}
impl PersistentCacheInitializer {
	/// Creates an initializer for the provided persistence options.
	pub fn new(options: TokenCachePersistenceOptions) -> Self {
		Self { options }
	}
}
impl CacheInitializer for PersistentCacheInitializer {
	fn initialize_cache(&self, mode: CapabilityMode) -> Result<Arc<dyn TokenCache>, CacheError> {
		Ok(Arc::new(FileTokenCache::open(self.options.path_for(mode))?))
	}
}
