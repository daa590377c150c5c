//! Thread-safe in-memory [`TokenCache`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, ScopeList},
	cache::{CacheError, CacheKey, CachedToken, TokenCache},
};

type CacheMap = Arc<RwLock<HashMap<CacheKey, CachedToken>>>;

/// Cache that keeps tokens in-process for the lifetime of the credential.
#[derive(Clone, Debug, Default)]
pub struct MemoryTokenCache(CacheMap);
impl TokenCache for MemoryTokenCache {
	fn save(&self, token: CachedToken) -> Result<(), CacheError> {
		self.0.write().insert(token.key(), token);

		Ok(())
	}

	fn find(
		&self,
		authority: &str,
		client_id: &ClientId,
		scopes: &ScopeList,
	) -> Result<Option<CachedToken>, CacheError> {
		let key = CacheKey::new(authority, client_id, scopes);

		Ok(self.0.read().get(&key).cloned())
	}

	fn remove(
		&self,
		authority: &str,
		client_id: &ClientId,
		scopes: &ScopeList,
	) -> Result<Option<CachedToken>, CacheError> {
		let key = CacheKey::new(authority, client_id, scopes);

		Ok(self.0.write().remove(&key))
	}

	fn len(&self) -> usize {
		self.0.read().len()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::thread;
	// self
	use super::*;
	use crate::auth::TokenSecret;

	fn token(authority: &str, access: &str) -> CachedToken {
		CachedToken {
			authority: authority.into(),
			client_id: ClientId::new("client").expect("Client fixture should be valid."),
			scopes: ScopeList::new(["email"]).expect("Scope fixture should be valid."),
			access_token: TokenSecret::new(access),
			refresh_token: None,
			expires_at: None,
		}
	}

	#[test]
	fn save_find_remove() {
		let cache = MemoryTokenCache::default();
		let cached = token("https://login.example.com/t1", "access-1");

		cache.save(cached.clone()).expect("Saving into the memory cache should succeed.");

		let found = cache
			.find(&cached.authority, &cached.client_id, &cached.scopes)
			.expect("Lookup should succeed.")
			.expect("Saved token should be found.");

		assert_eq!(found.access_token.expose(), "access-1");
		assert_eq!(cache.len(), 1);

		cache
			.remove(&cached.authority, &cached.client_id, &cached.scopes)
			.expect("Removal should succeed.");

		assert!(cache.is_empty());
	}

	#[test]
	fn clones_share_state_across_threads() {
		let cache = MemoryTokenCache::default();
		let handles = (0..8)
			.map(|idx| {
				let cache = cache.clone();

				thread::spawn(move || {
					cache
						.save(token(&format!("https://login.example.com/t{idx}"), "access"))
						.expect("Concurrent saves should succeed.");
				})
			})
			.collect::<Vec<_>>();

		for handle in handles {
			handle.join().expect("Writer thread should not panic.");
		}

		assert_eq!(cache.len(), 8);
	}
}
