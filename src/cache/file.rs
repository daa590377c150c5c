//! File-backed [`TokenCache`] that survives process restarts.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::{ClientId, ScopeList},
	cache::{CacheError, CacheKey, CachedToken, TokenCache},
};

/// Persists cached tokens to a JSON file after each mutation.
#[derive(Clone, Debug)]
pub struct FileTokenCache {
	path: PathBuf,
	inner: Arc<RwLock<HashMap<CacheKey, CachedToken>>>,
}
impl FileTokenCache {
	/// Opens (or creates) a cache at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// File backing this cache.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<HashMap<CacheKey, CachedToken>, CacheError> {
		if !path.exists() {
			return Ok(HashMap::new());
		}

		let metadata = path.metadata().map_err(|e| CacheError::Backend {
			message: format!("Failed to inspect {}: {e}", path.display()),
		})?;

		if metadata.len() == 0 {
			return Ok(HashMap::new());
		}

		let bytes = fs::read(path).map_err(|e| CacheError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;
		let entries: Vec<CachedToken> =
			serde_json::from_slice(&bytes).map_err(|e| CacheError::Serialization {
				message: format!("Failed to parse {}: {e}", path.display()),
			})?;

		Ok(entries.into_iter().map(|token| (token.key(), token)).collect())
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), CacheError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| CacheError::Backend {
				message: format!("Failed to create cache directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, contents: &HashMap<CacheKey, CachedToken>) -> Result<(), CacheError> {
		Self::ensure_parent_exists(&self.path)?;

		let snapshot = contents.values().collect::<Vec<_>>();
		let serialized =
			serde_json::to_vec_pretty(&snapshot).map_err(|e| CacheError::Serialization {
				message: format!("Failed to serialize cache snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| CacheError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| CacheError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| CacheError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| CacheError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl TokenCache for FileTokenCache {
	fn save(&self, token: CachedToken) -> Result<(), CacheError> {
		let mut guard = self.inner.write();

		guard.insert(token.key(), token);
		self.persist_locked(&guard)
	}

	fn find(
		&self,
		authority: &str,
		client_id: &ClientId,
		scopes: &ScopeList,
	) -> Result<Option<CachedToken>, CacheError> {
		let key = CacheKey::new(authority, client_id, scopes);

		Ok(self.inner.read().get(&key).cloned())
	}

	fn remove(
		&self,
		authority: &str,
		client_id: &ClientId,
		scopes: &ScopeList,
	) -> Result<Option<CachedToken>, CacheError> {
		let key = CacheKey::new(authority, client_id, scopes);
		let mut guard = self.inner.write();
		let removed = guard.remove(&key);

		if removed.is_some() {
			self.persist_locked(&guard)?;
		}

		Ok(removed)
	}

	fn len(&self) -> usize {
		self.inner.read().len()
	}
}
