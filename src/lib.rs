//! Interactive OAuth 2.0 broker credential.
//!
//! Reuses the signed-in operating system account through the platform broker when asked to, falls
//! back to an interactive loopback browser flow, and classifies token-less outcomes so credential
//! chains know when to move on.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod cache;
pub mod chain;
pub mod client;
pub mod config;
pub mod error;
pub mod flows;
pub mod http;
pub mod obs;
pub mod registry;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and mock collaborators for integration tests; enabled via
	//! `cfg(test)` or the `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::{
		collections::VecDeque,
		sync::atomic::{AtomicUsize, Ordering},
	};
	// self
	use crate::{
		auth::{ClientId, TokenResult},
		cache::{CacheError, CacheInitializer, CachedToken, MemoryTokenCache, TokenCache},
		client::{
			AcquireError, AcquireFuture, ClientApplication, ClientApplicationFactory,
			ClientApplicationParams, InteractiveRequest,
		},
		config::CredentialConfig,
		error::{BoxError, TransportError},
		flows::BrokerCredential,
		http::{HttpFuture, HttpRequest, HttpTransport},
		registry::CapabilityMode,
	};

	/// Scripted reply returned by [`MockApplication`] for one acquisition attempt.
	#[derive(Debug)]
	pub enum MockReply {
		/// Returns the provided result.
		Result(TokenResult),
		/// Fails as if the loopback listener could not be bound.
		SocketError,
		/// Fails with an arbitrary collaborator error.
		Other(String),
	}
	impl MockReply {
		/// Successful reply carrying the provided access token.
		pub fn token(access_token: &str) -> Self {
			Self::Result(TokenResult::success(access_token))
		}

		/// Error reply carrying an OAuth error code and description.
		pub fn error(error: &str, description: &str) -> Self {
			Self::Result(TokenResult::error(error, Some(description)))
		}

		/// Reply with neither a token nor an error description.
		pub fn indeterminate() -> Self {
			Self::Result(TokenResult::default())
		}
	}

	/// Client application double that replays scripted replies and records every request.
	pub struct MockApplication {
		/// Parameters the application was constructed with.
		pub params: ClientApplicationParams,
		replies: Mutex<VecDeque<MockReply>>,
		requests: Mutex<Vec<InteractiveRequest>>,
	}
	impl MockApplication {
		/// Creates an application that answers with `replies` in order.
		pub fn new(params: ClientApplicationParams, replies: Vec<MockReply>) -> Self {
			Self { params, replies: Mutex::new(replies.into()), requests: Mutex::default() }
		}

		/// Requests observed so far, in call order.
		pub fn requests(&self) -> Vec<InteractiveRequest> {
			self.requests.lock().clone()
		}

		/// Number of acquisition attempts observed so far.
		pub fn call_count(&self) -> usize {
			self.requests.lock().len()
		}
	}
	impl ClientApplication for MockApplication {
		fn acquire_token_interactive<'a>(
			&'a self,
			request: &'a InteractiveRequest,
		) -> AcquireFuture<'a> {
			Box::pin(async move {
				self.requests.lock().push(request.clone());

				let reply = self.replies.lock().pop_front().unwrap_or_else(MockReply::indeterminate);

				match reply {
					MockReply::Result(result) => {
						if let Some(cached) = CachedToken::from_result(
							&self.params.authority,
							&self.params.client_id,
							&request.scopes,
							&result,
							OffsetDateTime::now_utc(),
						) {
							self.params.token_cache.save(cached).map_err(AcquireError::other)?;
						}

						Ok(result)
					},
					MockReply::SocketError => Err(AcquireError::Transport(TransportError::Io(
						std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use"),
					))),
					MockReply::Other(message) => Err(AcquireError::other(MockFailure(message))),
				}
			})
		}
	}

	/// Plain error type produced by [`MockReply::Other`].
	#[derive(Debug, ThisError)]
	#[error("{0}")]
	pub struct MockFailure(pub String);

	/// Factory double that hands every new application the same reply script.
	#[derive(Default)]
	pub struct MockFactory {
		script: Mutex<VecDeque<Vec<MockReply>>>,
		built: Mutex<Vec<Arc<MockApplication>>>,
		fail_with: Mutex<Option<String>>,
	}
	impl MockFactory {
		/// Queues the reply script for the next application the factory constructs.
		pub fn push_script(&self, replies: Vec<MockReply>) {
			self.script.lock().push_back(replies);
		}

		/// Makes every subsequent construction fail with `message`.
		pub fn fail_construction(&self, message: impl Into<String>) {
			*self.fail_with.lock() = Some(message.into());
		}

		/// Applications constructed so far, in construction order.
		pub fn built(&self) -> Vec<Arc<MockApplication>> {
			self.built.lock().clone()
		}
	}
	impl ClientApplicationFactory for MockFactory {
		fn new_client_application(
			&self,
			params: ClientApplicationParams,
		) -> Result<Arc<dyn ClientApplication>, BoxError> {
			if let Some(message) = self.fail_with.lock().clone() {
				return Err(Box::new(MockFailure(message)));
			}

			let replies = self.script.lock().pop_front().unwrap_or_default();
			let app = Arc::new(MockApplication::new(params, replies));

			self.built.lock().push(app.clone());

			Ok(app)
		}
	}

	/// Cache initializer that counts invocations and hands out in-memory caches.
	#[derive(Debug, Default)]
	pub struct CountingCacheInitializer {
		standard: AtomicUsize,
		cae: AtomicUsize,
	}
	impl CountingCacheInitializer {
		/// Number of initializations observed for `mode`.
		pub fn count(&self, mode: CapabilityMode) -> usize {
			match mode {
				CapabilityMode::Standard => self.standard.load(Ordering::SeqCst),
				CapabilityMode::ContinuousAccessEvaluation => self.cae.load(Ordering::SeqCst),
			}
		}
	}
	impl CacheInitializer for CountingCacheInitializer {
		fn initialize_cache(&self, mode: CapabilityMode) -> Result<Arc<dyn TokenCache>, CacheError> {
			match mode {
				CapabilityMode::Standard => self.standard.fetch_add(1, Ordering::SeqCst),
				CapabilityMode::ContinuousAccessEvaluation => self.cae.fetch_add(1, Ordering::SeqCst),
			};

			Ok(Arc::new(MemoryTokenCache::default()))
		}
	}

	/// HTTP transport that refuses every request; client application doubles never call it.
	#[derive(Debug, Default)]
	pub struct NullHttpTransport;
	impl HttpTransport for NullHttpTransport {
		fn send(&self, _request: HttpRequest) -> HttpFuture<'_> {
			Box::pin(async {
				Err(TransportError::Io(std::io::Error::new(
					std::io::ErrorKind::Unsupported,
					"null transport",
				)))
			})
		}
	}

	/// Minimal configuration used across tests.
	pub fn test_config() -> CredentialConfig {
		CredentialConfig::builder(
			ClientId::new("client-test").expect("Client identifier fixture should be valid."),
		)
		.build()
		.expect("Test configuration should build successfully.")
	}

	/// Builds a [`BrokerCredential`] wired to mock collaborators.
	pub fn build_test_credential(
		config: CredentialConfig,
	) -> (BrokerCredential, Arc<MockFactory>, Arc<CountingCacheInitializer>) {
		let factory = Arc::new(MockFactory::default());
		let caches = Arc::new(CountingCacheInitializer::default());
		let credential =
			BrokerCredential::with_http_transport(config, factory.clone(), NullHttpTransport)
				.expect("Test configuration should pass validation.")
				.with_cache_initializer(caches.clone());

		(credential, factory, caches)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		hash::{Hash, Hasher},
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
