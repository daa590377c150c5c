//! Credential chains: try several credentials in order until one yields a token.

// self
use crate::{
	_prelude::*,
	auth::{ScopeList, TokenResult},
	flows::{ChainContext, TokenRequestOptions},
};

/// Boxed future returned by [`TokenCredential::get_token`].
pub type TokenFuture<'a> = Pin<Box<dyn Future<Output = Result<TokenResult>> + 'a + Send>>;

/// Anything that can produce a token for a set of scopes.
pub trait TokenCredential
where
	Self: Send + Sync,
{
	/// Requests a token.
	///
	/// Implementations signal "try the next credential" with [`Error::CredentialUnavailable`];
	/// every other error stops a chain.
	fn get_token<'a>(
		&'a self,
		scopes: &'a ScopeList,
		options: &'a TokenRequestOptions,
	) -> TokenFuture<'a>;
}

/// Ordered list of credentials tried one after another.
///
/// Every member runs with [`ChainContext::Chained`], so interactive members report token-less
/// results as unavailable instead of failing the whole chain.
#[derive(Clone, Default)]
pub struct CredentialChain {
	members: Vec<Arc<dyn TokenCredential>>,
}
impl CredentialChain {
	/// Creates a chain from the provided members.
	pub fn new<I>(members: I) -> Self
	where
		I: IntoIterator<Item = Arc<dyn TokenCredential>>,
	{
		Self { members: members.into_iter().collect() }
	}

	/// Appends a member.
	pub fn push(&mut self, member: Arc<dyn TokenCredential>) {
		self.members.push(member);
	}

	/// Number of members.
	pub fn len(&self) -> usize {
		self.members.len()
	}

	/// Returns true when the chain has no members.
	pub fn is_empty(&self) -> bool {
		self.members.is_empty()
	}

	/// Returns the first member token.
	///
	/// Stops at the first error that is not [`Error::CredentialUnavailable`]. When every member
	/// is unavailable, fails with an unavailable error listing each member's message.
	pub async fn request_token(
		&self,
		scopes: &ScopeList,
		options: &TokenRequestOptions,
	) -> Result<TokenResult> {
		let options = options.clone().with_chain_context(ChainContext::Chained);
		let mut unavailable = Vec::with_capacity(self.members.len());

		for member in &self.members {
			match member.get_token(scopes, &options).await {
				Ok(result) => return Ok(result),
				Err(err) if err.is_unavailable() => unavailable.push(err.to_string()),
				Err(err) => return Err(err),
			}
		}

		if unavailable.is_empty() {
			return Err(Error::unavailable("The credential chain has no members."));
		}

		Err(Error::unavailable(format!(
			"The credential chain failed to retrieve a token from the included credentials.\n{}",
			unavailable.join("\n")
		)))
	}
}
impl TokenCredential for CredentialChain {
	fn get_token<'a>(
		&'a self,
		scopes: &'a ScopeList,
		options: &'a TokenRequestOptions,
	) -> TokenFuture<'a> {
		Box::pin(self.request_token(scopes, options))
	}
}
impl Debug for CredentialChain {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialChain").field("members", &self.members.len()).finish()
	}
}
