//! Tenant resolution: deciding which directory a request is allowed to target.
//!
//! A credential is configured with one tenant and, optionally, a list of additional tenants it
//! may acquire tokens for. Per-call tenant overrides pass through a [`TenantResolver`] before any
//! client application is selected, so a request can never reach an authority outside that set.

// self
use crate::{_prelude::*, auth::TenantId};

/// Tenants a credential may target in addition to its configured tenant.
///
/// The wildcard entry `*` allows every tenant.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllowedTenants(Vec<String>);
impl AllowedTenants {
	/// Wildcard entry that allows every tenant.
	pub const WILDCARD: &'static str = "*";

	/// Creates an allow-list from the provided entries.
	pub fn new<I, S>(tenants: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self(tenants.into_iter().map(Into::into).collect())
	}

	/// Allow-list that accepts any tenant.
	pub fn any() -> Self {
		Self(vec![Self::WILDCARD.to_owned()])
	}

	/// Returns true when the wildcard entry is present.
	pub fn allows_any(&self) -> bool {
		self.0.iter().any(|entry| entry == Self::WILDCARD)
	}

	/// Returns true when `tenant` is explicitly listed or the wildcard is present.
	pub fn allows(&self, tenant: &TenantId) -> bool {
		self.allows_any() || self.0.iter().any(|entry| entry.as_str() == tenant.as_ref())
	}

	/// Returns true when no additional tenants are allowed.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

/// Errors produced while resolving a requested tenant.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum TenantError {
	/// The requested tenant is neither the configured tenant nor additionally allowed.
	#[error(
		"The credential is not configured to acquire tokens for tenant {requested}. Add it to the additionally allowed tenants, or use `*` to allow any tenant."
	)]
	NotAllowed {
		/// Tenant the caller asked for.
		requested: TenantId,
	},
}

/// Resolves the tenant a request should target.
pub trait TenantResolver
where
	Self: Send + Sync,
{
	/// Picks the tenant for a request given the configured tenant, the allow-list, and the
	/// caller's optional override.
	fn resolve_tenant(
		&self,
		configured: &TenantId,
		additionally_allowed: &AllowedTenants,
		requested: Option<&TenantId>,
	) -> Result<TenantId, TenantError>;
}

/// Default resolver applying the allow-list rules.
///
/// - No override, or an override equal to the configured tenant, yields the configured tenant.
/// - ADFS tenants and resolvers with multitenant authentication disabled ignore overrides.
/// - Overrides listed in the allow-list (or any override when it holds `*`) win.
/// - Everything else is rejected with [`TenantError::NotAllowed`].
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultTenantResolver {
	/// Ignores per-call overrides and always returns the configured tenant.
	pub disable_multitenant_authentication: bool,
}
impl DefaultTenantResolver {
	/// Resolver that ignores per-call overrides.
	pub fn single_tenant() -> Self {
		Self { disable_multitenant_authentication: true }
	}
}
impl TenantResolver for DefaultTenantResolver {
	fn resolve_tenant(
		&self,
		configured: &TenantId,
		additionally_allowed: &AllowedTenants,
		requested: Option<&TenantId>,
	) -> Result<TenantId, TenantError> {
		let Some(requested) = requested.filter(|requested| *requested != configured) else {
			return Ok(configured.clone());
		};

		if configured.is_adfs() || self.disable_multitenant_authentication {
			return Ok(configured.clone());
		}
		if additionally_allowed.allows(requested) {
			return Ok(requested.clone());
		}

		Err(TenantError::NotAllowed { requested: requested.clone() })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn tenant(value: &str) -> TenantId {
		TenantId::new(value).expect("Tenant fixture should be valid.")
	}

	#[test]
	fn missing_or_matching_override_uses_configured() {
		let resolver = DefaultTenantResolver::default();
		let configured = tenant("home");
		let allowed = AllowedTenants::default();

		assert_eq!(resolver.resolve_tenant(&configured, &allowed, None), Ok(configured.clone()));
		assert_eq!(
			resolver.resolve_tenant(&configured, &allowed, Some(&tenant("home"))),
			Ok(configured)
		);
	}

	#[test]
	fn allow_list_and_wildcard_admit_overrides() {
		let resolver = DefaultTenantResolver::default();
		let configured = tenant("home");
		let guest = tenant("guest");

		assert_eq!(
			resolver.resolve_tenant(&configured, &AllowedTenants::new(["guest"]), Some(&guest)),
			Ok(guest.clone())
		);
		assert_eq!(
			resolver.resolve_tenant(&configured, &AllowedTenants::any(), Some(&guest)),
			Ok(guest)
		);
	}

	#[test]
	fn unknown_tenant_is_rejected() {
		let resolver = DefaultTenantResolver::default();
		let err = resolver
			.resolve_tenant(&tenant("home"), &AllowedTenants::new(["guest"]), Some(&tenant("rogue")))
			.expect_err("Tenants outside the allow-list must be rejected.");

		assert_eq!(err, TenantError::NotAllowed { requested: tenant("rogue") });
		assert!(err.to_string().contains("rogue"));
	}

	#[test]
	fn adfs_and_single_tenant_ignore_overrides() {
		let guest = tenant("guest");
		let adfs = tenant("adfs");

		assert_eq!(
			DefaultTenantResolver::default().resolve_tenant(
				&adfs,
				&AllowedTenants::default(),
				Some(&guest)
			),
			Ok(adfs)
		);
		assert_eq!(
			DefaultTenantResolver::single_tenant().resolve_tenant(
				&tenant("home"),
				&AllowedTenants::default(),
				Some(&guest)
			),
			Ok(tenant("home"))
		);
	}
}
