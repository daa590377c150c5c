//! Scope modeling helpers used across the credential.

// std
use std::{collections::BTreeSet, slice::Iter, sync::OnceLock};
// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use serde::{Deserializer, Serializer, de::Error as DeError, ser::SerializeSeq};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Errors emitted when validating scopes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ScopeValidationError {
	/// Empty scope entries are not allowed.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// Scopes cannot contain embedded whitespace characters.
	#[error("Scope contains whitespace: {scope}.")]
	ContainsWhitespace {
		/// The offending scope string.
		scope: String,
	},
}

/// Validated list of OAuth scopes that keeps the caller's order.
///
/// Acquisition collaborators receive the scopes exactly as the caller listed them (minus
/// duplicates), while equality, hashing, and the [`fingerprint`](Self::fingerprint) treat the
/// list as a set: the fingerprint is a base64 (no padding) SHA-256 digest of the sorted,
/// space-delimited scopes and is cached after the first calculation.
#[derive(Default)]
pub struct ScopeList {
	scopes: Arc<[String]>,
	fingerprint_cache: OnceLock<String>,
}
impl ScopeList {
	/// Creates a scope list from any iterator.
	///
	/// Repeated entries are removed before the list reaches a client application; the first
	/// occurrence keeps its position.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Ok(Self { scopes: validate(scopes)?, fingerprint_cache: OnceLock::new() })
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.scopes.len()
	}

	/// Returns true if no scopes are defined.
	pub fn is_empty(&self) -> bool {
		self.scopes.is_empty()
	}

	/// Returns true if the list contains the provided scope.
	pub fn contains(&self, scope: &str) -> bool {
		self.scopes.iter().any(|candidate| candidate == scope)
	}

	/// Iterator over scopes in caller order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.scopes.iter().map(|s| s.as_str())
	}

	/// Space-delimited representation in caller order.
	pub fn joined(&self) -> String {
		self.scopes.join(" ")
	}

	/// Stable, order-insensitive fingerprint of the scopes.
	pub fn fingerprint(&self) -> String {
		self.fingerprint_cache.get_or_init(|| compute_fingerprint(&self.scopes)).clone()
	}

	/// Returns the underlying slice of scope strings in caller order.
	pub fn as_slice(&self) -> &[String] {
		&self.scopes
	}

	fn sorted(&self) -> BTreeSet<&str> {
		self.iter().collect()
	}
}
impl Clone for ScopeList {
	fn clone(&self) -> Self {
		Self { scopes: self.scopes.clone(), fingerprint_cache: OnceLock::new() }
	}
}
impl PartialEq for ScopeList {
	fn eq(&self, other: &Self) -> bool {
		self.len() == other.len() && self.sorted() == other.sorted()
	}
}
impl Eq for ScopeList {}
impl Hash for ScopeList {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.fingerprint_cache.get_or_init(|| compute_fingerprint(&self.scopes)).hash(state);
	}
}
impl Debug for ScopeList {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ScopeList").field(&self.scopes).finish()
	}
}
impl Display for ScopeList {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.joined())
	}
}

/// Iterator over scope strings.
pub struct ScopeIter<'a> {
	inner: Iter<'a, String>,
}
impl<'a> Iterator for ScopeIter<'a> {
	type Item = &'a str;

	fn next(&mut self) -> Option<Self::Item> {
		self.inner.next().map(|s| s.as_str())
	}
}
impl TryFrom<Vec<String>> for ScopeList {
	type Error = ScopeValidationError;

	fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl TryFrom<&[&str]> for ScopeList {
	type Error = ScopeValidationError;

	fn try_from(value: &[&str]) -> Result<Self, Self::Error> {
		Self::new(value.iter().copied())
	}
}
impl<'a> IntoIterator for &'a ScopeList {
	type IntoIter = ScopeIter<'a>;
	type Item = &'a str;

	fn into_iter(self) -> Self::IntoIter {
		ScopeIter { inner: self.scopes.iter() }
	}
}
impl FromStr for ScopeList {
	type Err = ScopeValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.is_empty() {
			return Ok(Self::default());
		}
		if s.chars().all(char::is_whitespace) {
			return Err(ScopeValidationError::Empty);
		}

		Self::new(s.split_whitespace())
	}
}
impl Serialize for ScopeList {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut seq = serializer.serialize_seq(Some(self.scopes.len()))?;

		for scope in self.scopes.iter() {
			seq.serialize_element(scope)?;
		}

		seq.end()
	}
}
impl<'de> Deserialize<'de> for ScopeList {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let values = <Vec<String>>::deserialize(deserializer)?;

		ScopeList::new(values).map_err(DeError::custom)
	}
}

fn validate<I, S>(scopes: I) -> Result<Arc<[String]>, ScopeValidationError>
where
	I: IntoIterator<Item = S>,
	S: Into<String>,
{
	let mut seen = BTreeSet::new();
	let mut ordered = Vec::new();

	for scope in scopes {
		let owned: String = scope.into();

		if owned.is_empty() {
			return Err(ScopeValidationError::Empty);
		}
		if owned.chars().any(char::is_whitespace) {
			return Err(ScopeValidationError::ContainsWhitespace { scope: owned });
		}
		if seen.insert(owned.clone()) {
			ordered.push(owned);
		}
	}

	Ok(Arc::from(ordered))
}

fn compute_fingerprint(scopes: &[String]) -> String {
	let sorted = scopes.iter().map(String::as_str).collect::<BTreeSet<_>>();
	let normalized = sorted.into_iter().collect::<Vec<_>>().join(" ");
	let mut hasher = Sha256::new();

	hasher.update(normalized.as_bytes());

	let digest = hasher.finalize();

	STANDARD_NO_PAD.encode(digest)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn caller_order_survives_deduplication() {
		let scopes = ScopeList::new(["profile", "openid", "profile", "email"])
			.expect("Scope list fixture should be valid.");

		assert_eq!(scopes.iter().collect::<Vec<_>>(), vec!["profile", "openid", "email"]);
		assert_eq!(scopes.joined(), "profile openid email");
	}

	#[test]
	fn equality_and_fingerprint_ignore_order() {
		let lhs = ScopeList::new(["profile", "email"]).expect("Left-hand list should be valid.");
		let rhs = ScopeList::new(["email", "profile"]).expect("Right-hand list should be valid.");

		assert_eq!(lhs, rhs);
		assert_eq!(lhs.fingerprint(), rhs.fingerprint());
		assert_ne!(lhs.as_slice(), rhs.as_slice());
	}

	#[test]
	fn scopes_reject_whitespace_padding() {
		let err = ScopeList::new([" profile "]).expect_err("Padded scopes must be rejected.");

		assert!(matches!(err, ScopeValidationError::ContainsWhitespace { .. }));
		assert!(ScopeList::from_str("").is_ok(), "Empty string represents an empty scope list.");
		assert!(ScopeList::from_str("   ").is_err(), "Whitespace-only input must be rejected.");
		assert!(ScopeList::new([""]).is_err());
	}

	#[test]
	fn default_scope_strings_parse() {
		let scopes = ScopeList::from_str("https://graph.example/.default offline_access")
			.expect("Resource default scope should parse successfully.");

		assert!(scopes.contains("https://graph.example/.default"));
		assert_eq!(scopes.len(), 2);

		let fp1 = scopes.fingerprint();
		let fp2 = scopes.fingerprint();

		assert_eq!(fp1, fp2, "Fingerprint should be cached and stable.");
	}

	#[test]
	fn serde_keeps_order() {
		let scopes = ScopeList::try_from(&["b", "a"][..]).expect("Slice fixture should be valid.");
		let payload = serde_json::to_string(&scopes).expect("Scope list should serialize.");

		assert_eq!(payload, "[\"b\",\"a\"]");

		let round_trip: ScopeList =
			serde_json::from_str(&payload).expect("Scope list should deserialize.");

		assert_eq!(round_trip.as_slice(), scopes.as_slice());
	}
}
