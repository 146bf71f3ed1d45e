//! Cache key derivation.
//!
//! A [`Fingerprint`] is the SHA-256 of a canonical JSON rendering of
//! (format version, namespace, block tag, normalized options). Struct fields
//! serialize in declaration order and id sets are `BTreeSet`s, so the form is
//! stable across processes and platforms.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::options::OptionSet;
use crate::domain::types::BlockVariant;

/// Bumped whenever markup or canonical form changes incompatibly.
pub const FINGERPRINT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

#[derive(Serialize)]
struct CanonicalKey<'a> {
    version: u32,
    namespace: &'a str,
    block: &'static str,
    options: OptionSet,
}

impl Fingerprint {
    /// Fingerprint a render request. `namespace` separates configurations
    /// that render the same options differently (e.g. display time zone).
    pub fn compute(namespace: &str, variant: BlockVariant, options: &OptionSet) -> Self {
        let key = CanonicalKey {
            version: FINGERPRINT_VERSION,
            namespace,
            block: variant.tag(),
            options: options.normalized(variant),
        };
        let canonical = serde_json::to_vec(&key).unwrap_or_default();

        let mut hasher = Sha256::new();
        hasher.update(&canonical);
        Self(hex::encode(hasher.finalize()))
    }

    /// Parse a previously rendered fingerprint; rejects anything that is not
    /// 64 lowercase hex digits.
    pub fn parse(value: &str) -> Option<Self> {
        let valid = value.len() == 64
            && value
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
