use std::collections::BTreeMap;
use std::fmt;

use hmac::{Hmac, Mac};
use md5::Md5;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::errors::ConfigError;

/// Fixed ceiling every published grade is scored against.
pub const MAX_VALUE: f64 = 0.7;

/// Event kind accepted grades are published under.
pub const GRADE_EVENT_KIND: &str = "grade";

/// Provider signatures are HMAC-MD5; changing the digest breaks every deployed provider.
type HmacMd5 = Hmac<Md5>;

/// Key shared between the host and the exercise provider.
#[derive(Clone)]
pub struct SharedSecret(Vec<u8>);

impl SharedSecret {
    pub fn new(key: impl Into<Vec<u8>>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.is_empty() { return Err(ConfigError::EmptySecret); }
        Ok(Self(key))
    }

    /// Key length in bytes. The only property of the key that is ever logged.
    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    fn expose(&self) -> &[u8] { &self.0 }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedSecret(<redacted>, len={})", self.len())
    }
}

/// Topic the embedding block expects a grade for. Compared byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicId(String);

impl TopicId {
    pub fn new(id: impl Into<String>) -> Result<Self, ConfigError> {
        let id = id.into();
        if id.is_empty() { return Err(ConfigError::EmptyTopic); }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Mastery report as relayed by the client. Nothing here is trusted until
/// [`crate::verify`] accepts it.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct MasteryReport {
    #[serde(default)]
    pub mastery: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
}

/// Grade handed to the host grading collaborator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GradeEvent {
    pub value: f64,
    pub max_value: f64,
}

impl GradeEvent {
    pub fn new(value: f64) -> Self { Self { value, max_value: MAX_VALUE } }
}

/// Wire form of a mastery value: fixed point, two fractional digits.
pub fn format_mastery(value: f64) -> String { format!("{value:.2}") }

/// Canonical chunks fed to the MAC, in order: the user id, then each topic
/// key and its formatted value in sorted key order.
pub fn canonical_chunks<'a>(user_id: &'a str, mastery: &'a BTreeMap<String, f64>) -> impl Iterator<Item = Vec<u8>> + 'a {
    std::iter::once(user_id.as_bytes().to_vec()).chain(
        mastery
            .iter()
            .flat_map(|(topic, value)| [topic.as_bytes().to_vec(), format_mastery(*value).into_bytes()]),
    )
}

/// Lowercase hex HMAC-MD5 over the canonical chunks of a report.
pub fn compute_signature(secret: &SharedSecret, user_id: &str, mastery: &BTreeMap<String, f64>) -> String {
    let mut mac = HmacMd5::new_from_slice(secret.expose()).expect("HMAC accepts keys of any length");
    for chunk in canonical_chunks(user_id, mastery) {
        mac.update(&chunk);
    }
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time string comparison of two hex digests.
pub fn signatures_match(computed: &str, supplied: &str) -> bool {
    computed.as_bytes().ct_eq(supplied.as_bytes()).into()
}
