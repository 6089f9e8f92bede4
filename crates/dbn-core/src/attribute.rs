//! Attribute domains: insertion-ordered bijections between value tokens and codes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{DbnError, Result};

/// How tokens of an attribute are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    /// Tokens are parsed as `f32`, so `"1"` and `"1.0"` are the same value.
    Numeric,
    /// Tokens are compared as raw strings.
    Nominal,
}

/// The finite value domain of one variable.
///
/// Codes are assigned in insertion order starting at 0 and never change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "StoredDomain")]
pub struct AttributeDomain {
    name: String,
    kind: AttributeKind,
    values: Vec<String>,
    #[serde(skip)]
    index: HashMap<String, u32>,
}

/// Serialized form; the lookup index is rebuilt on load.
#[derive(Deserialize)]
struct StoredDomain {
    name: String,
    kind: AttributeKind,
    values: Vec<String>,
}

impl TryFrom<StoredDomain> for AttributeDomain {
    type Error = DbnError;

    fn try_from(stored: StoredDomain) -> Result<Self> {
        let domain = Self::with_values(stored.name, stored.kind, &stored.values)?;
        if domain.size() != stored.values.len() {
            return Err(DbnError::AttributeMismatch(format!(
                "stored domain '{}' repeats a value",
                domain.name
            )));
        }
        Ok(domain)
    }
}

impl PartialEq for AttributeDomain {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.kind == other.kind && self.values == other.values
    }
}

impl Eq for AttributeDomain {}

impl AttributeDomain {
    pub fn numeric(name: impl Into<String>) -> Self {
        Self::new(name, AttributeKind::Numeric)
    }

    pub fn nominal(name: impl Into<String>) -> Self {
        Self::new(name, AttributeKind::Nominal)
    }

    pub fn new(name: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            values: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Build a domain from tokens; duplicates collapse onto the first code.
    pub fn with_values<I, S>(name: impl Into<String>, kind: AttributeKind, tokens: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut domain = Self::new(name, kind);
        for token in tokens {
            domain.add(token.as_ref())?;
        }
        Ok(domain)
    }

    fn key(&self, token: &str) -> Result<String> {
        match self.kind {
            AttributeKind::Nominal => Ok(token.to_string()),
            AttributeKind::Numeric => token
                .trim()
                .parse::<f32>()
                .map(|v| v.to_string())
                .map_err(|_| DbnError::InvalidToken {
                    attribute: self.name.clone(),
                    token: token.to_string(),
                }),
        }
    }

    /// Code of `token`, appending it to the domain when unseen.
    pub fn add(&mut self, token: &str) -> Result<u32> {
        let key = self.key(token)?;
        if let Some(&code) = self.index.get(&key) {
            return Ok(code);
        }
        let code = self.values.len() as u32;
        self.values.push(key.clone());
        self.index.insert(key, code);
        Ok(code)
    }

    /// Code of `token`, if it belongs to the domain.
    pub fn index_of(&self, token: &str) -> Option<u32> {
        let key = self.key(token).ok()?;
        self.index.get(&key).copied()
    }

    /// Token of `code`.
    pub fn value(&self, code: u32) -> Option<&str> {
        self.values.get(code as usize).map(String::as_str)
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn kind(&self) -> AttributeKind {
        self.kind
    }

    pub fn is_numeric(&self) -> bool {
        self.kind == AttributeKind::Numeric
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}

impl fmt::Display for AttributeDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.values.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_tokens_normalise() {
        let mut a = AttributeDomain::numeric("x");
        assert_eq!(a.add("1").unwrap(), 0);
        assert_eq!(a.add("1.0").unwrap(), 0);
        assert_eq!(a.add("2.5").unwrap(), 1);
        assert_eq!(a.size(), 2);
        assert_eq!(a.index_of("2.50"), Some(1));
        assert_eq!(a.value(0), Some("1"));
    }

    #[test]
    fn numeric_rejects_garbage() {
        let mut a = AttributeDomain::numeric("x");
        let err = a.add("abc").unwrap_err();
        assert!(matches!(err, DbnError::InvalidToken { .. }));
    }

    #[test]
    fn nominal_keeps_raw_strings() {
        let a = AttributeDomain::with_values("y", AttributeKind::Nominal, ["1", "1.0", "a", "1"])
            .unwrap();
        assert_eq!(a.size(), 3);
        assert_eq!(a.index_of("a"), Some(2));
        assert_eq!(a.index_of("b"), None);
        assert_eq!(a.to_string(), "[1, 1.0, a]");
    }

    #[test]
    fn equality_ignores_lookup_index() {
        let a = AttributeDomain::with_values("z", AttributeKind::Nominal, ["p", "q"]).unwrap();
        let json = serde_json::to_string(&a).unwrap();
        let b: AttributeDomain = serde_json::from_str(&json).unwrap();
        assert_eq!(a, b);
        assert_eq!(b.index_of("q"), Some(1));
    }

    #[test]
    fn deserialized_domain_reuses_existing_codes() {
        let a = AttributeDomain::with_values("w", AttributeKind::Nominal, ["a", "b"]).unwrap();
        let mut b: AttributeDomain =
            serde_json::from_str(&serde_json::to_string(&a).unwrap()).unwrap();
        assert_eq!(b.add("a").unwrap(), 0);
        assert_eq!(b.add("b").unwrap(), 1);
        assert_eq!(b.size(), 2);
        assert_eq!(b.add("c").unwrap(), 2);

        let n = AttributeDomain::with_values("v", AttributeKind::Numeric, ["1", "2.5"]).unwrap();
        let mut m: AttributeDomain =
            serde_json::from_str(&serde_json::to_string(&n).unwrap()).unwrap();
        assert_eq!(m.add("1.0").unwrap(), 0);
        assert_eq!(m.size(), 2);
    }

    #[test]
    fn stored_domain_rejects_duplicates_and_bad_numbers() {
        let dup = r#"{"name":"d","kind":"nominal","values":["a","a"]}"#;
        assert!(serde_json::from_str::<AttributeDomain>(dup).is_err());
        let bad = r#"{"name":"d","kind":"numeric","values":["x"]}"#;
        assert!(serde_json::from_str::<AttributeDomain>(bad).is_err());
    }
}
