//! Module identities and versions.
//!
//! The text form mirrors a fully qualified library name:
//!
//! ```text
//! Acme.Components, Version=1.2.0.0, Culture=neutral, PublicKey=0024000004800000
//! ```
//!
//! The text form is also the key under which resolutions are memoized.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Result, ScaffolderError};

/// Four-part version: major.minor.build.revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModuleVersion {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
    pub revision: u32,
}

impl ModuleVersion {
    /// Create a version from its four fields.
    pub const fn new(major: u32, minor: u32, build: u32, revision: u32) -> Self {
        Self {
            major,
            minor,
            build,
            revision,
        }
    }

    /// Fields in comparison order.
    pub fn fields(&self) -> [u32; 4] {
        [self.major, self.minor, self.build, self.revision]
    }

    /// Index of the first field that differs from `other`, or `None` when
    /// the versions are equal.
    pub fn first_difference(&self, other: &ModuleVersion) -> Option<usize> {
        self.fields()
            .iter()
            .zip(other.fields().iter())
            .position(|(a, b)| a != b)
    }
}

impl fmt::Display for ModuleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

impl FromStr for ModuleVersion {
    type Err = ScaffolderError;

    /// Accepts one to four numeric fields; missing fields are zero.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = |message: &str| ScaffolderError::InvalidIdentity {
            value: s.to_string(),
            message: message.to_string(),
        };

        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.is_empty() || parts.len() > 4 {
            return Err(invalid("a version has one to four fields"));
        }

        let mut fields = [0u32; 4];
        for (slot, part) in fields.iter_mut().zip(parts.iter()) {
            *slot = part
                .parse()
                .map_err(|_| invalid("version fields must be unsigned integers"))?;
        }

        Ok(Self::new(fields[0], fields[1], fields[2], fields[3]))
    }
}

impl TryFrom<String> for ModuleVersion {
    type Error = ScaffolderError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ModuleVersion> for String {
    fn from(version: ModuleVersion) -> Self {
        version.to_string()
    }
}

/// Identity of a requested or candidate module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleIdentity {
    /// Simple name, compared case-insensitively.
    pub name: String,
    /// Version, if pinned.
    pub version: Option<ModuleVersion>,
    /// Culture name; `None` is the neutral culture.
    pub culture: Option<String>,
    /// Strong-name public key.
    pub public_key: Option<Vec<u8>>,
}

static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.\-]*$").expect("valid module name pattern"));

impl ModuleIdentity {
    /// Identity carrying only a simple name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            culture: None,
            public_key: None,
        }
    }

    /// Set the version.
    pub fn with_version(mut self, version: ModuleVersion) -> Self {
        self.version = Some(version);
        self
    }

    /// Set the culture. `"neutral"` and the empty string mean no culture.
    pub fn with_culture(mut self, culture: impl Into<String>) -> Self {
        self.culture = normalize_culture(&culture.into());
        self
    }

    /// Set the strong-name public key.
    pub fn with_public_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.public_key = Some(key.into());
        self
    }

    /// Whether `other` has the same simple name, ignoring case.
    pub fn same_name(&self, other: &ModuleIdentity) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
    }

    /// Whether `other` has the same culture, ignoring case.
    pub fn same_culture(&self, other: &ModuleIdentity) -> bool {
        match (&self.culture, &other.culture) {
            (None, None) => true,
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            _ => false,
        }
    }

    /// Short token for the public key: the first eight bytes of its
    /// SHA-256 digest, hex encoded.
    pub fn public_key_token(&self) -> Option<String> {
        self.public_key.as_ref().map(|key| {
            let digest = Sha256::digest(key);
            hex::encode(&digest[..8])
        })
    }
}

fn normalize_culture(culture: &str) -> Option<String> {
    let culture = culture.trim();
    if culture.is_empty() || culture.eq_ignore_ascii_case("neutral") {
        None
    } else {
        Some(culture.to_string())
    }
}

impl fmt::Display for ModuleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(version) = &self.version {
            write!(f, ", Version={}", version)?;
        }
        write!(
            f,
            ", Culture={}",
            self.culture.as_deref().unwrap_or("neutral")
        )?;
        match &self.public_key {
            Some(key) => write!(f, ", PublicKey={}", hex::encode(key)),
            None => write!(f, ", PublicKey=null"),
        }
    }
}

impl FromStr for ModuleIdentity {
    type Err = ScaffolderError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |message: String| ScaffolderError::InvalidIdentity {
            value: s.to_string(),
            message,
        };

        let mut parts = s.split(',').map(str::trim);
        let name = parts.next().unwrap_or_default();
        if !NAME_PATTERN.is_match(name) {
            return Err(invalid(format!("'{}' is not a valid module name", name)));
        }

        let mut identity = ModuleIdentity::named(name);
        for part in parts {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| invalid(format!("expected key=value, found '{}'", part)))?;
            let value = value.trim();

            match key.trim().to_ascii_lowercase().as_str() {
                "version" => identity.version = Some(value.parse()?),
                "culture" => identity.culture = normalize_culture(value),
                "publickey" => {
                    identity.public_key = if value.eq_ignore_ascii_case("null") {
                        None
                    } else {
                        Some(hex::decode(value).map_err(|e| {
                            invalid(format!("public key is not valid hex: {}", e))
                        })?)
                    }
                }
                other => return Err(invalid(format!("unknown identity field '{}'", other))),
            }
        }

        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_parses_partial_forms() {
        assert_eq!("1".parse::<ModuleVersion>().unwrap(), ModuleVersion::new(1, 0, 0, 0));
        assert_eq!("1.2".parse::<ModuleVersion>().unwrap(), ModuleVersion::new(1, 2, 0, 0));
        assert_eq!(
            "1.2.3.4".parse::<ModuleVersion>().unwrap(),
            ModuleVersion::new(1, 2, 3, 4)
        );
    }

    #[test]
    fn version_rejects_garbage() {
        assert!("1.x".parse::<ModuleVersion>().is_err());
        assert!("1.2.3.4.5".parse::<ModuleVersion>().is_err());
        assert!("".parse::<ModuleVersion>().is_err());
    }

    #[test]
    fn version_ordering_is_field_by_field() {
        assert!(ModuleVersion::new(1, 2, 0, 0) < ModuleVersion::new(1, 10, 0, 0));
        assert!(ModuleVersion::new(2, 0, 0, 0) > ModuleVersion::new(1, 99, 99, 99));
    }

    #[test]
    fn first_difference_finds_field() {
        let requested = ModuleVersion::new(2, 1, 0, 0);
        assert_eq!(requested.first_difference(&ModuleVersion::new(2, 1, 0, 0)), None);
        assert_eq!(requested.first_difference(&ModuleVersion::new(2, 1, 5, 0)), Some(2));
        assert_eq!(requested.first_difference(&ModuleVersion::new(3, 0, 0, 0)), Some(0));
    }

    #[test]
    fn identity_round_trips_through_text() {
        let identity = ModuleIdentity::named("Acme.Components")
            .with_version(ModuleVersion::new(1, 2, 0, 0))
            .with_culture("en-US")
            .with_public_key(vec![0x00, 0x24, 0xff]);

        let text = identity.to_string();
        assert_eq!(
            text,
            "Acme.Components, Version=1.2.0.0, Culture=en-US, PublicKey=0024ff"
        );
        assert_eq!(text.parse::<ModuleIdentity>().unwrap(), identity);
    }

    #[test]
    fn identity_parses_bare_name() {
        let identity: ModuleIdentity = "Acme.Core".parse().unwrap();
        assert_eq!(identity, ModuleIdentity::named("Acme.Core"));
        assert_eq!(identity.to_string(), "Acme.Core, Culture=neutral, PublicKey=null");
    }

    #[test]
    fn neutral_culture_is_no_culture() {
        let identity: ModuleIdentity = "Acme, Culture=neutral".parse().unwrap();
        assert!(identity.culture.is_none());
        assert!(identity.same_culture(&ModuleIdentity::named("acme")));
    }

    #[test]
    fn identity_rejects_unknown_fields() {
        assert!("Acme, Flavor=spicy".parse::<ModuleIdentity>().is_err());
        assert!("Acme, Version".parse::<ModuleIdentity>().is_err());
        assert!(", Version=1.0".parse::<ModuleIdentity>().is_err());
    }

    #[test]
    fn names_compare_case_insensitively() {
        let a = ModuleIdentity::named("Acme.Core");
        let b = ModuleIdentity::named("ACME.CORE");
        assert!(a.same_name(&b));
    }

    #[test]
    fn public_key_token_is_stable() {
        let identity = ModuleIdentity::named("Acme").with_public_key(vec![1, 2, 3]);
        let token = identity.public_key_token().unwrap();
        assert_eq!(token.len(), 16);
        assert_eq!(identity.public_key_token().unwrap(), token);
        assert!(ModuleIdentity::named("Acme").public_key_token().is_none());
    }

    #[test]
    fn version_serializes_as_string() {
        let json = serde_json::to_string(&ModuleVersion::new(1, 2, 3, 4)).unwrap();
        assert_eq!(json, "\"1.2.3.4\"");
        let parsed: ModuleVersion = serde_json::from_str("\"2.1\"").unwrap();
        assert_eq!(parsed, ModuleVersion::new(2, 1, 0, 0));
    }
}
