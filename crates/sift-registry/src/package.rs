//! Package records as stored in repository metadata.
//!
//! The metadata format is loose: epochs may be numbers or strings, booleans
//! may be spelled as strings, and empty strings stand in for missing values.
//! The deserializers below normalize all of that into [`RemotePackage`].

use std::fmt;

use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer, Serialize,
};

#[derive(Deserialize)]
#[serde(untagged)]
enum FlexiBool {
    Bool(bool),
    String(String),
}

fn empty_is_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.filter(|s| !s.trim().is_empty()))
}

fn optional_number<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    struct EpochVisitor;

    impl<'de> Visitor<'de> for EpochVisitor {
        type Value = Option<u64>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a non-negative integer, numeric string, or null")
        }

        fn visit_none<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u64::try_from(v)
                .map(Some)
                .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            let v = v.trim();
            if v.is_empty() {
                return Ok(None);
            }
            v.parse::<u64>()
                .map(Some)
                .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }

    deserializer.deserialize_any(EpochVisitor)
}

fn flexible_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<FlexiBool>::deserialize(deserializer)? {
        Some(FlexiBool::Bool(b)) => Ok(Some(b)),
        Some(FlexiBool::String(s)) => {
            match s.to_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(Some(true)),
                "false" | "no" | "0" => Ok(Some(false)),
                "" => Ok(None),
                _ => {
                    Err(de::Error::invalid_value(
                        de::Unexpected::Str(&s),
                        &"a valid boolean (true/false, yes/no, 1/0)",
                    ))
                }
            }
        }
        None => Ok(None),
    }
}

fn default_arch() -> String {
    "noarch".to_string()
}

/// A package record from a repository's metadata file.
///
/// Only `name` and `version` are required. Dependency lists hold raw
/// expressions such as `libfoo.so.1` or `pkg >= 1.2`; they are parsed when
/// the pool is built.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct RemotePackage {
    pub name: String,

    #[serde(default, deserialize_with = "optional_number")]
    pub epoch: Option<u64>,

    pub version: String,

    #[serde(default)]
    pub release: String,

    #[serde(default = "default_arch")]
    pub arch: String,

    #[serde(default)]
    pub summary: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub url: Option<String>,

    #[serde(default)]
    pub location: String,

    #[serde(default, deserialize_with = "empty_is_none")]
    pub checksum: Option<String>,

    #[serde(default, deserialize_with = "empty_is_none", alias = "sourcerpm")]
    pub source_rpm: Option<String>,

    #[serde(default)]
    pub files: Vec<String>,

    #[serde(default)]
    pub provides: Vec<String>,

    #[serde(default)]
    pub requires: Vec<String>,

    #[serde(default)]
    pub conflicts: Vec<String>,

    #[serde(default)]
    pub obsoletes: Vec<String>,

    #[serde(default, deserialize_with = "flexible_bool", alias = "_disabled")]
    pub disabled: Option<bool>,
}

impl RemotePackage {
    pub fn is_disabled(&self) -> bool {
        self.disabled.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_package_minimal() {
        let json = r#"{ "name": "pkg", "version": "1.2" }"#;

        let pkg: RemotePackage = serde_json::from_str(json).unwrap();
        assert_eq!(pkg.name, "pkg");
        assert_eq!(pkg.version, "1.2");
        assert_eq!(pkg.release, "");
        assert_eq!(pkg.arch, "noarch");
        assert_eq!(pkg.epoch, None);
        assert!(pkg.provides.is_empty());
        assert!(!pkg.is_disabled());
    }

    #[test]
    fn test_epoch_accepts_strings_and_numbers() {
        let pkg: RemotePackage =
            serde_json::from_str(r#"{ "name": "a", "version": "1", "epoch": "2" }"#).unwrap();
        assert_eq!(pkg.epoch, Some(2));

        let pkg: RemotePackage =
            serde_json::from_str(r#"{ "name": "a", "version": "1", "epoch": 3 }"#).unwrap();
        assert_eq!(pkg.epoch, Some(3));

        let pkg: RemotePackage =
            serde_json::from_str(r#"{ "name": "a", "version": "1", "epoch": "" }"#).unwrap();
        assert_eq!(pkg.epoch, None);

        let res: Result<RemotePackage, _> =
            serde_json::from_str(r#"{ "name": "a", "version": "1", "epoch": "x" }"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_empty_strings_are_none() {
        let json = r#"{
            "name": "pkg",
            "version": "1.2",
            "url": "",
            "sourcerpm": "pkg-1.2-3.src.rpm"
        }"#;

        let pkg: RemotePackage = serde_json::from_str(json).unwrap();
        assert_eq!(pkg.url, None);
        assert_eq!(pkg.source_rpm.as_deref(), Some("pkg-1.2-3.src.rpm"));
    }

    #[test]
    fn test_flexible_bool() {
        let json = r#"{ "name": "pkg", "version": "1", "_disabled": "yes" }"#;

        let pkg: RemotePackage = serde_json::from_str(json).unwrap();
        assert_eq!(pkg.disabled, Some(true));
        assert!(pkg.is_disabled());
    }
}
