//! Node and property names.
//!
//! A name is a non-empty string, optionally carrying a namespace prefix
//! (`"graft:uuid"`). Names must not contain the characters that delimit path
//! segments and sibling indexes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Characters reserved by the path syntax.
const RESERVED_CHARS: &[char] = &['/', '[', ']', '\n', '\r', '\t'];

/// A validated node or property name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Name(String);

impl Name {
    /// Validate and wrap a name.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.is_empty() {
            return Err(TypeError::InvalidName {
                name,
                reason: "name must not be empty".into(),
            });
        }
        if let Some(ch) = name.chars().find(|c| RESERVED_CHARS.contains(c)) {
            return Err(TypeError::InvalidName {
                reason: format!("contains reserved character: {ch:?}"),
                name,
            });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The namespace prefix, if the name has one.
    pub fn prefix(&self) -> Option<&str> {
        self.0.split_once(':').map(|(prefix, _)| prefix)
    }

    /// The part of the name after the namespace prefix.
    pub fn local_name(&self) -> &str {
        self.0.split_once(':').map_or(&self.0, |(_, local)| local)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Name {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Name {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Name {
    type Error = TypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Name> for String {
    fn from(name: Name) -> Self {
        name.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        assert!(Name::new("d1").is_ok());
        assert!(Name::new("graft:uuid").is_ok());
        assert!(Name::new("with space").is_ok());
    }

    #[test]
    fn empty_name_is_rejected() {
        assert!(matches!(Name::new(""), Err(TypeError::InvalidName { .. })));
    }

    #[test]
    fn reserved_characters_are_rejected() {
        for bad in ["a/b", "e[2]", "x]", "line\nbreak"] {
            assert!(Name::new(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn prefix_and_local_name() {
        let name = Name::new("graft:uuid").unwrap();
        assert_eq!(name.prefix(), Some("graft"));
        assert_eq!(name.local_name(), "uuid");

        let plain = Name::new("title").unwrap();
        assert_eq!(plain.prefix(), None);
        assert_eq!(plain.local_name(), "title");
    }

    #[test]
    fn serde_validates_on_deserialize() {
        let ok: Name = serde_json::from_str("\"p1\"").unwrap();
        assert_eq!(ok.as_str(), "p1");
        assert!(serde_json::from_str::<Name>("\"a/b\"").is_err());
    }
}
