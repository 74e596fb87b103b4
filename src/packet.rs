// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present facemgr Contributors

//! Named-data packets carried by face events
//!
//! Only the fields the face table and forwarding table need are modelled;
//! the on-the-wire encoding is handled elsewhere.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A hierarchical name such as `/example/video/1`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Name {
    components: Vec<String>,
}

impl Name {
    /// The root name `/`
    pub fn root() -> Self {
        Self::default()
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// True if every component of `self` is a leading component of `other`
    pub fn is_prefix_of(&self, other: &Name) -> bool {
        other.components.starts_with(&self.components)
    }

    /// The first `n` components of this name
    pub fn prefix(&self, n: usize) -> Name {
        Name {
            components: self.components.iter().take(n).cloned().collect(),
        }
    }

    pub fn append(mut self, component: impl Into<String>) -> Self {
        self.components.push(component.into());
        self
    }
}

impl FromStr for Name {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self {
            components: s
                .split('/')
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect(),
        })
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        let Ok(name) = s.parse::<Name>();
        name
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return write!(f, "/");
        }
        for component in &self.components {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

/// A request for data under a name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interest {
    pub name: Name,
    pub nonce: u32,
    /// Lifetime in milliseconds
    pub lifetime_ms: u64,
}

impl Interest {
    pub fn new(name: impl Into<Name>, nonce: u32) -> Self {
        Self {
            name: name.into(),
            nonce,
            lifetime_ms: 4000,
        }
    }
}

/// A named, immutable piece of content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Data {
    pub name: Name,
    pub content: Vec<u8>,
}

impl Data {
    pub fn new(name: impl Into<Name>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_parse_and_display() {
        let name = Name::from("/example/video/1");
        assert_eq!(name.len(), 3);
        assert_eq!(name.to_string(), "/example/video/1");
        assert_eq!(Name::from("/").to_string(), "/");
        assert!(Name::from("/").is_empty());
    }

    #[test]
    fn test_name_prefix() {
        let prefix = Name::from("/example");
        let name = Name::from("/example/video");
        assert!(prefix.is_prefix_of(&name));
        assert!(!name.is_prefix_of(&prefix));
        assert!(Name::root().is_prefix_of(&name));
        assert_eq!(name.prefix(1), prefix);
        assert_eq!(prefix.append("video"), name);
    }
}
