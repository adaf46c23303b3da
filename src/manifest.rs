//! Group definition documents.
//!
//! A group is described by a structured document listing one element per
//! resource, each with a type discriminator, a name unique within the group
//! and a bag of kind-specific attributes:
//!
//! ```json
//! {
//!     "name": "ui",
//!     "resources": [
//!         { "type": "texture", "name": "button", "path": "res:ui/button.tex" },
//!         { "type": "spritesheet", "name": "icons", "texture": "button",
//!           "cell_width": 25, "cell_height": 25 }
//!     ]
//! }
//! ```
//!
//! Parsing is strictly synchronous; every malformed attribute is reported as
//! `BadParam` at group creation time and never deferred to the worker.

use inlinable_string::InlinableString;
use serde_json;

use crate::errors::*;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GroupManifest {
    pub name: InlinableString,
    #[serde(default)]
    pub resources: Vec<ResourceDef>,
}

impl GroupManifest {
    /// Parses a definition document from raw bytes.
    pub fn parse(bytes: &[u8]) -> Result<GroupManifest> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// A single resource definition element. Kind-specific attributes are kept
/// as an untyped element tree and picked apart by the per-kind factories.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ResourceDef {
    #[serde(rename = "type")]
    pub kind: InlinableString,
    pub name: InlinableString,
    /// True if the content is supplied programmatically instead of being
    /// read from a file during load.
    #[serde(default)]
    pub manual: bool,
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl ResourceDef {
    pub fn new<T1, T2>(kind: T1, name: T2) -> Self
    where
        T1: Into<InlinableString>,
        T2: Into<InlinableString>,
    {
        ResourceDef {
            kind: kind.into(),
            name: name.into(),
            manual: false,
            attributes: serde_json::Map::new(),
        }
    }

    /// Sets an attribute, consuming and returning `self` for chaining.
    pub fn with<T: Into<serde_json::Value>>(mut self, key: &str, v: T) -> Self {
        self.attributes.insert(key.into(), v.into());
        self
    }

    fn missing(&self, key: &str) -> Error {
        Error::BadParam(format!(
            "Resource '{}' ({}) misses required attribute '{}'.",
            self.name, self.kind, key
        ))
    }

    fn malformed(&self, key: &str, expected: &str) -> Error {
        Error::BadParam(format!(
            "Attribute '{}' of resource '{}' ({}) is not a {}.",
            key, self.name, self.kind, expected
        ))
    }

    pub fn attr_str(&self, key: &str) -> Result<&str> {
        self.attr_str_opt(key)?
            .ok_or_else(|| self.missing(key))
    }

    pub fn attr_str_opt(&self, key: &str) -> Result<Option<&str>> {
        match self.attributes.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_str()
                .map(Some)
                .ok_or_else(|| self.malformed(key, "string")),
        }
    }

    pub fn attr_u32(&self, key: &str) -> Result<u32> {
        let v = self.attributes.get(key).ok_or_else(|| self.missing(key))?;
        v.as_u64()
            .and_then(|v| if v <= u64::from(u32::max_value()) { Some(v as u32) } else { None })
            .ok_or_else(|| self.malformed(key, "32-bits unsigned integer"))
    }

    pub fn attr_f32(&self, key: &str) -> Result<f32> {
        let v = self.attributes.get(key).ok_or_else(|| self.missing(key))?;
        v.as_f64()
            .map(|v| v as f32)
            .ok_or_else(|| self.malformed(key, "number"))
    }

    pub fn attr_u32_list(&self, key: &str) -> Result<Vec<u32>> {
        let v = self.attributes.get(key).ok_or_else(|| self.missing(key))?;
        let items = v
            .as_array()
            .ok_or_else(|| self.malformed(key, "list of integers"))?;

        let mut out = Vec::with_capacity(items.len());
        for item in items {
            let item = item
                .as_u64()
                .ok_or_else(|| self.malformed(key, "list of integers"))?;
            out.push(item as u32);
        }

        Ok(out)
    }

    pub fn attr_str_list(&self, key: &str) -> Result<Vec<&str>> {
        let v = self.attributes.get(key).ok_or_else(|| self.missing(key))?;
        let items = v
            .as_array()
            .ok_or_else(|| self.malformed(key, "list of strings"))?;

        let mut out = Vec::with_capacity(items.len());
        for item in items {
            let item = item
                .as_str()
                .ok_or_else(|| self.malformed(key, "list of strings"))?;
            out.push(item);
        }

        Ok(out)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse() {
        let doc = br#"{
            "name": "ui",
            "resources": [
                { "type": "text", "name": "credits", "path": "res:credits.txt" }
            ]
        }"#;

        let manifest = GroupManifest::parse(doc).unwrap();
        assert_eq!(manifest.name, "ui");
        assert_eq!(manifest.resources.len(), 1);
        assert_eq!(manifest.resources[0].kind, "text");
        assert_eq!(manifest.resources[0].attr_str("path").unwrap(), "res:credits.txt");
        assert!(!manifest.resources[0].manual);
    }

    #[test]
    fn attributes() {
        let def = ResourceDef::new("texture", "crate")
            .with("size", 16)
            .with("scale", 0.5)
            .with("frames", vec![1, 2, 3]);

        assert_eq!(def.attr_u32("size").unwrap(), 16);
        assert_eq!(def.attr_f32("scale").unwrap(), 0.5);
        assert_eq!(def.attr_u32_list("frames").unwrap(), vec![1, 2, 3]);

        match def.attr_str("path") {
            Err(Error::BadParam(_)) => {}
            other => panic!("unexpected {:?}", other),
        }

        match def.attr_u32("scale") {
            Err(Error::BadParam(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn malformed_document() {
        assert!(GroupManifest::parse(b"{ not json }").is_err());
    }
}
