//! Parsed microformats2 document: items, their properties, and page-level rels.
//!
//! Serializes to the canonical mf2 JSON shape so the output of `parse` can be
//! consumed by other mf2 tooling.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const H_ENTRY: &str = "h-entry";
pub const H_CARD: &str = "h-card";
pub const H_FEED: &str = "h-feed";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub rels: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "type")]
    pub types: Vec<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, Vec<PropertyValue>>,
    /// Plain value of a nested item used as a property (its implied name or url).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    Item(Item),
}

impl Document {
    /// All targets of a rel keyword, in document order.
    pub fn rel(&self, keyword: &str) -> &[String] {
        self.rels.get(keyword).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn first_rel(&self, keyword: &str) -> Option<&str> {
        self.rel(keyword).first().map(String::as_str)
    }

    pub fn add_rel(&mut self, keyword: &str, target: &str) {
        let targets = self.rels.entry(keyword.to_string()).or_default();
        if !targets.iter().any(|t| t == target) {
            targets.push(target.to_string());
        }
    }
}

impl Item {
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut item = Item::default();
        for ty in types {
            let ty = ty.into();
            if !item.types.contains(&ty) {
                item.types.push(ty);
            }
        }
        item
    }

    /// Builder form of [`Item::push`].
    pub fn with(mut self, name: &str, value: impl Into<PropertyValue>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: &str, value: impl Into<PropertyValue>) {
        self.properties
            .entry(name.to_string())
            .or_default()
            .push(value.into());
    }

    pub fn has_type(&self, ty: &str) -> bool {
        self.types.iter().any(|t| t == ty)
    }

    pub fn values(&self, name: &str) -> &[PropertyValue] {
        self.properties
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The authoritative (index 0) value of a property.
    pub fn first(&self, name: &str) -> Option<&PropertyValue> {
        self.values(name).first()
    }

    /// The first value of a property, only when it is a plain string.
    pub fn first_str(&self, name: &str) -> Option<&str> {
        self.first(name).and_then(PropertyValue::as_str)
    }
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            PropertyValue::Item(_) => None,
        }
    }

    pub fn as_item(&self) -> Option<&Item> {
        match self {
            PropertyValue::Item(item) => Some(item),
            PropertyValue::Text(_) => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Text(s)
    }
}

impl From<Item> for PropertyValue {
    fn from(item: Item) -> Self {
        PropertyValue::Item(item)
    }
}
