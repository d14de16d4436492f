use std::sync::LazyLock;

use regex::Regex;

static ROOT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^h-[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap());
static PROPERTY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(p|u|dt|e)-([a-z0-9]+(?:-[a-z0-9]+)*)$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    Plain,
    Url,
    DateTime,
    Embedded,
}

/// Microformats2 class names found on one element.
#[derive(Debug, Default, PartialEq)]
pub struct Classes {
    pub roots: Vec<String>,
    pub properties: Vec<(Prefix, String)>,
}

impl Classes {
    pub fn parse(class_attr: &str) -> Self {
        let mut classes = Classes::default();
        for token in class_attr.split_whitespace() {
            if ROOT_RE.is_match(token) {
                if !classes.roots.iter().any(|r| r == token) {
                    classes.roots.push(token.to_string());
                }
            } else if let Some(caps) = PROPERTY_RE.captures(token) {
                let prefix = match &caps[1] {
                    "p" => Prefix::Plain,
                    "u" => Prefix::Url,
                    "dt" => Prefix::DateTime,
                    _ => Prefix::Embedded,
                };
                let entry = (prefix, caps[2].to_string());
                if !classes.properties.contains(&entry) {
                    classes.properties.push(entry);
                }
            }
        }
        classes
    }

    pub fn is_root(&self) -> bool {
        !self.roots.is_empty()
    }
}
