use tl::{HTMLTag, NodeHandle, Parser};

/// Lowercased element name.
pub fn name(tag: &HTMLTag) -> String {
    tag.name().as_utf8_str().to_ascii_lowercase()
}

pub fn attr(tag: &HTMLTag, key: &str) -> Option<String> {
    tag.attributes()
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .and_then(|(_, v)| v.map(|v| decode_entities(&v)))
}

/// Text content with entities decoded and whitespace collapsed.
pub fn text<'b>(tag: &HTMLTag<'b>, parser: &Parser<'b>) -> String {
    collapse_whitespace(&decode_entities(&tag.inner_text(parser)))
}

pub fn inner_html<'b>(tag: &HTMLTag<'b>, parser: &Parser<'b>) -> String {
    tag.inner_html(parser).trim().to_string()
}

pub fn child_handles(tag: &HTMLTag) -> Vec<NodeHandle> {
    tag.children().top().iter().copied().collect()
}

/// Attribute `key`, only when the element is one of `names`.
pub fn attr_for(tag: &HTMLTag, tag_name: &str, names: &[&str], key: &str) -> Option<String> {
    if names.contains(&tag_name) {
        attr(tag, key)
    } else {
        None
    }
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn decode_entities(s: &str) -> String {
    html_escape::decode_html_entities(s).into_owned()
}
