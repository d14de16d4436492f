pub mod classes;
pub mod values;

use tl::{HTMLTag, NodeHandle, Parser};
use tracing::debug;
use url::Url;

use crate::document::{Document, Item};
use crate::error::ParseError;
use classes::{Classes, Prefix};

/// HTML → microformats2 document. Relative URLs resolve against `base_url`.
///
/// An empty or microformat-free page yields an empty `Document`, not an error.
pub fn parse_html(content: &str, base_url: &Url) -> Result<Document, ParseError> {
    let dom = tl::parse(content, tl::ParserOptions::default())
        .map_err(|e| ParseError::Html(format!("{:?}", e)))?;
    let walker = Walker {
        parser: dom.parser(),
        base: base_url,
    };

    let mut doc = Document::default();
    for handle in dom.children() {
        walker.collect_roots(*handle, &mut doc.items);
        walker.collect_rels(*handle, &mut doc);
    }

    debug!(
        "Parsed {}: {} items, {} rel keywords",
        base_url,
        doc.items.len(),
        doc.rels.len()
    );
    Ok(doc)
}

/// Property-class bookkeeping for implied-property rules.
#[derive(Default)]
struct Seen {
    plain_or_embedded: bool,
    url: bool,
    nested: bool,
}

impl Seen {
    fn mark(&mut self, prefix: Prefix) {
        match prefix {
            Prefix::Plain | Prefix::Embedded => self.plain_or_embedded = true,
            Prefix::Url => self.url = true,
            Prefix::DateTime => {}
        }
    }
}

struct Walker<'p, 'buf> {
    parser: &'p Parser<'buf>,
    base: &'p Url,
}

impl<'p, 'buf> Walker<'p, 'buf> {
    fn tag(&self, handle: NodeHandle) -> Option<&'p HTMLTag<'buf>> {
        handle.get(self.parser)?.as_tag()
    }

    fn classes(tag: &HTMLTag) -> Classes {
        values::attr(tag, "class")
            .map(|c| Classes::parse(&c))
            .unwrap_or_default()
    }

    fn resolve(&self, href: &str) -> String {
        let href = href.trim();
        self.base
            .join(href)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| href.to_string())
    }

    fn collect_roots(&self, handle: NodeHandle, out: &mut Vec<Item>) {
        let Some(tag) = self.tag(handle) else {
            return;
        };
        let classes = Self::classes(tag);
        if classes.is_root() {
            out.push(self.parse_item(tag, &classes.roots));
            return;
        }
        for child in values::child_handles(tag) {
            self.collect_roots(child, out);
        }
    }

    fn collect_rels(&self, handle: NodeHandle, doc: &mut Document) {
        let Some(tag) = self.tag(handle) else {
            return;
        };
        let name = values::name(tag);
        if matches!(name.as_str(), "a" | "area" | "link") {
            if let (Some(rel), Some(href)) = (values::attr(tag, "rel"), values::attr(tag, "href")) {
                let target = self.resolve(&href);
                for keyword in rel.split_whitespace() {
                    doc.add_rel(&keyword.to_ascii_lowercase(), &target);
                }
            }
        }
        for child in values::child_handles(tag) {
            self.collect_rels(child, doc);
        }
    }

    fn parse_item(&self, tag: &HTMLTag<'buf>, types: &[String]) -> Item {
        let mut item = Item::new(types.iter().cloned());
        let mut seen = Seen::default();
        for child in values::child_handles(tag) {
            self.collect_properties(child, &mut item, &mut seen);
        }
        self.imply(tag, &mut item, &seen);
        item
    }

    fn collect_properties(&self, handle: NodeHandle, item: &mut Item, seen: &mut Seen) {
        let Some(tag) = self.tag(handle) else {
            return;
        };
        let classes = Self::classes(tag);

        if classes.is_root() {
            seen.nested = true;
            let nested = self.parse_item(tag, &classes.roots);
            if classes.properties.is_empty() {
                item.children.push(nested);
                return;
            }
            for (prefix, name) in &classes.properties {
                seen.mark(*prefix);
                let mut value = nested.clone();
                let implied = match prefix {
                    Prefix::Url => nested.first_str("url"),
                    _ => nested.first_str("name"),
                };
                value.value = Some(match implied {
                    Some(v) => v.to_string(),
                    None => self.property_value(tag, *prefix),
                });
                item.push(name, value);
            }
            return;
        }

        for (prefix, name) in &classes.properties {
            seen.mark(*prefix);
            item.push(name, self.property_value(tag, *prefix));
        }
        for child in values::child_handles(tag) {
            self.collect_properties(child, item, seen);
        }
    }

    fn property_value(&self, tag: &HTMLTag<'buf>, prefix: Prefix) -> String {
        let name = values::name(tag);
        let name = name.as_str();
        match prefix {
            Prefix::Plain => values::attr_for(tag, name, &["img", "area"], "alt")
                .or_else(|| values::attr_for(tag, name, &["abbr"], "title"))
                .or_else(|| values::attr_for(tag, name, &["data", "input"], "value"))
                .unwrap_or_else(|| values::text(tag, self.parser)),
            Prefix::Url => values::attr_for(tag, name, &["a", "area", "link"], "href")
                .or_else(|| {
                    values::attr_for(tag, name, &["img", "audio", "video", "source", "iframe"], "src")
                })
                .or_else(|| values::attr_for(tag, name, &["video"], "poster"))
                .or_else(|| values::attr_for(tag, name, &["object"], "data"))
                .map(|href| self.resolve(&href))
                .unwrap_or_else(|| values::text(tag, self.parser)),
            Prefix::DateTime => values::attr_for(tag, name, &["time", "ins", "del"], "datetime")
                .or_else(|| values::attr_for(tag, name, &["abbr"], "title"))
                .or_else(|| values::attr_for(tag, name, &["data", "input"], "value"))
                .unwrap_or_else(|| values::text(tag, self.parser)),
            Prefix::Embedded => values::inner_html(tag, self.parser),
        }
    }

    /// The single element child of `tag`, if it is not itself a microformat.
    fn only_child(&self, tag: &HTMLTag<'buf>) -> Option<&'p HTMLTag<'buf>> {
        let mut children = values::child_handles(tag)
            .into_iter()
            .filter_map(|h| self.tag(h));
        let only = children.next()?;
        if children.next().is_some() || Self::classes(only).is_root() {
            return None;
        }
        Some(only)
    }

    fn imply(&self, tag: &HTMLTag<'buf>, item: &mut Item, seen: &Seen) {
        let name = values::name(tag);
        let name = name.as_str();

        if !item.properties.contains_key("name") && !seen.plain_or_embedded && !seen.nested {
            let implied = values::attr_for(tag, name, &["img", "area"], "alt")
                .or_else(|| values::attr_for(tag, name, &["abbr"], "title"))
                .or_else(|| {
                    let child = self.only_child(tag)?;
                    let child_name = values::name(child);
                    values::attr_for(child, &child_name, &["img", "area"], "alt")
                        .or_else(|| values::attr_for(child, &child_name, &["abbr"], "title"))
                })
                .unwrap_or_else(|| values::text(tag, self.parser));
            if !implied.is_empty() {
                item.push("name", implied);
            }
        }

        if !item.properties.contains_key("photo") && !seen.url && !seen.nested {
            let photo = values::attr_for(tag, name, &["img"], "src")
                .or_else(|| values::attr_for(tag, name, &["object"], "data"))
                .or_else(|| {
                    let child = self.only_child(tag)?;
                    values::attr_for(child, &values::name(child), &["img"], "src")
                });
            if let Some(src) = photo {
                item.push("photo", self.resolve(&src));
            }
        }

        if !item.properties.contains_key("url") && !seen.url && !seen.nested {
            let url = values::attr_for(tag, name, &["a", "area"], "href").or_else(|| {
                let child = self.only_child(tag)?;
                values::attr_for(child, &values::name(child), &["a", "area"], "href")
            });
            if let Some(href) = url {
                item.push("url", self.resolve(&href));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{PropertyValue, H_CARD, H_ENTRY};

    fn base() -> Url {
        Url::parse("http://example.com/posts/1").unwrap()
    }

    fn fixture(name: &str) -> Document {
        let html = std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap();
        parse_html(&html, &base()).unwrap()
    }

    #[test]
    fn empty_page_is_an_empty_document() {
        let doc = parse_html("<p>nowt</p>", &base()).unwrap();
        assert!(doc.items.is_empty());
        assert!(doc.rels.is_empty());
    }

    #[test]
    fn simple_card_implies_name() {
        let doc = parse_html(r#"<div class="h-card"> John   Doe </div>"#, &base()).unwrap();
        assert_eq!(doc.items.len(), 1);
        assert_eq!(doc.items[0].types, vec![H_CARD]);
        assert_eq!(doc.items[0].first_str("name"), Some("John Doe"));
    }

    #[test]
    fn linked_avatar_card_takes_name_from_alt() {
        let html = r#"<a class="h-card" href="/jane"><img src="/jane.jpg" alt="Jane"></a>"#;
        let doc = parse_html(html, &base()).unwrap();
        let card = &doc.items[0];
        assert_eq!(card.first_str("name"), Some("Jane"));
        assert_eq!(card.first_str("photo"), Some("http://example.com/jane.jpg"));
        assert_eq!(card.first_str("url"), Some("http://example.com/jane"));
    }

    #[test]
    fn only_child_abbr_title_beats_text() {
        let html = r#"<span class="h-card"><abbr title="Jane Doe">JD</abbr></span>"#;
        let doc = parse_html(html, &base()).unwrap();
        assert_eq!(doc.items[0].first_str("name"), Some("Jane Doe"));
    }

    #[test]
    fn character_references_are_decoded_in_values() {
        let html = r#"
            <div class="h-entry">
              <span class="p-author">Fran&#231;ois &mdash; O&#x27;Neil</span>
              <a class="u-url" href="/posts?a=1&#38;b=2">link</a>
            </div>"#;
        let doc = parse_html(html, &base()).unwrap();
        let entry = &doc.items[0];
        assert_eq!(entry.first_str("author"), Some("Fran\u{e7}ois \u{2014} O'Neil"));
        assert_eq!(entry.first_str("url"), Some("http://example.com/posts?a=1&b=2"));
    }

    #[test]
    fn entry_with_plain_author() {
        let doc = fixture("entry_plain_author");
        let entry = &doc.items[0];
        assert!(entry.has_type(H_ENTRY));
        assert_eq!(entry.first_str("author"), Some("William Shakespeare"));
        assert_eq!(entry.first_str("url"), Some("http://example.com/posts/1"));
    }

    #[test]
    fn entry_with_embedded_card() {
        let doc = fixture("entry_embedded_card");
        let author = doc.items[0].first("author").and_then(PropertyValue::as_item).unwrap();
        assert!(author.has_type(H_CARD));
        assert_eq!(author.value.as_deref(), Some("Homer"));
        assert_eq!(author.first_str("name"), Some("Homer"));
        assert_eq!(author.first_str("url"), Some("https://en.wikiquote.org/wiki/Homer"));
        assert_eq!(author.first_str("photo"), Some("http://example.com/images/homer.jpg"));
    }

    #[test]
    fn rels_are_resolved_and_grouped() {
        let doc = fixture("entry_rel_author");
        assert_eq!(doc.first_rel("author"), Some("http://example.com/about"));
        assert_eq!(doc.rel("stylesheet"), ["http://example.com/style.css"]);
        assert!(doc.items[0].first("author").is_none());
    }

    #[test]
    fn feed_children_and_dt_values() {
        let html = r#"
            <div class="h-feed">
              <a class="p-author h-card" href="/me">Jane</a>
              <article class="h-entry">
                <time class="dt-published" datetime="2017-01-02">2 Jan</time>
                <div class="e-content"><b>hi</b></div>
              </article>
            </div>"#;
        let doc = parse_html(html, &base()).unwrap();
        let feed = &doc.items[0];
        let author = feed.first("author").and_then(PropertyValue::as_item).unwrap();
        assert_eq!(author.first_str("url"), Some("http://example.com/me"));
        assert_eq!(feed.children.len(), 1);
        let entry = &feed.children[0];
        assert_eq!(entry.first_str("published"), Some("2017-01-02"));
        assert_eq!(entry.first_str("content"), Some("<b>hi</b>"));
        assert!(entry.first("name").is_none());
    }
}
