//! Symbol-to-hyperlink substitution over free text.

use crate::index::SymbolIndex;

/// Whether matched identifiers become `<a>` markup or plain display names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    Link,
    /// For text placed inside code spans or fenced blocks.
    Plain,
}

/// Rewrites known fully-qualified identifiers into links.
#[derive(Debug, Clone, Copy)]
pub struct LinkRewriter<'a> {
    index: &'a SymbolIndex,
}

impl<'a> LinkRewriter<'a> {
    pub fn new(index: &'a SymbolIndex) -> Self {
        Self { index }
    }

    /// Replace every literal occurrence of every indexed identifier.
    ///
    /// Entries are visited in the index's longest-first order and each one is
    /// a global literal replacement with no word-boundary check, so later
    /// (shorter) identifiers also see the output of earlier replacements.
    pub fn rewrite(&self, text: &str, mode: LinkMode) -> String {
        let mut text = text.to_string();
        if self.index.is_empty() {
            return text;
        }

        for entry in self.index.entries() {
            if !text.contains(entry.symbol.as_str()) {
                continue;
            }
            let replacement = match mode {
                LinkMode::Link => format!("<a href=\"{}\">{}</a>", entry.anchor, entry.display),
                LinkMode::Plain => entry.display.clone(),
            };
            text = text.replace(entry.symbol.as_str(), &replacement);
        }
        text
    }

    pub fn link(&self, text: &str) -> String {
        self.rewrite(text, LinkMode::Link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexBuilder;
    use crate::model::{Class, Module};

    #[test]
    fn longest_identifier_wins() {
        let index = SymbolIndex::from_entries(&[("a.b", "b", "#b"), ("a.b.c", "c", "#c")]);
        let rewriter = LinkRewriter::new(&index);

        let out = rewriter.link("see a.b.c for details");
        assert_eq!(out, "see <a href=\"#c\">c</a> for details");
    }

    #[test]
    fn shorter_identifier_still_links_alone() {
        let index = SymbolIndex::from_entries(&[("a.b", "b", "#b"), ("a.b.c", "c", "#c")]);
        let rewriter = LinkRewriter::new(&index);

        assert_eq!(
            rewriter.link("a.b and a.b.c"),
            "<a href=\"#b\">b</a> and <a href=\"#c\">c</a>"
        );
    }

    #[test]
    fn plain_mode_emits_display_names_only() {
        let index = SymbolIndex::from_entries(&[("ui.Widget", "Widget", "/api/ui/#widget")]);
        let rewriter = LinkRewriter::new(&index);

        assert_eq!(rewriter.rewrite("ui.Widget[]", LinkMode::Plain), "Widget[]");
    }

    #[test]
    fn links_across_pages() {
        let a = Module {
            name: "A".to_string(),
            classes: vec![Class {
                name: "Foo".to_string(),
                ..Class::default()
            }],
            ..Module::default()
        };
        let b = Module {
            name: "B".to_string(),
            ..Module::default()
        };
        let mut builder = IndexBuilder::new();
        builder.add_module(&a, "/api/a");
        builder.add_module(&b, "/api/b");
        let index = builder.finalize();
        let rewriter = LinkRewriter::new(&index);

        assert_eq!(
            rewriter.link("Returns an A.Foo instance"),
            "Returns an <a href=\"/api/a/#foo\">Foo</a> instance"
        );
    }

    #[test]
    fn matches_inside_ordinary_words() {
        let index = SymbolIndex::from_entries(&[("io", "io", "/api/io")]);
        let rewriter = LinkRewriter::new(&index);

        assert_eq!(rewriter.link("ratio"), "rat<a href=\"/api/io\">io</a>");
    }

    #[test]
    fn replacements_are_rescanned_by_shorter_identifiers() {
        let index = SymbolIndex::from_entries(&[
            ("Widget", "Widget", "#short"),
            ("core.Widget", "Widget", "#long"),
        ]);
        let rewriter = LinkRewriter::new(&index);

        assert_eq!(
            rewriter.link("core.Widget"),
            "<a href=\"#long\"><a href=\"#short\">Widget</a></a>"
        );
    }

    #[test]
    fn text_without_symbols_is_unchanged() {
        let index = SymbolIndex::from_entries(&[("ui", "ui", "/api/ui")]);
        let rewriter = LinkRewriter::new(&index);
        assert_eq!(rewriter.link("nothing to see"), "nothing to see");
    }
}
