//! Run-scoped symbol index used for cross-page linking.
//!
//! Every module, class, method, enum member and free function discovered in a
//! run is registered here before any page is rendered. [`IndexBuilder::finalize`]
//! sorts the entries longest identifier first, which the link rewriter relies on
//! so that `Mod.Class.method` is substituted before `Mod.Class` can consume part
//! of it.

use crate::model::{Class, Function, Module};
use std::collections::HashSet;
use tracing::{debug, warn};

/// One linkable symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Fully-qualified identifier, e.g. `ui.Widget.resize`.
    pub symbol: String,
    /// Text shown inside the generated link.
    pub display: String,
    /// Link target, e.g. `/api/ui/widget/#resize`.
    pub anchor: String,
}

/// Accumulates entries while modules are being discovered.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    entries: Vec<IndexEntry>,
    seen: HashSet<String>,
}

/// Immutable, longest-first symbol index.
#[derive(Debug, Default)]
pub struct SymbolIndex {
    entries: Vec<IndexEntry>,
}

/// Anchor fragment for a symbol name.
pub fn anchor_for(name: &str) -> String {
    name.to_lowercase()
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every symbol `module` exposes, rendered on the page at `page`.
    pub fn add_module(&mut self, module: &Module, page: &str) {
        self.push(&module.name, &module.name, page.to_string());

        for class in &module.classes {
            self.add_class(module, class, page);
        }

        for function in &module.functions {
            self.add_symbol(
                page,
                format!("{}.{}", module.name, function.name),
                &function.name,
                None,
            );
        }
    }

    fn add_class(&mut self, module: &Module, class: &Class, page: &str) {
        let class_id = format!("{}.{}", module.name, class.name);
        self.add_symbol(page, class_id.clone(), &class.name, None);

        for method in &class.methods {
            self.add_method(page, &class_id, method);
        }

        if class.is_enum {
            // Members render inside the enum's table, so they link to the enum.
            for field in &class.fields {
                self.add_symbol(
                    page,
                    format!("{}.{}", class_id, field.name),
                    &class.name,
                    Some(format!("{}.{}", class.name, field.name)),
                );
            }
        }
    }

    fn add_method(&mut self, page: &str, class_id: &str, method: &Function) {
        self.add_symbol(
            page,
            format!("{}.{}", class_id, method.name),
            &method.name,
            None,
        );
    }

    fn add_symbol(&mut self, page: &str, symbol: String, name: &str, display: Option<String>) {
        let anchor = format!("{}/#{}", page, anchor_for(name));
        let display = display.unwrap_or_else(|| name.to_string());
        self.push(&symbol, &display, anchor);
    }

    fn push(&mut self, symbol: &str, display: &str, anchor: String) {
        if !self.seen.insert(symbol.to_string()) {
            warn!(symbol, anchor = %anchor, "duplicate symbol ignored, first definition wins");
            return;
        }
        self.entries.push(IndexEntry {
            symbol: symbol.to_string(),
            display: display.to_string(),
            anchor,
        });
    }

    /// Sort longest identifier first and freeze the index.
    ///
    /// The sort is stable: identifiers of equal length keep discovery order.
    pub fn finalize(mut self) -> SymbolIndex {
        self.entries
            .sort_by(|a, b| b.symbol.len().cmp(&a.symbol.len()));
        debug!(symbols = self.entries.len(), "symbol index built");
        SymbolIndex {
            entries: self.entries,
        }
    }
}

impl SymbolIndex {
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
impl SymbolIndex {
    pub fn get(&self, symbol: &str) -> Option<&IndexEntry> {
        self.entries.iter().find(|e| e.symbol == symbol)
    }

    /// Build an index from `(symbol, display, anchor)` triples.
    pub fn from_entries(entries: &[(&str, &str, &str)]) -> Self {
        let mut builder = IndexBuilder::new();
        for (symbol, display, anchor) in entries {
            builder.push(symbol, display, anchor.to_string());
        }
        builder.finalize()
    }
}
