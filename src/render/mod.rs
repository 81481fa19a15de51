//! Renderer module: markdown page generation.

pub mod document;
pub mod page;

use crate::index::SymbolIndex;
use crate::links::LinkRewriter;
use crate::model::Module;

/// Extension of generated pages.
pub const DOC_EXTENSION: &str = "md";

/// Render one module's page against the finished symbol index.
pub fn render_page(module: &Module, index: &SymbolIndex) -> String {
    page::PageRenderer::new(LinkRewriter::new(index))
        .render(module)
        .to_string()
}
