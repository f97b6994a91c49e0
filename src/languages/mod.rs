pub mod python;

use std::path::Path;

use crate::error::Result;
use crate::indexer::ast;

pub use python::PythonGrammar;

/// One source grammar. A front end is built around exactly one of these.
pub trait LanguageGrammar: Send + Sync {
    fn name(&self) -> &'static str;
    fn file_extensions(&self) -> &[&'static str];
    fn language(&self) -> tree_sitter::Language;

    /// Whether `node` is a construct the grammar accepts but the language
    /// itself rejects. A tree containing one is treated as a syntax error.
    fn rejects(&self, _node: tree_sitter::Node<'_>) -> bool {
        false
    }

    /// Lowers an error-free concrete tree into the declaration tree.
    /// Fails when the tree nests deeper than the lowering supports.
    fn lower(&self, root: tree_sitter::Node<'_>, source: &[u8]) -> Result<ast::Module>;

    fn supports(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.file_extensions().contains(&ext))
    }
}
