use std::path::Path;
use std::sync::Arc;

use crate::error::{IngestError, Result};
use crate::indexer::ast::Module;
use crate::languages::{LanguageGrammar, PythonGrammar};

/// Parses one file into a declaration tree, or fails as a whole.
///
/// A concrete tree that contains any ERROR or MISSING node, or a node kind
/// the grammar marks as rejected, is a [`IngestError::Parse`]. Partial trees
/// are never handed out.
pub struct Parser {
    grammar: Arc<dyn LanguageGrammar>,
}

impl Parser {
    pub fn new(grammar: Arc<dyn LanguageGrammar>) -> Self {
        Self { grammar }
    }

    pub fn python() -> Self {
        Self::new(Arc::new(PythonGrammar))
    }

    /// Reads a file as strict UTF-8
    pub fn read_source(path: &Path) -> Result<String> {
        let bytes = std::fs::read(path)?;
        String::from_utf8(bytes).map_err(|_| IngestError::Decode(path.to_path_buf()))
    }

    pub fn parse_file(&self, path: &Path) -> Result<ParsedFile> {
        let source = Self::read_source(path)?;
        self.parse_source(&source)
    }

    pub fn parse_source(&self, source: &str) -> Result<ParsedFile> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&self.grammar.language())
            .map_err(|e| IngestError::Grammar(e.to_string()))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| IngestError::Parse("Failed to parse source".to_string()))?;

        let root = tree.root_node();
        if let Some(invalid) = find_invalid(root, self.grammar.as_ref()) {
            let at = invalid.start_position();
            let what = if invalid.is_error() || invalid.is_missing() {
                "syntax error".to_string()
            } else {
                format!("unsupported {}", invalid.kind())
            };
            return Err(IngestError::Parse(format!(
                "{} at line {}, column {}",
                what,
                at.row + 1,
                at.column + 1
            )));
        }

        Ok(ParsedFile {
            module: self.grammar.lower(root, source.as_bytes())?,
            language: self.grammar.name(),
        })
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::python()
    }
}

/// First node, in source order, that makes the tree unacceptable.
/// Walks with a cursor so deeply nested trees do not grow the call stack.
fn find_invalid<'t>(
    root: tree_sitter::Node<'t>,
    grammar: &dyn LanguageGrammar,
) -> Option<tree_sitter::Node<'t>> {
    let has_error = root.has_error();
    let mut cursor = root.walk();

    loop {
        let node = cursor.node();
        if (has_error && (node.is_error() || node.is_missing())) || grammar.rejects(node) {
            return Some(node);
        }
        if cursor.goto_first_child() {
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

pub struct ParsedFile {
    pub module: Module,
    pub language: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::ast::Node;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_source_python() {
        let parsed = Parser::python()
            .parse_source("def main():\n    return 1\n")
            .unwrap();
        assert_eq!(parsed.language, "python");
        assert!(matches!(parsed.module.body[0], Node::FunctionDef(_)));
    }

    #[test]
    fn test_parse_source_empty() {
        let parsed = Parser::python().parse_source("").unwrap();
        assert!(parsed.module.body.is_empty());
    }

    #[test]
    fn test_parse_source_syntax_error() {
        let result = Parser::python().parse_source("def broken(:\n    pass\n");
        assert!(matches!(result, Err(IngestError::Parse(_))));
    }

    #[test]
    fn test_parse_source_unclosed_bracket() {
        let result = Parser::python().parse_source("x = [1, 2\n");
        assert!(matches!(result, Err(IngestError::Parse(_))));
    }

    #[test]
    fn test_parse_source_rejects_python2_print() {
        let result = Parser::python().parse_source("print \"hello\"\n");
        match result {
            Err(IngestError::Parse(message)) => assert!(message.contains("line 1")),
            other => panic!("expected parse error, got {:?}", other.map(|p| p.language)),
        }
    }

    #[test]
    fn test_parse_source_accepts_print_chevron() {
        let parsed = Parser::python()
            .parse_source("import sys\nprint >> sys.stderr, \"message\"\n")
            .unwrap();
        assert_eq!(parsed.module.body.len(), 2);
    }

    #[test]
    fn test_parse_source_error_after_deep_expression() {
        let terms = vec!["1"; 1500].join(" + ");
        let source = format!("x = {terms}\ndef broken(:\n");
        let result = Parser::python().parse_source(&source);
        match result {
            Err(IngestError::Parse(message)) => assert!(message.contains("line 2")),
            other => panic!("expected parse error, got {:?}", other.map(|p| p.language)),
        }
    }

    #[test]
    fn test_parse_source_deep_expression_on_small_stack() {
        let terms = vec!["1"; 1500].join(" + ");
        let source = format!("x = {terms}\n");
        let handle = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(move || Parser::python().parse_source(&source).map(|p| p.module.body.len()))
            .unwrap();
        assert_eq!(handle.join().unwrap().unwrap(), 1);
    }

    #[test]
    fn test_parse_source_rejects_runaway_call_chain() {
        let source = format!("x = f(){}\n", ".h()".repeat(1000));
        let handle = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(move || Parser::python().parse_source(&source).map(|p| p.language))
            .unwrap();
        let result = handle.join().unwrap();
        assert!(matches!(result, Err(IngestError::Parse(msg)) if msg.contains("nesting")));
    }

    #[test]
    fn test_parse_file_reads_utf8() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all("name = 'café'\n".as_bytes()).unwrap();

        let parsed = Parser::python().parse_file(file.path()).unwrap();
        assert_eq!(parsed.module.body.len(), 1);
    }

    #[test]
    fn test_parse_file_rejects_invalid_utf8() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[b'x', b'=', 0xff, 0xfe, b'\n']).unwrap();

        let result = Parser::python().parse_file(file.path());
        assert!(matches!(result, Err(IngestError::Decode(_))));
    }

    #[test]
    fn test_parse_file_missing() {
        let result = Parser::python().parse_file(Path::new("/nonexistent/never.py"));
        assert!(matches!(result, Err(IngestError::Io(_))));
    }
}
