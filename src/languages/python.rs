use std::cell::Cell;

use tree_sitter::Node as TsNode;

use super::LanguageGrammar;
use crate::error::{IngestError, Result};
use crate::facts::{Position, Range};
use crate::indexer::ast::{
    Assign, Attribute, Call, ClassDef, FunctionDef, Import, ImportFrom, Module, Name, Node,
};

/// Deepest nesting of definitions, calls and assignments that is lowered.
/// Every other construct is flattened without recursion.
const MAX_NESTING: usize = 512;

pub struct PythonGrammar;

impl LanguageGrammar for PythonGrammar {
    fn name(&self) -> &'static str {
        "python"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["py"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_python::LANGUAGE.into()
    }

    /// Python 2 statements the grammar still parses. `print >> out, x` is
    /// kept: Python 3 reads it as a shift expression inside a tuple.
    fn rejects(&self, node: TsNode<'_>) -> bool {
        match node.kind() {
            "exec_statement" => true,
            "print_statement" => !named_children(node)
                .iter()
                .any(|child| child.kind() == "chevron"),
            _ => false,
        }
    }

    fn lower(&self, root: TsNode<'_>, source: &[u8]) -> Result<Module> {
        let lowerer = Lowerer {
            source,
            depth: Cell::new(0),
            too_deep: Cell::new(None),
        };
        let body = lowerer.children(root);

        match lowerer.too_deep.get() {
            Some(at) => Err(IngestError::Parse(format!(
                "nesting deeper than {} at line {}, column {}",
                MAX_NESTING, at.line, at.column
            ))),
            None => Ok(Module { body }),
        }
    }
}

fn named_children<'t>(node: TsNode<'t>) -> Vec<TsNode<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Node kinds that lower to their own [`Node`] variant
fn is_construct(kind: &str) -> bool {
    matches!(
        kind,
        "function_definition"
            | "class_definition"
            | "decorated_definition"
            | "assignment"
            | "import_statement"
            | "import_from_statement"
            | "future_import_statement"
            | "call"
            | "attribute"
            | "identifier"
    )
}

fn start_of(node: TsNode<'_>) -> Position {
    let start = node.start_position();
    Position::new(start.row as u32 + 1, start.column as u32 + 1)
}

/// Last descendant that is not a comment. Block nodes absorb trailing
/// comments, which must not widen a declaration's range.
fn last_token(node: TsNode<'_>) -> TsNode<'_> {
    let mut current = node;
    loop {
        let mut cursor = current.walk();
        let last = current
            .children(&mut cursor)
            .filter(|child| !child.is_extra())
            .last();
        match last {
            Some(child) => current = child,
            None => return current,
        }
    }
}

fn range_of(node: TsNode<'_>) -> Range {
    let last = last_token(node);
    let end = (last.end_byte() > node.start_byte()).then(|| {
        let end = last.end_position();
        Position::new(end.row as u32 + 1, end.column as u32)
    });
    Range::resolve(Some(start_of(node)), end)
}

struct Lowerer<'a> {
    source: &'a [u8],
    depth: Cell<usize>,
    too_deep: Cell<Option<Position>>,
}

impl<'a> Lowerer<'a> {
    fn text(&self, node: TsNode<'_>) -> &'a str {
        node.utf8_text(self.source).unwrap_or("")
    }

    fn lower(&self, node: TsNode<'_>) -> Option<Node> {
        if node.is_extra() {
            return None;
        }
        if !is_construct(node.kind()) {
            let lowered = self.flatten(node);
            return (!lowered.is_empty()).then_some(Node::Other(lowered));
        }

        if self.depth.get() >= MAX_NESTING {
            if self.too_deep.get().is_none() {
                self.too_deep.set(Some(start_of(node)));
            }
            return None;
        }
        self.depth.set(self.depth.get() + 1);
        let lowered = self.construct(node);
        self.depth.set(self.depth.get() - 1);

        Some(lowered)
    }

    fn construct(&self, node: TsNode<'_>) -> Node {
        match node.kind() {
            "function_definition" => Node::FunctionDef(self.function(node, Vec::new())),
            "class_definition" => Node::ClassDef(self.class(node, Vec::new())),
            "decorated_definition" => self.decorated(node),
            "assignment" => self.assignment(node),
            "import_statement" => Node::Import(self.import(node)),
            "import_from_statement" => Node::ImportFrom(self.import_from(node)),
            "future_import_statement" => Node::ImportFrom(ImportFrom {
                module: Some("__future__".to_string()),
                level: 0,
            }),
            "call" => self.call(node),
            "attribute" => self.attribute(node),
            "identifier" => Node::Name(self.name(node)),
            _ => Node::Other(self.flatten(node)),
        }
    }

    /// Constructs beneath `node`, in source order, found without recursing
    /// through the constructs that have no variant of their own.
    fn flatten(&self, node: TsNode<'_>) -> Vec<Node> {
        let mut lowered = Vec::new();
        let mut pending = named_children(node);
        pending.reverse();

        while let Some(child) = pending.pop() {
            if child.is_extra() {
                continue;
            }
            if is_construct(child.kind()) {
                lowered.extend(self.lower(child));
            } else {
                let mut grandchildren = named_children(child);
                grandchildren.reverse();
                pending.extend(grandchildren);
            }
        }

        lowered
    }

    /// One lowered node per direct child, keeping statement boundaries
    fn children(&self, node: TsNode<'_>) -> Vec<Node> {
        named_children(node)
            .into_iter()
            .filter_map(|child| self.lower(child))
            .collect()
    }

    fn children_except(&self, node: TsNode<'_>, skip: &[Option<TsNode<'_>>]) -> Vec<Node> {
        let skipped: Vec<usize> = skip.iter().flatten().map(|n| n.id()).collect();
        named_children(node)
            .into_iter()
            .filter(|child| !skipped.contains(&child.id()))
            .filter_map(|child| self.lower(child))
            .collect()
    }

    fn block(&self, node: Option<TsNode<'_>>) -> Vec<Node> {
        node.map(|body| self.children(body)).unwrap_or_default()
    }

    fn name(&self, node: TsNode<'_>) -> Name {
        Name {
            id: self.text(node).to_string(),
            range: range_of(node),
        }
    }

    fn function(&self, node: TsNode<'_>, decorators: Vec<Node>) -> FunctionDef {
        let name = node.child_by_field_name("name");
        let body = node.child_by_field_name("body");
        let returns = node.child_by_field_name("return_type");

        FunctionDef {
            name: name.map(|n| self.text(n).to_string()).unwrap_or_default(),
            range: range_of(node),
            decorators,
            parameters: self.children_except(node, &[name, body, returns]),
            body: self.block(body),
            returns: returns.and_then(|r| self.lower(r)).into_iter().collect(),
        }
    }

    fn class(&self, node: TsNode<'_>, decorators: Vec<Node>) -> ClassDef {
        let name = node.child_by_field_name("name");
        let body = node.child_by_field_name("body");

        ClassDef {
            name: name.map(|n| self.text(n).to_string()).unwrap_or_default(),
            range: range_of(node),
            decorators,
            bases: self.children_except(node, &[name, body]),
            body: self.block(body),
        }
    }

    fn decorated(&self, node: TsNode<'_>) -> Node {
        let decorators: Vec<Node> = named_children(node)
            .into_iter()
            .filter(|child| child.kind() == "decorator")
            .flat_map(|decorator| self.children(decorator))
            .collect();

        match node.child_by_field_name("definition") {
            Some(def) if def.kind() == "function_definition" => {
                Node::FunctionDef(self.function(def, decorators))
            }
            Some(def) if def.kind() == "class_definition" => {
                Node::ClassDef(self.class(def, decorators))
            }
            _ => Node::Other(self.flatten(node)),
        }
    }

    fn assignment(&self, node: TsNode<'_>) -> Node {
        // Annotated assignments are not simple assignments
        if node.child_by_field_name("type").is_some() {
            return Node::Other(self.flatten(node));
        }

        let mut targets = Vec::new();
        let mut current = node;
        loop {
            if let Some(left) = current.child_by_field_name("left") {
                targets.push(self.target(left).unwrap_or(Node::Other(Vec::new())));
            }
            match current.child_by_field_name("right") {
                Some(right)
                    if right.kind() == "assignment"
                        && right.child_by_field_name("type").is_none() =>
                {
                    current = right;
                }
                right => {
                    return Node::Assign(Assign {
                        targets,
                        value: right.and_then(|r| self.lower(r)).map(Box::new),
                    });
                }
            }
        }
    }

    /// `(x) = ...` binds `x` just like `x = ...`
    fn target(&self, node: TsNode<'_>) -> Option<Node> {
        if matches!(node.kind(), "parenthesized_expression" | "tuple_pattern") {
            let inner: Vec<TsNode<'_>> = named_children(node)
                .into_iter()
                .filter(|child| !child.is_extra())
                .collect();
            let mut cursor = node.walk();
            let has_comma = node.children(&mut cursor).any(|c| c.kind() == ",");
            if let [only] = inner.as_slice() {
                if only.kind() == "identifier" && !has_comma {
                    return Some(Node::Name(self.name(*only)));
                }
            }
        }
        self.lower(node)
    }

    fn dotted(&self, node: TsNode<'_>) -> String {
        if node.kind() != "dotted_name" {
            return self.text(node).to_string();
        }
        named_children(node)
            .into_iter()
            .filter(|child| child.kind() == "identifier")
            .map(|child| self.text(child))
            .collect::<Vec<_>>()
            .join(".")
    }

    fn import(&self, node: TsNode<'_>) -> Import {
        let mut cursor = node.walk();
        let names = node
            .children_by_field_name("name", &mut cursor)
            .filter_map(|child| match child.kind() {
                "aliased_import" => child.child_by_field_name("name").map(|n| self.dotted(n)),
                _ => Some(self.dotted(child)),
            })
            .filter(|name| !name.is_empty())
            .collect();

        Import { names }
    }

    fn import_from(&self, node: TsNode<'_>) -> ImportFrom {
        match node.child_by_field_name("module_name") {
            Some(module) if module.kind() == "relative_import" => {
                let mut level = 0;
                let mut name = None;
                let mut cursor = module.walk();
                for child in module.named_children(&mut cursor) {
                    match child.kind() {
                        "import_prefix" => {
                            level = self.text(child).chars().filter(|c| *c == '.').count();
                        }
                        "dotted_name" => name = Some(self.dotted(child)),
                        _ => {}
                    }
                }
                ImportFrom {
                    module: name,
                    level,
                }
            }
            Some(module) => ImportFrom {
                module: Some(self.dotted(module)),
                level: 0,
            },
            None => ImportFrom {
                module: None,
                level: 0,
            },
        }
    }

    fn call(&self, node: TsNode<'_>) -> Node {
        let func = node
            .child_by_field_name("function")
            .and_then(|f| self.lower(f))
            .unwrap_or(Node::Other(Vec::new()));
        let args = node
            .child_by_field_name("arguments")
            .map(|a| self.flatten(a))
            .unwrap_or_default();

        Node::Call(Call {
            func: Box::new(func),
            args,
        })
    }

    /// `a.b.c` keeps the trailing attribute and the base object only; the
    /// names in between never matter and the chain may be very long.
    fn attribute(&self, node: TsNode<'_>) -> Node {
        let Some(attr) = node.child_by_field_name("attribute") else {
            return Node::Other(self.flatten(node));
        };

        let mut base = node;
        while base.kind() == "attribute" {
            match base.child_by_field_name("object") {
                Some(object) => base = object,
                None => return Node::Other(self.flatten(node)),
            }
        }

        Node::Attribute(Attribute {
            value: Box::new(self.lower(base).unwrap_or(Node::Other(Vec::new()))),
            attr: self.text(attr).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lower_source(source: &str) -> Module {
        let grammar = PythonGrammar;
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(&grammar.language()).unwrap();
        let tree = parser.parse(source, None).unwrap();
        assert!(!tree.root_node().has_error(), "fixture must parse: {source}");
        grammar.lower(tree.root_node(), source.as_bytes()).unwrap()
    }

    fn parse(source: &str) -> tree_sitter::Tree {
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(&PythonGrammar.language()).unwrap();
        parser.parse(source, None).unwrap()
    }

    fn first_statement(tree: &tree_sitter::Tree) -> TsNode<'_> {
        tree.root_node().named_child(0).unwrap()
    }

    fn only(source: &str) -> Node {
        let mut module = lower_source(source);
        assert_eq!(module.body.len(), 1, "expected one statement in {source}");
        module.body.remove(0)
    }

    /// Unwraps the `expression_statement` wrapper around an expression
    fn expression(source: &str) -> Node {
        match only(source) {
            Node::Other(mut children) if children.len() == 1 => children.remove(0),
            other => other,
        }
    }

    #[test]
    fn test_lower_function_range() {
        let Node::FunctionDef(def) = only("def f():\n    pass\n") else {
            panic!("expected function");
        };
        assert_eq!(def.name, "f");
        assert_eq!(def.range, Range::new(1, 1, 2, 8));
    }

    #[test]
    fn test_lower_async_function() {
        let Node::FunctionDef(def) = only("async def fetch():\n    pass\n") else {
            panic!("expected function");
        };
        assert_eq!(def.name, "fetch");
        assert_eq!(def.range, Range::new(1, 1, 2, 8));
    }

    #[test]
    fn test_lower_decorated_function_starts_at_def() {
        let Node::FunctionDef(def) = only("@app.route('/')\ndef index():\n    pass\n") else {
            panic!("expected function");
        };
        assert_eq!(def.range.start_line, 2);
        assert_eq!(def.range.start_col, 1);
        assert_eq!(def.decorators.len(), 1);
        assert!(matches!(def.decorators[0], Node::Call(_)));
    }

    #[test]
    fn test_lower_class_body_keeps_methods_direct() {
        let Node::ClassDef(class) = only("class C(Base):\n    def m(self):\n        pass\n") else {
            panic!("expected class");
        };
        assert_eq!(class.name, "C");
        assert_eq!(class.bases.len(), 1);
        assert!(matches!(&class.body[0], Node::FunctionDef(m) if m.name == "m"));
    }

    #[test]
    fn test_lower_parameters_and_returns() {
        let Node::FunctionDef(def) = only("def f(a=g()) -> int:\n    return a\n") else {
            panic!("expected function");
        };
        assert_eq!(def.parameters.len(), 1);
        assert!(matches!(&def.returns[..], [Node::Other(r)] if matches!(&r[..], [Node::Name(n)] if n.id == "int")));
        assert_eq!(def.body.len(), 1);
    }

    #[test]
    fn test_lower_range_ends_before_trailing_comment() {
        let Node::FunctionDef(def) = only("def f():\n    x = 1  # trailing note\n") else {
            panic!("expected function");
        };
        assert_eq!(def.range, Range::new(1, 1, 2, 9));
    }

    #[test]
    fn test_lower_class_range_ignores_comment_lines() {
        let source = "class C:\n    def m(self):\n        pass\n    # done with C\n";
        let Node::ClassDef(class) = only(source) else {
            panic!("expected class");
        };
        assert_eq!(class.range, Range::new(1, 1, 3, 12));
        assert!(matches!(&class.body[0], Node::FunctionDef(m) if m.range == Range::new(2, 5, 3, 12)));
    }

    #[test]
    fn test_lower_long_operator_chain() {
        let terms = vec!["g()"; 1500].join(" + ");
        let source = format!("x = {terms}\n");
        let Node::Assign(assign) = expression(&source) else {
            panic!("expected assignment");
        };
        let Some(Node::Other(calls)) = assign.value.as_deref() else {
            panic!("expected flattened operands");
        };
        assert_eq!(calls.len(), 1500);
        assert!(calls.iter().all(|c| matches!(c, Node::Call(_))));
    }

    #[test]
    fn test_lower_long_attribute_chain() {
        let source = format!("a{}.c\n", ".b".repeat(2500));
        let Node::Attribute(attribute) = expression(&source) else {
            panic!("expected attribute");
        };
        assert_eq!(attribute.attr, "c");
        assert!(matches!(attribute.value.as_ref(), Node::Name(n) if n.id == "a"));
    }

    #[test]
    fn test_lower_rejects_excessive_nesting() {
        let source = format!("x = f(){}\n", ".h()".repeat(MAX_NESTING));
        let tree = parse(&source);
        assert!(!tree.root_node().has_error());
        let result = PythonGrammar.lower(tree.root_node(), source.as_bytes());
        assert!(matches!(result, Err(IngestError::Parse(msg)) if msg.contains("nesting")));
    }

    #[test]
    fn test_rejects_python2_print() {
        let tree = parse("print \"hello\"\n");
        assert!(PythonGrammar.rejects(first_statement(&tree)));
    }

    #[test]
    fn test_accepts_print_with_chevron() {
        let tree = parse("print >> sys.stderr, \"message\"\n");
        assert!(!tree.root_node().has_error());
        let statement = first_statement(&tree);
        assert!(!PythonGrammar.rejects(statement));
        assert!(!PythonGrammar.rejects(tree.root_node()));
    }

    #[test]
    fn test_lower_chained_assignment() {
        let Node::Assign(assign) = expression("a = b = compute()\n") else {
            panic!("expected assignment");
        };
        assert_eq!(assign.targets.len(), 2);
        assert_eq!(assign.simple_target().map(|n| n.id.as_str()), Some("a"));
        assert!(matches!(assign.value.as_deref(), Some(Node::Call(_))));
    }

    #[test]
    fn test_lower_annotated_assignment_is_not_assign() {
        assert!(!matches!(expression("x: int = 1\n"), Node::Assign(_)));
    }

    #[test]
    fn test_lower_tuple_target() {
        let Node::Assign(assign) = expression("a, b = 1, 2\n") else {
            panic!("expected assignment");
        };
        assert!(assign.simple_target().is_none());
    }

    #[test]
    fn test_lower_variable_range_is_identifier() {
        let Node::Assign(assign) = expression("value = 42\n") else {
            panic!("expected assignment");
        };
        let target = assign.simple_target().unwrap();
        assert_eq!(target.range, Range::new(1, 1, 1, 5));
    }

    #[test]
    fn test_lower_import_drops_aliases() {
        let Node::Import(import) = only("import os.path as p, sys\n") else {
            panic!("expected import");
        };
        assert_eq!(import.names, vec!["os.path".to_string(), "sys".to_string()]);
    }

    #[test]
    fn test_lower_relative_import() {
        let Node::ImportFrom(import) = only("from ..pkg.mod import x\n") else {
            panic!("expected from-import");
        };
        assert_eq!(import.module.as_deref(), Some("pkg.mod"));
        assert_eq!(import.level, 2);
    }

    #[test]
    fn test_lower_bare_relative_import() {
        let Node::ImportFrom(import) = only("from . import x\n") else {
            panic!("expected from-import");
        };
        assert_eq!(import.module, None);
        assert_eq!(import.level, 1);
    }

    #[test]
    fn test_lower_absolute_from_import() {
        let Node::ImportFrom(import) = only("from collections import OrderedDict\n") else {
            panic!("expected from-import");
        };
        assert_eq!(import.module.as_deref(), Some("collections"));
        assert_eq!(import.level, 0);
    }

    #[test]
    fn test_lower_future_import() {
        let Node::ImportFrom(import) = only("from __future__ import annotations\n") else {
            panic!("expected from-import");
        };
        assert_eq!(import.module.as_deref(), Some("__future__"));
    }

    #[test]
    fn test_lower_method_call() {
        let Node::Call(call) = expression("logger.info(message)\n") else {
            panic!("expected call");
        };
        assert!(matches!(call.func.as_ref(), Node::Attribute(a) if a.attr == "info"));
        assert_eq!(call.args.len(), 1);
    }

    #[test]
    fn test_lower_drops_comments() {
        let module = lower_source("# leading\nx = 1  # trailing\n");
        assert_eq!(module.body.len(), 1);
    }

    #[test]
    fn test_lower_empty_source() {
        assert!(lower_source("").body.is_empty());
    }
}
