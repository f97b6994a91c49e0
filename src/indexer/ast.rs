//! Declaration-level syntax tree.
//!
//! The concrete tree produced by tree-sitter is lowered once into these
//! owned types. Only the constructs the extractor dispatches on get their
//! own variant; everything else becomes a [`Node::Other`] holding the
//! recognised constructs found beneath it, flattened in source order. Calls
//! and definitions nested anywhere stay reachable by a single recursive
//! walk, while long operator chains do not turn into deep trees.

use crate::facts::Range;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Module {
    pub body: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    FunctionDef(FunctionDef),
    ClassDef(ClassDef),
    Assign(Assign),
    Import(Import),
    ImportFrom(ImportFrom),
    Call(Call),
    Name(Name),
    Attribute(Attribute),
    Other(Vec<Node>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub range: Range,
    pub decorators: Vec<Node>,
    /// Parameters (defaults and annotations) and type parameters
    pub parameters: Vec<Node>,
    pub body: Vec<Node>,
    /// Return annotation
    pub returns: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    pub range: Range,
    pub decorators: Vec<Node>,
    /// Base classes, keywords and type parameters
    pub bases: Vec<Node>,
    pub body: Vec<Node>,
}

/// A plain `=` assignment. Chained targets (`a = b = v`) are listed
/// left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    pub targets: Vec<Node>,
    pub value: Option<Box<Node>>,
}

impl Assign {
    /// The left-most target when it is a bare identifier
    pub fn simple_target(&self) -> Option<&Name> {
        match self.targets.first() {
            Some(Node::Name(name)) => Some(name),
            _ => None,
        }
    }
}

/// `import a.b as c, d`: the dotted module paths, aliases dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub names: Vec<String>,
}

/// `from ..pkg import x`: `module` is `pkg`, `level` counts the dots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFrom {
    pub module: Option<String>,
    pub level: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub func: Box<Node>,
    pub args: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    pub id: String,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub value: Box<Node>,
    pub attr: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(id: &str) -> Node {
        Node::Name(Name {
            id: id.to_string(),
            range: Range::new(1, 1, 1, 2),
        })
    }

    #[test]
    fn test_simple_target_takes_leftmost_name() {
        let assign = Assign {
            targets: vec![name("a"), name("b")],
            value: None,
        };
        assert_eq!(assign.simple_target().map(|n| n.id.as_str()), Some("a"));
    }

    #[test]
    fn test_simple_target_rejects_destructuring() {
        let assign = Assign {
            targets: vec![Node::Other(vec![name("a"), name("b")])],
            value: None,
        };
        assert!(assign.simple_target().is_none());
    }

    #[test]
    fn test_simple_target_rejects_attribute() {
        let assign = Assign {
            targets: vec![Node::Attribute(Attribute {
                value: Box::new(name("self")),
                attr: "x".to_string(),
            })],
            value: None,
        };
        assert!(assign.simple_target().is_none());
    }
}
