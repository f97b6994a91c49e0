//! Declaration visitor.
//!
//! One depth-first walk over a file's declaration tree. Functions, classes
//! and simple-assignment variables become symbols with structural edges;
//! imports and call sites are handed to their recorders as they are met.
//! The per-file name index is built along the way and returned once the
//! walk is done.
//!
//! A function written directly in a class body is declared twice: first as
//! a method of the class when the class is visited, then as a function of
//! the module when the walk reaches it.

use crate::error::Result;
use crate::facts::{EdgeKind, NameIndex, Range, Symbol, SymbolKind};
use crate::indexer::ast::{Assign, ClassDef, FunctionDef, Module, Node};
use crate::indexer::emitter::FactEmitter;
use crate::indexer::{calls, imports};

struct DeclarationVisitor<'v, 's> {
    file: &'v str,
    language: &'static str,
    module_id: &'v str,
    emitter: &'v mut FactEmitter<'s>,
    names: NameIndex,
}

/// Walks `module` once, emitting facts through `emitter`, and returns the
/// finished name index for `file`.
pub(crate) fn extract(
    module: &Module,
    module_id: &str,
    file: &str,
    language: &'static str,
    emitter: &mut FactEmitter<'_>,
) -> Result<NameIndex> {
    let mut visitor = DeclarationVisitor {
        file,
        language,
        module_id,
        emitter,
        names: NameIndex::new(file),
    };
    visitor.visit_all(&module.body)?;
    Ok(visitor.names)
}

impl DeclarationVisitor<'_, '_> {
    fn visit_all(&mut self, nodes: &[Node]) -> Result<()> {
        for node in nodes {
            self.visit(node)?;
        }
        Ok(())
    }

    fn visit(&mut self, node: &Node) -> Result<()> {
        match node {
            Node::FunctionDef(def) => self.visit_function(def),
            Node::ClassDef(def) => self.visit_class(def),
            Node::Assign(assign) => self.visit_assign(assign),
            Node::Import(import) => {
                imports::emit_import(self.emitter, import, self.module_id, self.language)
            }
            Node::ImportFrom(import) => {
                imports::emit_import_from(self.emitter, import, self.module_id, self.language)
            }
            Node::Call(call) => {
                calls::record_call(self.emitter, call, self.file, self.module_id)?;
                self.visit(&call.func)?;
                self.visit_all(&call.args)
            }
            Node::Attribute(attribute) => self.visit(&attribute.value),
            Node::Name(_) => Ok(()),
            Node::Other(children) => self.visit_all(children),
        }
    }

    fn visit_function(&mut self, def: &FunctionDef) -> Result<()> {
        let function = self.declare(SymbolKind::Function, &def.name, def.range);
        let id = function.id.clone();
        self.emitter.symbol(function.clone())?;
        self.emitter.edge(self.module_id, EdgeKind::Defines, &id)?;
        self.names.record(function);

        self.visit_all(&def.parameters)?;
        self.visit_all(&def.body)?;
        self.visit_all(&def.decorators)?;
        self.visit_all(&def.returns)
    }

    fn visit_class(&mut self, def: &ClassDef) -> Result<()> {
        let class = self.declare(SymbolKind::Class, &def.name, def.range);
        let class_id = class.id.clone();
        self.emitter.symbol(class)?;
        self.emitter.edge(self.module_id, EdgeKind::Defines, &class_id)?;

        for method in def.body.iter().filter_map(|node| match node {
            Node::FunctionDef(method) => Some(method),
            _ => None,
        }) {
            let symbol = self
                .declare(SymbolKind::Method, &method.name, method.range)
                .with_parent(&class_id);
            let id = symbol.id.clone();
            self.emitter.symbol(symbol.clone())?;
            self.emitter.edge(&class_id, EdgeKind::MemberOf, &id)?;
            self.names.record(symbol);
        }

        self.visit_all(&def.bases)?;
        self.visit_all(&def.body)?;
        self.visit_all(&def.decorators)
    }

    fn visit_assign(&mut self, assign: &Assign) -> Result<()> {
        if let Some(target) = assign.simple_target() {
            let variable = self.declare(SymbolKind::Variable, &target.id, target.range);
            let id = variable.id.clone();
            self.emitter.symbol(variable.clone())?;
            self.emitter.edge(self.module_id, EdgeKind::Defines, &id)?;
            self.names.record(variable);
        }

        self.visit_all(&assign.targets)?;
        if let Some(value) = &assign.value {
            self.visit(value)?;
        }
        Ok(())
    }

    fn declare(&self, kind: SymbolKind, name: &str, range: Range) -> Symbol {
        Symbol::declared(kind, name, self.file, range, self.language)
    }
}
