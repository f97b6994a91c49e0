use std::collections::HashMap;

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};

use crate::indexer::identity::stable_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Module,
    Function,
    Class,
    Method,
    Variable,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Module => "module",
            SymbolKind::Function => "function",
            SymbolKind::Class => "class",
            SymbolKind::Method => "method",
            SymbolKind::Variable => "variable",
        }
    }

    /// Whether symbols of this kind are listed in the per-file name index
    pub fn is_indexed(&self) -> bool {
        matches!(
            self,
            SymbolKind::Function | SymbolKind::Method | SymbolKind::Variable
        )
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved source position: 1-based line, column as reported on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Range {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Range {
    /// Fixed range used for file modules and pseudo-modules
    pub const FILE_START: Range = Range {
        start_line: 1,
        start_col: 1,
        end_line: 1,
        end_col: 1,
    };

    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Resolves possibly-absent positions once: a missing start becomes
    /// `(1,1)` and a missing end collapses onto the start.
    pub fn resolve(start: Option<Position>, end: Option<Position>) -> Self {
        let start = start.unwrap_or(Position::new(1, 1));
        let end = end.unwrap_or(start);
        Self::new(start.line, start.column, end.line, end.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symbol {
    pub id: String,
    pub kind: SymbolKind,
    pub name: String,
    pub file: String,
    pub range: Range,
    pub language: String,
    /// Owning class of a method. Lookup aid only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl Symbol {
    /// A declaration positioned in `file`; the id is keyed on
    /// `(kind, name, file, start line, start column)`.
    pub fn declared(
        kind: SymbolKind,
        name: impl Into<String>,
        file: impl Into<String>,
        range: Range,
        language: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let file = file.into();
        let id = stable_id(&[
            &kind,
            &name,
            &file,
            &range.start_line,
            &range.start_col,
        ]);

        Self {
            id,
            kind,
            name,
            file,
            range,
            language: language.into(),
            parent_id: None,
        }
    }

    /// The root symbol of an ingested file, named by its relative path
    pub fn module(file: impl Into<String>, language: impl Into<String>) -> Self {
        let file = file.into();
        let language = language.into();
        let id = stable_id(&[&SymbolKind::Module, &language, &file, &1, &1]);

        Self {
            id,
            kind: SymbolKind::Module,
            name: file.clone(),
            file,
            range: Range::FILE_START,
            language,
            parent_id: None,
        }
    }

    /// A module that is only known through an import specifier. The id
    /// depends on the specifier alone, so independent runs converge.
    pub fn pseudo_module(specifier: impl Into<String>, language: impl Into<String>) -> Self {
        let specifier = specifier.into();
        let id = stable_id(&[&SymbolKind::Module, &specifier, &specifier, &1, &1]);

        Self {
            id,
            kind: SymbolKind::Module,
            name: specifier.clone(),
            file: specifier,
            range: Range::FILE_START,
            language: language.into(),
            parent_id: None,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Defines,
    MemberOf,
    Import,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub src: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
    pub dst: String,
}

impl Edge {
    pub fn new(src: impl Into<String>, kind: EdgeKind, dst: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            kind,
            dst: dst.into(),
        }
    }
}

/// An unresolved call site. Carries the callee's name only, never a target id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFact {
    pub callee_name: String,
    pub file: String,
    pub mod_id: String,
}

/// Per-file mapping from declared name to every symbol declared under it,
/// in declaration order. Serializes `index` as a JSON object whose keys
/// keep first-declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameIndex {
    file: String,
    entries: Vec<(String, Vec<Symbol>)>,
    positions: HashMap<String, usize>,
}

impl NameIndex {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Appends `symbol` under its name. Kinds that are not indexed are ignored.
    pub(crate) fn record(&mut self, symbol: Symbol) {
        if !symbol.kind.is_indexed() {
            return;
        }
        match self.positions.get(&symbol.name) {
            Some(&slot) => self.entries[slot].1.push(symbol),
            None => {
                self.positions.insert(symbol.name.clone(), self.entries.len());
                self.entries.push((symbol.name.clone(), vec![symbol]));
            }
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn get(&self, name: &str) -> Option<&[Symbol]> {
        self.positions
            .get(name)
            .map(|&slot| self.entries[slot].1.as_slice())
    }

    /// Names in order of first declaration
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }
}

struct OrderedEntries<'a>(&'a [(String, Vec<Symbol>)]);

impl Serialize for OrderedEntries<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, symbols) in self.0 {
            map.serialize_entry(name, symbols)?;
        }
        map.end()
    }
}

impl Serialize for NameIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("NameIndex", 2)?;
        state.serialize_field("file", &self.file)?;
        state.serialize_field("index", &OrderedEntries(&self.entries))?;
        state.end()
    }
}

/// One self-describing record of the fact stream
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Fact {
    Symbol { symbol: Symbol },
    Edge { edge: Edge },
    Call(CallFact),
    NameIndex(NameIndex),
}

impl Fact {
    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Fact::Symbol { symbol } => Some(symbol),
            _ => None,
        }
    }

    pub fn as_edge(&self) -> Option<&Edge> {
        match self {
            Fact::Edge { edge } => Some(edge),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&CallFact> {
        match self {
            Fact::Call(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_name_index(&self) -> Option<&NameIndex> {
        match self {
            Fact::NameIndex(index) => Some(index),
            _ => None,
        }
    }
}
