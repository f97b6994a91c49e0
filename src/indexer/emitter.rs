use crate::error::Result;
use crate::facts::{CallFact, Edge, EdgeKind, Fact, FactSink, NameIndex, Symbol};

/// Facts emitted for one file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileSummary {
    pub symbols: usize,
    pub edges: usize,
    pub calls: usize,
}

/// Typed front door to a [`FactSink`] for one file's pass
pub(crate) struct FactEmitter<'s> {
    sink: &'s mut dyn FactSink,
    summary: FileSummary,
}

impl<'s> FactEmitter<'s> {
    pub(crate) fn new(sink: &'s mut dyn FactSink) -> Self {
        Self {
            sink,
            summary: FileSummary::default(),
        }
    }

    pub(crate) fn symbol(&mut self, symbol: Symbol) -> Result<()> {
        self.summary.symbols += 1;
        self.sink.emit(Fact::Symbol { symbol })
    }

    pub(crate) fn edge(&mut self, src: &str, kind: EdgeKind, dst: &str) -> Result<()> {
        self.summary.edges += 1;
        self.sink.emit(Fact::Edge {
            edge: Edge::new(src, kind, dst),
        })
    }

    pub(crate) fn call(&mut self, callee_name: &str, file: &str, mod_id: &str) -> Result<()> {
        self.summary.calls += 1;
        self.sink.emit(Fact::Call(CallFact {
            callee_name: callee_name.to_string(),
            file: file.to_string(),
            mod_id: mod_id.to_string(),
        }))
    }

    pub(crate) fn name_index(&mut self, index: NameIndex) -> Result<()> {
        self.sink.emit(Fact::NameIndex(index))
    }

    pub(crate) fn finish(self) -> FileSummary {
        self.summary
    }
}
