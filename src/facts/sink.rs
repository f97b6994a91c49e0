use std::io::Write;

use crate::error::Result;
use crate::facts::Fact;

/// Destination of the fact stream. Facts arrive one at a time, in emission
/// order, and are never retracted.
pub trait FactSink {
    fn emit(&mut self, fact: Fact) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl FactSink for Vec<Fact> {
    fn emit(&mut self, fact: Fact) -> Result<()> {
        self.push(fact);
        Ok(())
    }
}

/// Writes each fact as one JSON object followed by a newline
pub struct NdjsonSink<W: Write> {
    writer: W,
    written: u64,
}

impl<W: Write> NdjsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Number of records written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> FactSink for NdjsonSink<W> {
    fn emit(&mut self, fact: Fact) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &fact)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
