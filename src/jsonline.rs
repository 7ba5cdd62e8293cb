//! Line-delimited JSON source and sink.
//!
//! One self-contained JSON object per line; blank lines are skipped on
//! read. Diagnostics carry the line number so malformed exports are easy
//! to locate.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use crate::pipeline::{Sink, Source};
use crate::value::{Record, record_from_json, record_to_json};

pub struct JsonLineSource<R> {
    reader: R,
    line: usize,
}

impl<R: BufRead> JsonLineSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, line: 0 }
    }
}

impl<R: BufRead> Source for JsonLineSource<R> {
    fn next(&mut self) -> Result<Option<Record>> {
        let mut buffer = String::new();
        loop {
            buffer.clear();
            self.line += 1;
            let read = self
                .reader
                .read_line(&mut buffer)
                .with_context(|| format!("read input line {}", self.line))?;
            if read == 0 {
                return Ok(None);
            }
            if buffer.trim().is_empty() {
                continue;
            }
            let parsed: serde_json::Value = serde_json::from_str(buffer.trim_end())
                .with_context(|| format!("parse input line {}", self.line))?;
            let record = record_from_json(parsed)
                .with_context(|| format!("input line {}", self.line))?;
            return Ok(Some(record));
        }
    }
}

pub struct JsonLineSink<W> {
    writer: W,
}

impl<W: Write> JsonLineSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> Sink for JsonLineSink<W> {
    fn process(&mut self, record: Record) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &record_to_json(&record))
            .context("write output record")?;
        self.writer.write_all(b"\n").context("write output record")?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.writer.flush().context("flush output")
    }
}
