//! Instruction sinks
//!
//! A [`Sink`] receives the rendered program one line at a time, in order.
//! File and stream handling stay on the sink side.

use std::io::{self, Write};

/// Line-oriented output for a rendered NC program
pub trait Sink {
    /// Write one line (without trailing newline)
    fn write_line(&mut self, line: &str) -> io::Result<()>;

    /// Flush buffered output. Called once after the last line.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Sink for Vec<String> {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.push(line.to_string());
        Ok(())
    }
}

/// Sink writing newline-terminated lines to any `Write`
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    writer: W,
    lines_written: usize,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            lines_written: 0,
        }
    }

    pub fn lines_written(&self) -> usize {
        self.lines_written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Sink for WriterSink<W> {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.lines_written += 1;
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
