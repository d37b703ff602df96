//! Input and output channels owned by the driver of an execution
//!
//! `PRINT`/`PRINTERR` write through an [`OutputSink`]; the default
//! [`OutputBuffer`] simply accumulates text until the driver takes it.
//! `READ` pulls characters from an [`InputChannel`], a queue the driver
//! refills between steps.

use std::collections::VecDeque;
use std::io::Write;
use tracing::warn;

/// Destination of program output
pub trait OutputSink {
    fn write_str(&mut self, text: &str);

    /// Called by `FLUSH`/`FLUSHERR`
    fn flush(&mut self) {}
}

/// In-memory sink; output is kept until [`OutputBuffer::take`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputBuffer {
    text: String,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Everything written since the last take
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.text)
    }
}

impl OutputSink for OutputBuffer {
    fn write_str(&mut self, text: &str) {
        self.text.push_str(text);
    }
}

/// Sink forwarding to an `io::Write`, used to stream to process stdout/stderr
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputSink for WriterSink<W> {
    fn write_str(&mut self, text: &str) {
        if let Err(err) = self.writer.write_all(text.as_bytes()) {
            warn!(%err, "program output lost");
        }
    }

    fn flush(&mut self) {
        if let Err(err) = self.writer.flush() {
            warn!(%err, "flush failed");
        }
    }
}

/// Characters waiting to be consumed by `READ`
///
/// An exhausted channel will never receive more input: a `READ` that runs
/// dry fails instead of suspending.
#[derive(Debug, Clone, Default)]
pub struct InputChannel {
    queue: VecDeque<char>,
    exhausted: bool,
}

impl InputChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_str(&mut self, text: &str) {
        self.queue.extend(text.chars());
    }

    pub fn pop(&mut self) -> Option<char> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn set_exhausted(&mut self, exhausted: bool) {
        self.exhausted = exhausted;
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_take_resets() {
        let mut buffer = OutputBuffer::new();
        buffer.write_str("ab");
        buffer.write_str("c");
        assert_eq!(buffer.take(), "abc");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_writer_sink_forwards_bytes() {
        let mut sink = WriterSink::new(Vec::new());
        sink.write_str("hi");
        sink.flush();
        assert_eq!(sink.writer, b"hi");
    }

    #[test]
    fn test_input_is_fifo() {
        let mut input = InputChannel::new();
        input.push_str("01");
        input.push_str("x");
        assert_eq!(input.pop(), Some('0'));
        assert_eq!(input.pop(), Some('1'));
        assert_eq!(input.pop(), Some('x'));
        assert_eq!(input.pop(), None);
        assert!(!input.is_exhausted());
    }
}
