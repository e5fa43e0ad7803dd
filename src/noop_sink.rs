use crate::sink::LogSink;
use std::io;

/// A sink that simply drops all lines.
///
/// Useful for measuring the cost of formatting itself without any I/O,
/// and for unit tests that don't care about output.
#[derive(Clone, Default)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn write_line(&mut self, _line: &[u8]) -> io::Result<()> {
        Ok(())
    }
}
