use std::io;

/// Destination for formatted log lines.
///
/// Implementations transport complete lines to a concrete destination
/// (console, file, socket, an in-memory capture in tests). The handler
/// calls `write_line` exactly once per handled record, under the family
/// write lock, with the fully assembled line including its trailing
/// newline.
pub trait LogSink: Send {
    /// Write one complete line to the underlying destination.
    ///
    /// **Parameters**
    /// - `line`: the assembled line bytes, newline included.
    ///
    /// **Returns**
    /// - `Ok(())` if the destination accepted the line.
    /// - `Err(..)` if the write failed. The handler surfaces the failure
    ///   to its caller and never retries.
    fn write_line(&mut self, line: &[u8]) -> io::Result<()>;

    /// Flush any buffering the destination performs.
    ///
    /// Default implementation is a no-op.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Adapter exposing any [`io::Write`] as a [`LogSink`].
pub struct WriterSink<W> {
    inner: W,
}

impl<W: io::Write + Send> WriterSink<W> {
    pub fn new(inner: W) -> Self {
        WriterSink { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: io::Write + Send> LogSink for WriterSink<W> {
    fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        self.inner.write_all(line)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
