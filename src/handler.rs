use std::sync::Arc;

use parking_lot::Mutex;

use crate::buffer::BufferPool;
use crate::encode::TextEncoder;
use crate::record::{Level, LogRecord};
use crate::sink::LogSink;
use crate::value::Attr;

/// Per-leaf replacement hook: receives the group path of the leaf and the
/// leaf itself, and returns the attribute to encode in its place. Returning
/// [`Attr::empty`] drops the leaf from the line.
pub type ReplaceAttrFn = dyn Fn(&[String], Attr) -> Attr + Send + Sync;

/// Default timestamp layout: RFC 3339 with a numeric offset.
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Formatting options, fixed at handler construction and shared by every
/// handler derived from the same root.
///
/// **Fields**
/// - `level`: minimum severity a record must have to be formatted.
/// - `replace_attr`: optional hook applied once per leaf attribute of each
///   `handle` call, before encoding. Not applied to attributes pre-rendered
///   by [`TextHandler::with_attrs`].
/// - `time_format`: `chrono` strftime layout for the line timestamp.
/// - `disable_*`: independently turn off color styling, severity glyphs,
///   the timestamp and the severity tag. The message is always emitted.
#[derive(Clone)]
pub struct HandlerOptions {
    pub level: Level,
    pub replace_attr: Option<Arc<ReplaceAttrFn>>,
    pub time_format: String,
    pub disable_color: bool,
    pub disable_emoji: bool,
    pub disable_time: bool,
    pub disable_level: bool,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        HandlerOptions {
            level: Level::Info,
            replace_attr: None,
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            disable_color: false,
            disable_emoji: false,
            disable_time: false,
            disable_level: false,
        }
    }
}

/// Error returned by [`TextHandler::handle`] when the sink rejects the
/// assembled line. Surfaced directly; never retried, never logged.
#[derive(Debug, thiserror::Error)]
#[error("failed to write log line: {0}")]
pub struct WriteError(#[from] pub std::io::Error);

/// Formats [`LogRecord`]s into single text lines and writes them to a
/// shared sink.
///
/// Handlers are values: [`with_attrs`](Self::with_attrs) and
/// [`with_group`](Self::with_group) return new handlers carrying extended
/// context and never mutate the source. Every handler derived from the same
/// root shares exactly one sink, one write lock and one buffer pool, so
/// concurrent `handle` calls through any member of the family produce
/// complete, non-interleaved lines.
#[derive(Clone)]
pub struct TextHandler {
    en: TextEncoder,
    attr_prefix: Vec<u8>,
    groups: Vec<String>,
    out: Arc<Mutex<Box<dyn LogSink>>>,
    pool: BufferPool,
}

impl TextHandler {
    /// New root handler writing to `sink` with a private buffer pool.
    pub fn new(sink: impl LogSink + 'static, opts: HandlerOptions) -> Self {
        Self::with_pool(sink, opts, BufferPool::new())
    }

    /// New root handler drawing line buffers from a caller-supplied pool,
    /// for embedders that want one pool across several handler families.
    pub fn with_pool(sink: impl LogSink + 'static, opts: HandlerOptions, pool: BufferPool) -> Self {
        TextHandler {
            en: TextEncoder::new(opts),
            attr_prefix: Vec::new(),
            groups: Vec::new(),
            out: Arc::new(Mutex::new(Box::new(sink))),
            pool,
        }
    }

    pub fn options(&self) -> &HandlerOptions {
        &self.en.opts
    }

    /// Whether a record at `level` would be formatted. Pure, no I/O.
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.en.opts.level
    }

    /// Derive a handler whose lines carry `attrs` as pre-rendered context.
    ///
    /// The attributes are rendered once, qualified by the current group
    /// path and with no replacement hook, and appended after any prefix
    /// inherited from earlier derivations. An empty list yields a handler
    /// behaviorally identical to this one.
    pub fn with_attrs(&self, attrs: Vec<Attr>) -> TextHandler {
        let mut buf = self.pool.acquire();
        let mut groups = self.groups.clone();
        for attr in &attrs {
            self.en.write_attr(&mut buf, &mut groups, attr);
        }

        let mut attr_prefix = self.attr_prefix.clone();
        attr_prefix.extend_from_slice(buf.as_bytes());

        TextHandler {
            en: self.en.clone(),
            attr_prefix,
            groups: self.groups.clone(),
            out: Arc::clone(&self.out),
            pool: self.pool.clone(),
        }
    }

    /// Derive a handler whose per-call attribute keys are qualified by one
    /// more group name. Prefix, sink, lock and pool are unchanged.
    pub fn with_group(&self, name: impl Into<String>) -> TextHandler {
        let mut groups = Vec::with_capacity(self.groups.len() + 1);
        groups.extend_from_slice(&self.groups);
        groups.push(name.into());

        TextHandler {
            en: self.en.clone(),
            attr_prefix: self.attr_prefix.clone(),
            groups,
            out: Arc::clone(&self.out),
            pool: self.pool.clone(),
        }
    }

    /// Format `record` into one line and write it to the sink.
    ///
    /// Records below the configured threshold are dropped without I/O.
    /// The line is assembled in a pooled buffer, the family lock is held
    /// for exactly one sink write, and the buffer returns to the pool on
    /// every exit path.
    pub fn handle(&self, record: &LogRecord) -> Result<(), WriteError> {
        if !self.enabled(record.level) {
            return Ok(());
        }

        let mut buf = self.pool.acquire();

        self.en.write_emoji_level(&mut buf, record.level);
        self.en.write_time(&mut buf, record.timestamp);
        self.en.write_level(&mut buf, record.level);
        self.en.write_message(&mut buf, &record.message);

        if !self.attr_prefix.is_empty() {
            buf.write(&self.attr_prefix);
        }

        if !record.attrs.is_empty() {
            let hook = self.en.opts.replace_attr.as_deref();
            let mut groups = self.groups.clone();
            for attr in &record.attrs {
                self.en.write_attr_with(&mut buf, &mut groups, attr, hook);
            }
        }

        self.en.write_newline(&mut buf);

        let mut out = self.out.lock();
        out.write_line(buf.as_bytes())?;
        Ok(())
    }
}
