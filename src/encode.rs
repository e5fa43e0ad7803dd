use std::fmt::Write as _;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::buffer::Buffer;
use crate::handler::{HandlerOptions, ReplaceAttrFn};
use crate::record::Level;
use crate::value::{AnyValue, Attr, Shape, Value};

pub(crate) const TXT_GRAY: &str = "\x1b[90m";
pub(crate) const TXT_RED: &str = "\x1b[31m";
pub(crate) const TXT_GREEN: &str = "\x1b[32m";
pub(crate) const TXT_YELLOW: &str = "\x1b[33m";
pub(crate) const TXT_CYAN: &str = "\x1b[36m";
pub(crate) const TXT_BOLD: &str = "\x1b[1m";
pub(crate) const TXT_RESET: &str = "\x1b[0m";

/// Renders records into a [`Buffer`]: one line per record, styled per the
/// handler options. Stateless aside from the options it was built with.
#[derive(Clone)]
pub(crate) struct TextEncoder {
    pub(crate) opts: HandlerOptions,
}

impl TextEncoder {
    pub(crate) fn new(opts: HandlerOptions) -> Self {
        TextEncoder { opts }
    }

    pub(crate) fn style(&self, buf: &mut Buffer, color: &str) {
        if self.opts.disable_color {
            return;
        }
        buf.write_str(color);
    }

    pub(crate) fn reset(&self, buf: &mut Buffer) {
        if self.opts.disable_color {
            return;
        }
        buf.write_str(TXT_RESET);
    }

    pub(crate) fn write_emoji_level(&self, buf: &mut Buffer, level: Level) {
        if self.opts.disable_emoji {
            return;
        }

        match level {
            Level::Error => buf.write_str("\u{274c} "),
            Level::Warn => buf.write_str("\u{26a0}\u{fe0f}  "),
            Level::Info => buf.write_str("\u{1f331} "),
            Level::Debug => buf.write_str("\u{1f41b} "),
        }
    }

    pub(crate) fn write_time(&self, buf: &mut Buffer, t: DateTime<Utc>) {
        if self.opts.disable_time {
            return;
        }

        self.style(buf, TXT_GRAY);
        let _ = write!(buf, "{}", t.format(&self.opts.time_format));
        self.reset(buf);
        buf.write_byte(b' ');
    }

    pub(crate) fn write_level(&self, buf: &mut Buffer, level: Level) {
        if self.opts.disable_level {
            return;
        }

        match level {
            Level::Error => {
                self.style(buf, TXT_RED);
                buf.write_str("ERR ");
                self.reset(buf);
            }
            Level::Warn => {
                self.style(buf, TXT_YELLOW);
                buf.write_str("WRN ");
                self.reset(buf);
            }
            Level::Info => {
                self.style(buf, TXT_GREEN);
                buf.write_str("INF ");
                self.reset(buf);
            }
            Level::Debug => buf.write_str("DBG "),
        }
    }

    pub(crate) fn write_message(&self, buf: &mut Buffer, msg: &str) {
        self.style(buf, TXT_BOLD);
        self.write_string(buf, msg);
        self.reset(buf);
        self.write_space(buf);
    }

    /// Write one attribute, qualifying its key with the current group path.
    /// Groups contribute path segments only and emit no token of their own;
    /// the empty sentinel emits nothing.
    pub(crate) fn write_attr(&self, buf: &mut Buffer, groups: &mut Vec<String>, attr: &Attr) {
        self.write_attr_with(buf, groups, attr, None);
    }

    /// Same as [`write_attr`](Self::write_attr), with a replacement hook
    /// applied once per leaf before encoding. The hook may substitute an
    /// entirely different attribute; a substituted group is walked without
    /// re-applying the hook, and the empty sentinel drops the leaf.
    pub(crate) fn write_attr_with(
        &self,
        buf: &mut Buffer,
        groups: &mut Vec<String>,
        attr: &Attr,
        hook: Option<&ReplaceAttrFn>,
    ) {
        if attr.is_empty() {
            return;
        }

        if let Value::Group(children) = &attr.value {
            groups.push(attr.key.clone());
            for child in children {
                self.write_attr_with(buf, groups, child, hook);
            }
            groups.pop();
            return;
        }

        let replaced;
        let attr = match hook {
            Some(replace) => {
                replaced = replace(groups, attr.clone());
                if replaced.is_empty() {
                    return;
                }
                &replaced
            }
            None => attr,
        };

        if matches!(attr.value, Value::Group(_)) {
            self.write_attr_with(buf, groups, attr, None);
            return;
        }

        self.write_key(buf, groups, &attr.key);
        self.write_value(buf, &attr.value);
    }

    pub(crate) fn write_key(&self, buf: &mut Buffer, groups: &[String], key: &str) {
        self.style(buf, TXT_CYAN);
        for group in groups {
            buf.write_str(group);
            buf.write_byte(b'.');
        }

        buf.write_str(key);
        self.style(buf, TXT_GRAY);
        buf.write_byte(b'=');
        self.reset(buf);
    }

    pub(crate) fn write_value(&self, buf: &mut Buffer, val: &Value) {
        match val {
            Value::Bool(b) => self.write_bool(buf, *b),
            Value::Int64(i) => self.write_int(buf, *i),
            Value::Uint64(u) => self.write_uint(buf, *u, 10),
            Value::Float64(f) => self.write_float(buf, *f),
            Value::String(s) => self.write_string(buf, s),
            Value::Time(t) => self.write_time_rfc3339(buf, t),
            Value::Duration(d) => self.write_duration(buf, *d),
            Value::Any(v) => self.write_any(buf, v.as_ref()),
            // Groups are resolved by write_attr and never reach here.
            Value::Group(_) => {}
        }
        self.write_space(buf);
    }

    /// Fallback ladder for values outside the known kinds: custom text
    /// first, then primitive, record, sequence, mapping and reference
    /// shapes, ending at `nil`. Every shape produces some text; there is
    /// no failure path.
    pub(crate) fn write_any(&self, buf: &mut Buffer, val: &dyn AnyValue) {
        if let Some(text) = val.as_text() {
            buf.write_str(&text);
            return;
        }

        match val.shape() {
            Shape::Bool(b) => self.write_bool(buf, b),
            Shape::Int(i) => self.write_int(buf, i),
            Shape::Uint(u) => self.write_uint(buf, u, 10),
            Shape::Float(f) => self.write_float(buf, f),
            Shape::Str(s) => self.write_string(buf, s),
            Shape::Struct(fields) => {
                buf.write_byte(b'{');
                for (i, (name, field)) in fields.iter().enumerate() {
                    if i > 0 {
                        self.write_space(buf);
                    }
                    buf.write_str(name);
                    buf.write_byte(b':');
                    self.write_any(buf, *field);
                }
                buf.write_byte(b'}');
            }
            Shape::Seq(items) => {
                buf.write_byte(b'[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.write_space(buf);
                    }
                    self.write_any(buf, *item);
                }
                buf.write_byte(b']');
            }
            Shape::Map(pairs) => {
                buf.write_byte(b'[');
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        self.write_space(buf);
                    }
                    self.write_any(buf, *key);
                    buf.write_byte(b':');
                    self.write_any(buf, *value);
                }
                buf.write_byte(b']');
            }
            Shape::Ref(None) => buf.write_str("nil"),
            Shape::Ref(Some(target)) => {
                buf.write_str("0x");
                let identity = target as *const dyn AnyValue as *const () as usize;
                self.write_uint(buf, identity as u64, 16);
            }
            Shape::Nil => buf.write_str("nil"),
        }
    }

    pub(crate) fn write_newline(&self, buf: &mut Buffer) {
        buf.write_byte(b'\n');
    }

    pub(crate) fn write_space(&self, buf: &mut Buffer) {
        buf.write_byte(b' ');
    }

    // Quotes are literal: embedded quote and control characters pass
    // through verbatim.
    pub(crate) fn write_string(&self, buf: &mut Buffer, s: &str) {
        buf.write_byte(b'"');
        buf.write_str(s);
        buf.write_byte(b'"');
    }

    pub(crate) fn write_bool(&self, buf: &mut Buffer, b: bool) {
        if b {
            buf.write_str("true");
        } else {
            buf.write_str("false");
        }
    }

    pub(crate) fn write_int(&self, buf: &mut Buffer, i: i64) {
        let _ = write!(buf, "{}", i);
    }

    pub(crate) fn write_uint(&self, buf: &mut Buffer, u: u64, base: u32) {
        if base == 16 {
            let _ = write!(buf, "{:x}", u);
        } else {
            let _ = write!(buf, "{}", u);
        }
    }

    pub(crate) fn write_float(&self, buf: &mut Buffer, f: f64) {
        let _ = write!(buf, "{}", f);
    }

    pub(crate) fn write_duration(&self, buf: &mut Buffer, d: std::time::Duration) {
        let _ = write!(buf, "{}", d.as_nanos());
    }

    pub(crate) fn write_time_rfc3339(&self, buf: &mut Buffer, t: &DateTime<chrono::FixedOffset>) {
        buf.write_str(&t.to_rfc3339_opts(SecondsFormat::Millis, true));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferPool;
    use chrono::TimeZone;
    use std::time::Duration;

    fn encoder(opts: HandlerOptions) -> TextEncoder {
        TextEncoder::new(opts)
    }

    fn plain() -> TextEncoder {
        encoder(HandlerOptions {
            disable_color: true,
            ..HandlerOptions::default()
        })
    }

    fn styled() -> TextEncoder {
        encoder(HandlerOptions::default())
    }

    fn contents(buf: &Buffer) -> &str {
        std::str::from_utf8(buf.as_bytes()).unwrap()
    }

    struct Endpoint {
        host: String,
        port: u16,
    }

    impl AnyValue for Endpoint {
        fn shape(&self) -> Shape<'_> {
            Shape::Struct(vec![("host", &self.host), ("port", &self.port)])
        }
    }

    struct RequestId(u64);

    impl AnyValue for RequestId {
        fn as_text(&self) -> Option<String> {
            Some(format!("req-{}", self.0))
        }

        fn shape(&self) -> Shape<'_> {
            Shape::Uint(self.0)
        }
    }

    #[test]
    fn style_and_reset_respect_color_toggle() {
        let pool = BufferPool::new();

        let mut buf = pool.acquire();
        let en = styled();
        en.style(&mut buf, TXT_RED);
        en.reset(&mut buf);
        assert_eq!(contents(&buf), format!("{TXT_RED}{TXT_RESET}"));

        let mut buf = pool.acquire();
        let en = plain();
        en.style(&mut buf, TXT_RED);
        en.reset(&mut buf);
        assert_eq!(contents(&buf), "");
    }

    #[test]
    fn emoji_per_level() {
        let pool = BufferPool::new();
        let en = styled();
        for (level, glyph) in [
            (Level::Error, "\u{274c} "),
            (Level::Warn, "\u{26a0}\u{fe0f}  "),
            (Level::Info, "\u{1f331} "),
            (Level::Debug, "\u{1f41b} "),
        ] {
            let mut buf = pool.acquire();
            en.write_emoji_level(&mut buf, level);
            assert_eq!(contents(&buf), glyph);
        }

        let mut buf = pool.acquire();
        let en = encoder(HandlerOptions {
            disable_emoji: true,
            ..HandlerOptions::default()
        });
        en.write_emoji_level(&mut buf, Level::Error);
        assert!(buf.is_empty());
    }

    #[test]
    fn time_uses_configured_layout() {
        let pool = BufferPool::new();
        let t = chrono::Utc.with_ymd_and_hms(2023, 10, 1, 12, 0, 0).unwrap();

        let mut buf = pool.acquire();
        let en = encoder(HandlerOptions {
            time_format: "%Y-%m-%d %H:%M:%S".to_string(),
            ..HandlerOptions::default()
        });
        en.write_time(&mut buf, t);
        assert_eq!(
            contents(&buf),
            format!("{TXT_GRAY}2023-10-01 12:00:00{TXT_RESET} ")
        );

        let mut buf = pool.acquire();
        let en = encoder(HandlerOptions {
            disable_time: true,
            ..HandlerOptions::default()
        });
        en.write_time(&mut buf, t);
        assert!(buf.is_empty());
    }

    #[test]
    fn level_tags_are_styled_per_severity() {
        let pool = BufferPool::new();
        let en = styled();
        for (level, expected) in [
            (Level::Error, format!("{TXT_RED}ERR {TXT_RESET}")),
            (Level::Warn, format!("{TXT_YELLOW}WRN {TXT_RESET}")),
            (Level::Info, format!("{TXT_GREEN}INF {TXT_RESET}")),
            (Level::Debug, "DBG ".to_string()),
        ] {
            let mut buf = pool.acquire();
            en.write_level(&mut buf, level);
            assert_eq!(contents(&buf), expected);
        }

        let mut buf = pool.acquire();
        let en = encoder(HandlerOptions {
            disable_level: true,
            ..HandlerOptions::default()
        });
        en.write_level(&mut buf, Level::Error);
        assert!(buf.is_empty());
    }

    #[test]
    fn message_is_quoted_and_bold() {
        let pool = BufferPool::new();
        let mut buf = pool.acquire();
        styled().write_message(&mut buf, "This is a test message");
        assert_eq!(
            contents(&buf),
            format!("{TXT_BOLD}\"This is a test message\"{TXT_RESET} ")
        );
    }

    #[test]
    fn primitive_values() {
        let pool = BufferPool::new();
        let en = plain();

        let mut buf = pool.acquire();
        en.write_bool(&mut buf, true);
        en.write_bool(&mut buf, false);
        assert_eq!(contents(&buf), "truefalse");

        let mut buf = pool.acquire();
        en.write_int(&mut buf, -42);
        en.write_uint(&mut buf, 42, 10);
        en.write_uint(&mut buf, 255, 16);
        assert_eq!(contents(&buf), "-4242ff");

        let mut buf = pool.acquire();
        en.write_float(&mut buf, 3.14);
        assert_eq!(contents(&buf), "3.14");

        let mut buf = pool.acquire();
        en.write_string(&mut buf, "Hello, World!");
        assert_eq!(contents(&buf), "\"Hello, World!\"");

        let mut buf = pool.acquire();
        en.write_duration(&mut buf, Duration::from_secs(5));
        assert_eq!(contents(&buf), "5000000000");
    }

    #[test]
    fn time_value_uses_millisecond_rfc3339() {
        let pool = BufferPool::new();
        let mut buf = pool.acquire();
        let t = chrono::Utc
            .with_ymd_and_hms(2023, 10, 1, 12, 0, 0)
            .unwrap()
            .fixed_offset();
        plain().write_time_rfc3339(&mut buf, &t);
        assert_eq!(contents(&buf), "2023-10-01T12:00:00.000Z");
    }

    #[test]
    fn value_encoding_appends_separator() {
        let pool = BufferPool::new();
        let en = plain();
        let mut buf = pool.acquire();
        en.write_value(&mut buf, &Value::Int64(42));
        assert_eq!(contents(&buf), "42 ");
    }

    #[test]
    fn deterministic_for_identical_input() {
        let pool = BufferPool::new();
        let en = plain();
        let value = Value::Float64(1.5e300);

        let mut first = pool.acquire();
        en.write_value(&mut first, &value);
        let mut second = pool.acquire();
        en.write_value(&mut second, &value);
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn any_stringer_takes_precedence() {
        let pool = BufferPool::new();
        let mut buf = pool.acquire();
        plain().write_any(&mut buf, &RequestId(7));
        assert_eq!(contents(&buf), "req-7");
    }

    #[test]
    fn any_primitive_shapes() {
        let pool = BufferPool::new();
        let en = plain();

        let mut buf = pool.acquire();
        en.write_any(&mut buf, &true);
        assert_eq!(contents(&buf), "true");

        let mut buf = pool.acquire();
        en.write_any(&mut buf, &42_i32);
        assert_eq!(contents(&buf), "42");

        let mut buf = pool.acquire();
        en.write_any(&mut buf, &42_usize);
        assert_eq!(contents(&buf), "42");

        let mut buf = pool.acquire();
        en.write_any(&mut buf, &3.14_f64);
        assert_eq!(contents(&buf), "3.14");

        let mut buf = pool.acquire();
        en.write_any(&mut buf, &"Hello, World!");
        assert_eq!(contents(&buf), "\"Hello, World!\"");
    }

    #[test]
    fn any_struct_shape() {
        let pool = BufferPool::new();
        let mut buf = pool.acquire();
        let endpoint = Endpoint {
            host: "db1".to_string(),
            port: 5432,
        };
        plain().write_any(&mut buf, &endpoint);
        assert_eq!(contents(&buf), "{host:\"db1\" port:5432}");
    }

    #[test]
    fn any_sequence_shape() {
        let pool = BufferPool::new();
        let mut buf = pool.acquire();
        let items = vec![1_i64, 2, 3];
        plain().write_any(&mut buf, &items);
        assert_eq!(contents(&buf), "[1 2 3]");
    }

    #[test]
    fn any_map_shape() {
        let pool = BufferPool::new();
        let mut buf = pool.acquire();
        let mut map = std::collections::BTreeMap::new();
        map.insert("key1".to_string(), "value1".to_string());
        map.insert("key2".to_string(), "value2".to_string());
        plain().write_any(&mut buf, &map);
        assert_eq!(contents(&buf), "[\"key1\":\"value1\" \"key2\":\"value2\"]");
    }

    #[test]
    fn any_reference_shapes() {
        let pool = BufferPool::new();
        let en = plain();

        let mut buf = pool.acquire();
        en.write_any(&mut buf, &Box::new(42_i64));
        let text = contents(&buf).to_string();
        assert!(text.starts_with("0x"), "got {text:?}");
        assert!(text[2..].chars().all(|c| c.is_ascii_hexdigit()));

        let mut buf = pool.acquire();
        en.write_any(&mut buf, &Option::<i64>::None);
        assert_eq!(contents(&buf), "nil");
    }

    #[test]
    fn any_json_value() {
        let pool = BufferPool::new();
        let mut buf = pool.acquire();
        let payload = serde_json::json!({"attempts": 3, "user": "ann"});
        plain().write_any(&mut buf, &payload);
        assert_eq!(contents(&buf), "[\"attempts\":3 \"user\":\"ann\"]");
    }

    #[test]
    fn key_with_and_without_groups() {
        let pool = BufferPool::new();
        let en = styled();

        let mut buf = pool.acquire();
        en.write_key(&mut buf, &[], "testKey");
        assert_eq!(
            contents(&buf),
            format!("{TXT_CYAN}testKey{TXT_GRAY}={TXT_RESET}")
        );

        let mut buf = pool.acquire();
        let groups = ["group1".to_string(), "group2".to_string()];
        en.write_key(&mut buf, &groups, "testKey");
        assert_eq!(
            contents(&buf),
            format!("{TXT_CYAN}group1.group2.testKey{TXT_GRAY}={TXT_RESET}")
        );
    }

    #[test]
    fn attr_with_nested_group() {
        let pool = BufferPool::new();
        let mut buf = pool.acquire();
        let mut groups = vec!["group1".to_string()];
        let attr = Attr::group("group2", vec![Attr::string("key", "value")]);
        styled().write_attr(&mut buf, &mut groups, &attr);
        assert_eq!(
            contents(&buf),
            format!("{TXT_CYAN}group1.group2.key{TXT_GRAY}={TXT_RESET}\"value\" ")
        );
        // The path stack is restored after the walk.
        assert_eq!(groups, vec!["group1".to_string()]);
    }

    #[test]
    fn group_renders_leaves_at_depth() {
        let pool = BufferPool::new();
        let mut buf = pool.acquire();
        let mut groups = Vec::new();
        let attr = Attr::group(
            "user",
            vec![Attr::string("name", "Ann"), Attr::int("age", 3)],
        );
        plain().write_attr(&mut buf, &mut groups, &attr);
        assert_eq!(contents(&buf), "user.name=\"Ann\" user.age=3 ");
    }

    #[test]
    fn empty_sentinel_emits_nothing() {
        let pool = BufferPool::new();
        let mut buf = pool.acquire();
        let mut groups = vec!["group1".to_string()];
        plain().write_attr(&mut buf, &mut groups, &Attr::empty());
        assert!(buf.is_empty());
    }

    #[test]
    fn hook_substitutes_and_drops_leaves() {
        let pool = BufferPool::new();
        let en = plain();
        let hook = |groups: &[String], attr: Attr| -> Attr {
            assert_eq!(groups, ["outer".to_string()]);
            match attr.key.as_str() {
                "secret" => Attr::empty(),
                "key1" => Attr::string("key1", "replaced-value"),
                _ => attr,
            }
        };

        let mut buf = pool.acquire();
        let mut groups = Vec::new();
        let attr = Attr::group(
            "outer",
            vec![
                Attr::string("key1", "value1"),
                Attr::string("secret", "hunter2"),
            ],
        );
        en.write_attr_with(&mut buf, &mut groups, &attr, Some(&hook));
        assert_eq!(contents(&buf), "outer.key1=\"replaced-value\" ");
    }
}
