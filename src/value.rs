use chrono::{DateTime, FixedOffset, Utc};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Typed payload of an [`Attr`].
///
/// A closed union over the kinds the encoder renders on its fast path.
/// `Group` nests further attributes and contributes only key-path
/// qualification; `Any` is the escape hatch for everything else, resolved
/// through [`AnyValue`]. Values are immutable once constructed.
#[derive(Clone)]
pub enum Value {
    Bool(bool),
    Int64(i64),
    Uint64(u64),
    Float64(f64),
    String(String),
    Time(DateTime<FixedOffset>),
    Duration(Duration),
    Any(Arc<dyn AnyValue>),
    Group(Vec<Attr>),
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Value::Int64(v) => f.debug_tuple("Int64").field(v).finish(),
            Value::Uint64(v) => f.debug_tuple("Uint64").field(v).finish(),
            Value::Float64(v) => f.debug_tuple("Float64").field(v).finish(),
            Value::String(v) => f.debug_tuple("String").field(v).finish(),
            Value::Time(v) => f.debug_tuple("Time").field(v).finish(),
            Value::Duration(v) => f.debug_tuple("Duration").field(v).finish(),
            Value::Any(_) => f.write_str("Any(..)"),
            Value::Group(v) => f.debug_tuple("Group").field(v).finish(),
        }
    }
}

/// A key bound to a [`Value`], possibly a nested group of further
/// attributes.
///
/// The zero value ([`Attr::empty`]) is a recognized "absent" sentinel: the
/// attribute writer skips it silently, and a replacement hook can return it
/// to drop an attribute from the line.
#[derive(Debug, Clone)]
pub struct Attr {
    pub key: String,
    pub value: Value,
}

impl Attr {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Attr {
            key: key.into(),
            value,
        }
    }

    /// The absent sentinel: no key, no value, no children.
    pub fn empty() -> Self {
        Attr {
            key: String::new(),
            value: Value::Group(Vec::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_empty() && matches!(&self.value, Value::Group(g) if g.is_empty())
    }

    pub fn bool(key: impl Into<String>, value: bool) -> Self {
        Attr::new(key, Value::Bool(value))
    }

    pub fn int(key: impl Into<String>, value: i64) -> Self {
        Attr::new(key, Value::Int64(value))
    }

    pub fn uint(key: impl Into<String>, value: u64) -> Self {
        Attr::new(key, Value::Uint64(value))
    }

    pub fn float(key: impl Into<String>, value: f64) -> Self {
        Attr::new(key, Value::Float64(value))
    }

    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Attr::new(key, Value::String(value.into()))
    }

    pub fn time(key: impl Into<String>, value: impl Into<DateTime<FixedOffset>>) -> Self {
        Attr::new(key, Value::Time(value.into()))
    }

    pub fn duration(key: impl Into<String>, value: Duration) -> Self {
        Attr::new(key, Value::Duration(value))
    }

    pub fn any(key: impl Into<String>, value: impl AnyValue + 'static) -> Self {
        Attr::new(key, Value::Any(Arc::new(value)))
    }

    pub fn group(key: impl Into<String>, attrs: Vec<Attr>) -> Self {
        Attr::new(key, Value::Group(attrs))
    }
}

impl Default for Attr {
    fn default() -> Self {
        Attr::empty()
    }
}

/// Capability interface for values logged through [`Value::Any`].
///
/// Rust has no runtime reflection, so producers declare how their type
/// should be inspected: an optional custom textual representation (checked
/// first by the encoder) and a structural [`Shape`] consulted when no
/// custom text exists. Implementations exist for the common primitive,
/// container and smart-pointer types, and for `serde_json::Value`, so most
/// payloads log without any hand-written glue.
pub trait AnyValue: Send + Sync {
    /// Custom textual representation, emitted verbatim when present.
    fn as_text(&self) -> Option<String> {
        None
    }

    /// Structural shape driving the encoder's fallback ladder.
    fn shape(&self) -> Shape<'_>;
}

/// Structural shape of an [`AnyValue`], borrowed for the duration of one
/// encoding pass.
pub enum Shape<'a> {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(&'a str),
    /// Named-field record; fields render as `{name:value ...}`.
    Struct(Vec<(&'a str, &'a dyn AnyValue)>),
    /// Ordered sequence; renders as `[v1 v2 ...]`.
    Seq(Vec<&'a dyn AnyValue>),
    /// Key-to-value mapping in its native iteration order; renders as
    /// `[k1:v1 k2:v2 ...]`.
    Map(Vec<(&'a dyn AnyValue, &'a dyn AnyValue)>),
    /// Reference: absent renders as `nil`, present as a hex identity
    /// marker of the referenced value.
    Ref(Option<&'a dyn AnyValue>),
    /// Absent or uninitialized value; renders as `nil`.
    Nil,
}

macro_rules! any_int {
    ($($t:ty),*) => {
        $(impl AnyValue for $t {
            fn shape(&self) -> Shape<'_> {
                Shape::Int(*self as i64)
            }
        })*
    };
}

macro_rules! any_uint {
    ($($t:ty),*) => {
        $(impl AnyValue for $t {
            fn shape(&self) -> Shape<'_> {
                Shape::Uint(*self as u64)
            }
        })*
    };
}

any_int!(i8, i16, i32, i64, isize);
any_uint!(u8, u16, u32, u64, usize);

impl AnyValue for bool {
    fn shape(&self) -> Shape<'_> {
        Shape::Bool(*self)
    }
}

impl AnyValue for f32 {
    fn shape(&self) -> Shape<'_> {
        Shape::Float(f64::from(*self))
    }
}

impl AnyValue for f64 {
    fn shape(&self) -> Shape<'_> {
        Shape::Float(*self)
    }
}

impl AnyValue for String {
    fn shape(&self) -> Shape<'_> {
        Shape::Str(self)
    }
}

impl AnyValue for &'static str {
    fn shape(&self) -> Shape<'_> {
        Shape::Str(self)
    }
}

impl<T: AnyValue> AnyValue for Option<T> {
    fn as_text(&self) -> Option<String> {
        self.as_ref().and_then(AnyValue::as_text)
    }

    fn shape(&self) -> Shape<'_> {
        match self {
            Some(v) => v.shape(),
            None => Shape::Nil,
        }
    }
}

impl<T: AnyValue> AnyValue for Vec<T> {
    fn shape(&self) -> Shape<'_> {
        Shape::Seq(self.iter().map(|v| v as &dyn AnyValue).collect())
    }
}

// Iteration order is the map's own: nondeterministic for HashMap, sorted
// for BTreeMap. The encoder renders whatever order it is handed.
impl<V: AnyValue> AnyValue for HashMap<String, V> {
    fn shape(&self) -> Shape<'_> {
        Shape::Map(
            self.iter()
                .map(|(k, v)| (k as &dyn AnyValue, v as &dyn AnyValue))
                .collect(),
        )
    }
}

impl<V: AnyValue> AnyValue for BTreeMap<String, V> {
    fn shape(&self) -> Shape<'_> {
        Shape::Map(
            self.iter()
                .map(|(k, v)| (k as &dyn AnyValue, v as &dyn AnyValue))
                .collect(),
        )
    }
}

// Smart pointers log as reference shapes: an identity marker, not the
// dereferenced content.
impl<T: AnyValue> AnyValue for Box<T> {
    fn shape(&self) -> Shape<'_> {
        Shape::Ref(Some(&**self))
    }
}

impl<T: AnyValue> AnyValue for Arc<T> {
    fn shape(&self) -> Shape<'_> {
        Shape::Ref(Some(&**self))
    }
}

impl AnyValue for DateTime<Utc> {
    fn as_text(&self) -> Option<String> {
        Some(self.to_string())
    }

    fn shape(&self) -> Shape<'_> {
        Shape::Nil
    }
}

impl AnyValue for DateTime<FixedOffset> {
    fn as_text(&self) -> Option<String> {
        Some(self.to_string())
    }

    fn shape(&self) -> Shape<'_> {
        Shape::Nil
    }
}

impl AnyValue for serde_json::Value {
    fn shape(&self) -> Shape<'_> {
        match self {
            serde_json::Value::Null => Shape::Nil,
            serde_json::Value::Bool(b) => Shape::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Shape::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Shape::Uint(u)
                } else {
                    Shape::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Shape::Str(s),
            serde_json::Value::Array(items) => {
                Shape::Seq(items.iter().map(|v| v as &dyn AnyValue).collect())
            }
            serde_json::Value::Object(map) => Shape::Map(
                map.iter()
                    .map(|(k, v)| (k as &dyn AnyValue, v as &dyn AnyValue))
                    .collect(),
            ),
        }
    }
}
