//! Host type model
//!
//! Types resolved by the host analyzer framework (call-site return types,
//! parameter objects, record properties) and types reported by validation
//! providers (column and parameter types) share this representation so the
//! reconciler can compare them through a [`SemanticModel`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

// ============================================================================
// SCALAR TYPES
// ============================================================================

/// Primitive-like types eligible for single-column mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Bool,
    Byte,
    SByte,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Float,
    Double,
    Decimal,
    Char,
    String,
    DateTime,
    DateTimeOffset,
    TimeSpan,
    Guid,
    Bytes,
}

impl ScalarKind {
    /// Name as rendered in diagnostics
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Byte => "byte",
            Self::SByte => "sbyte",
            Self::Short => "short",
            Self::UShort => "ushort",
            Self::Int => "int",
            Self::UInt => "uint",
            Self::Long => "long",
            Self::ULong => "ulong",
            Self::Float => "float",
            Self::Double => "double",
            Self::Decimal => "decimal",
            Self::Char => "char",
            Self::String => "string",
            Self::DateTime => "DateTime",
            Self::DateTimeOffset => "DateTimeOffset",
            Self::TimeSpan => "TimeSpan",
            Self::Guid => "Guid",
            Self::Bytes => "byte[]",
        }
    }

    /// Reference types carry their own null; `nullable` is ignored for them
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::String | Self::Bytes)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Byte
                | Self::SByte
                | Self::Short
                | Self::UShort
                | Self::Int
                | Self::UInt
                | Self::Long
                | Self::ULong
                | Self::Float
                | Self::Double
                | Self::Decimal
                | Self::Char
        )
    }

    /// Implicit numeric widening (`from -> to`), excluding identity
    fn widens_to(&self, to: ScalarKind) -> bool {
        use ScalarKind::*;
        let targets: &[ScalarKind] = match self {
            SByte => &[Short, Int, Long, Float, Double, Decimal],
            Byte => &[Short, UShort, Int, UInt, Long, ULong, Float, Double, Decimal],
            Short => &[Int, Long, Float, Double, Decimal],
            UShort => &[Int, UInt, Long, ULong, Float, Double, Decimal],
            Int => &[Long, Float, Double, Decimal],
            UInt => &[Long, ULong, Float, Double, Decimal],
            Long | ULong => &[Float, Double, Decimal],
            Char => &[UShort, Int, UInt, Long, ULong, Float, Double, Decimal],
            Float => &[Double],
            _ => &[],
        };
        targets.contains(&to)
    }
}

/// A scalar type with optional nullability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScalarType {
    pub kind: ScalarKind,
    #[serde(default)]
    pub nullable: bool,
}

impl ScalarType {
    fn is_nullable_value(&self) -> bool {
        self.nullable && !self.kind.is_reference()
    }
}

// ============================================================================
// RECORD TYPES
// ============================================================================

fn default_true() -> bool {
    true
}

/// A property of a record type as seen by reflection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyInfo {
    pub name: String,
    pub ty: TypeRef,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[serde(default = "default_true")]
    pub has_getter: bool,
    #[serde(default = "default_true")]
    pub has_public_setter: bool,
}

impl PropertyInfo {
    /// A public property with a getter and a public setter
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            is_public: true,
            has_getter: true,
            has_public_setter: true,
        }
    }

    /// A public get-only property (anonymous objects, computed members)
    pub fn read_only(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            has_public_setter: false,
            ..Self::new(name, ty)
        }
    }

    pub fn is_readable(&self) -> bool {
        self.is_public && self.has_getter
    }

    pub fn is_settable(&self) -> bool {
        self.is_public && self.has_public_setter
    }
}

/// A record (class, struct or anonymous object) type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordType {
    pub name: String,
    #[serde(default)]
    pub properties: Vec<PropertyInfo>,
}

impl RecordType {
    pub fn new(name: impl Into<String>, properties: Vec<PropertyInfo>) -> Self {
        Self {
            name: name.into(),
            properties,
        }
    }
}

// ============================================================================
// TYPE REFERENCE
// ============================================================================

/// A type as resolved by the host or reported by a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeRef {
    Scalar(ScalarType),
    /// Enumerable of the element type
    Sequence(Box<TypeRef>),
    /// Task/future resolving to the inner type
    Awaitable(Box<TypeRef>),
    Record(Arc<RecordType>),
    /// Late-bound type, no static shape
    Dynamic,
    /// Type the host could not resolve
    Error,
}

impl TypeRef {
    pub fn scalar(kind: ScalarKind) -> Self {
        Self::Scalar(ScalarType {
            kind,
            nullable: false,
        })
    }

    pub fn nullable(kind: ScalarKind) -> Self {
        Self::Scalar(ScalarType {
            kind,
            nullable: true,
        })
    }

    pub fn sequence_of(element: TypeRef) -> Self {
        Self::Sequence(Box::new(element))
    }

    pub fn awaitable_of(inner: TypeRef) -> Self {
        Self::Awaitable(Box::new(inner))
    }

    pub fn record(record: RecordType) -> Self {
        Self::Record(Arc::new(record))
    }

    /// Scalar types map a whole row to one value
    pub fn is_basic(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    /// Types no static reasoning applies to
    pub fn is_opaque(&self) -> bool {
        matches!(self, Self::Dynamic | Self::Error)
    }

    pub fn display_name(&self) -> String {
        match self {
            Self::Scalar(s) if s.is_nullable_value() => format!("{}?", s.kind.display_name()),
            Self::Scalar(s) => s.kind.display_name().to_string(),
            Self::Sequence(e) => format!("IEnumerable<{}>", e.display_name()),
            Self::Awaitable(t) => format!("Task<{}>", t.display_name()),
            Self::Record(r) => r.name.clone(),
            Self::Dynamic => "dynamic".to_string(),
            Self::Error => "?".to_string(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

/// Classification of a conversion between two types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    Identity,
    Implicit,
    /// Requires a cast
    Explicit,
    None,
}

impl Conversion {
    pub fn is_implicit(&self) -> bool {
        matches!(self, Self::Identity | Self::Implicit)
    }
}

/// Semantic facts the host provides about its type system
pub trait SemanticModel: Send + Sync {
    /// Classify the conversion from `from` to `to`
    fn classify_conversion(&self, from: &TypeRef, to: &TypeRef) -> Conversion;

    /// Whether a value of `from` can be used where `to` is expected without a cast
    fn is_compatible(&self, from: &TypeRef, to: &TypeRef) -> bool {
        self.classify_conversion(from, to).is_implicit()
    }
}

/// Conversion rules of the bundled type model
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardConversions;

impl StandardConversions {
    fn classify_scalar(from: ScalarType, to: ScalarType) -> Conversion {
        let from_nullable = from.is_nullable_value();
        let to_nullable = to.is_nullable_value();

        let underlying = if from.kind == to.kind {
            Conversion::Identity
        } else if from.kind.widens_to(to.kind) {
            Conversion::Implicit
        } else if from.kind.is_numeric() && to.kind.is_numeric() {
            Conversion::Explicit
        } else {
            Conversion::None
        };

        match (underlying, from_nullable, to_nullable) {
            (Conversion::None, _, _) => Conversion::None,
            (c, false, false) | (c, true, true) => c,
            // T -> U? lifts any implicit conversion
            (Conversion::Identity | Conversion::Implicit, false, true) => Conversion::Implicit,
            (Conversion::Explicit, false, true) => Conversion::Explicit,
            // T? -> U always needs a cast
            (_, true, false) => Conversion::Explicit,
        }
    }
}

impl SemanticModel for StandardConversions {
    fn classify_conversion(&self, from: &TypeRef, to: &TypeRef) -> Conversion {
        match (from, to) {
            (TypeRef::Error, _) | (_, TypeRef::Error) => Conversion::Implicit,
            (TypeRef::Dynamic, TypeRef::Dynamic) => Conversion::Identity,
            (TypeRef::Dynamic, _) | (_, TypeRef::Dynamic) => Conversion::Implicit,
            (TypeRef::Scalar(f), TypeRef::Scalar(t)) => Self::classify_scalar(*f, *t),
            (TypeRef::Record(f), TypeRef::Record(t)) if f.name == t.name => Conversion::Identity,
            (TypeRef::Sequence(f), TypeRef::Sequence(t))
            | (TypeRef::Awaitable(f), TypeRef::Awaitable(t)) => {
                match self.classify_conversion(f, t) {
                    Conversion::Identity => Conversion::Identity,
                    _ => Conversion::None,
                }
            }
            _ => Conversion::None,
        }
    }
}
