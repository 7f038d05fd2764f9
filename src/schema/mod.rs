//! Record schema - one table per host record kind
//!
//! Design: every record is declared once as `field => "scriptKey" as Kind`.
//! The generated `FIELDS` table drives both directions of marshaling, so the
//! script-side key, the value kind and the default live in exactly one place.

use std::fmt;

mod records;

pub use records::{
    AddonProps, Capabilities, Channel, ChannelGroup, ChannelGroupMember, DriveSpace, EpgTag,
    Recording, Timer, CHANNEL_INVALID_UID,
};

/// Value kind of a single field as seen from the script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    Bool,
    Str,
    /// Seconds since the epoch; scripts may hand over `datetime` objects
    Time,
}

impl FieldKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Str => "str",
            Self::Time => "time",
        }
    }
}

/// Field value after coercion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Str(String),
}

/// One row of a record table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub kind: FieldKind,
}

/// Record kinds the bridge knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Properties,
    Capabilities,
    Channel,
    ChannelGroup,
    ChannelGroupMember,
    Timer,
    Recording,
    EpgTag,
    DriveSpace,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Properties => "properties",
            Self::Capabilities => "capabilities",
            Self::Channel => "channel",
            Self::ChannelGroup => "channel group",
            Self::ChannelGroupMember => "channel group member",
            Self::Timer => "timer",
            Self::Recording => "recording",
            Self::EpgTag => "EPG tag",
            Self::DriveSpace => "drive space",
        };
        f.write_str(name)
    }
}

/// A flat record described by a field table
pub trait Record: Default + Clone + fmt::Debug {
    const KIND: RecordKind;
    const FIELDS: &'static [FieldSpec];

    /// Read a field by script key
    fn get(&self, key: &str) -> Option<Value>;

    /// Write a field by script key; false when the key is unknown or the
    /// value has the wrong kind
    fn set(&mut self, key: &str, value: Value) -> bool;

    /// All fields in table order
    fn values(&self) -> Vec<(&'static str, Value)> {
        Self::FIELDS
            .iter()
            .filter_map(|spec| self.get(spec.key).map(|value| (spec.key, value)))
            .collect()
    }

    fn field(key: &str) -> Option<&'static FieldSpec> {
        Self::FIELDS.iter().find(|spec| spec.key == key)
    }
}

/// Conversion between a Rust field type and a `Value`
pub trait FieldValue: Sized {
    fn from_value(value: Value) -> Option<Self>;
    fn to_value(&self) -> Value;
}

impl FieldValue for i64 {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(v),
            Value::Bool(b) => Some(b as i64),
            Value::Str(_) => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Int(*self)
    }
}

impl FieldValue for bool {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(b),
            Value::Int(v) => Some(v != 0),
            Value::Str(_) => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FieldValue for String {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Str(self.clone())
    }
}

/// Declare a record struct together with its field table.
///
/// ```ignore
/// pvr_record! {
///     pub struct ChannelGroup: RecordKind::ChannelGroup {
///         group_name: String => "groupName" as Str,
///         is_radio: bool => "isRadio" as Bool,
///         position: i64 => "position" as Int = 0,
///     }
/// }
/// ```
#[macro_export]
macro_rules! pvr_record {
    (
        $(#[$meta:meta])*
        pub struct $name:ident : $kind:path {
            $(
                $(#[$fmeta:meta])*
                $field:ident : $ty:ty => $key:literal as $fk:ident $(= $default:expr)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            $(
                $(#[$fmeta])*
                pub $field: $ty,
            )*
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $( $field: $crate::pvr_record!(@default $ty $(, $default)?), )*
                }
            }
        }

        impl $crate::schema::Record for $name {
            const KIND: $crate::schema::RecordKind = $kind;
            const FIELDS: &'static [$crate::schema::FieldSpec] = &[
                $(
                    $crate::schema::FieldSpec {
                        key: $key,
                        kind: $crate::schema::FieldKind::$fk,
                    },
                )*
            ];

            fn get(&self, key: &str) -> Option<$crate::schema::Value> {
                match key {
                    $( $key => Some($crate::schema::FieldValue::to_value(&self.$field)), )*
                    _ => None,
                }
            }

            fn set(&mut self, key: &str, value: $crate::schema::Value) -> bool {
                match key {
                    $(
                        $key => match <$ty as $crate::schema::FieldValue>::from_value(value) {
                            Some(v) => {
                                self.$field = v;
                                true
                            }
                            None => false,
                        },
                    )*
                    _ => false,
                }
            }
        }
    };
    (@default $ty:ty) => { <$ty as Default>::default() };
    (@default $ty:ty, $default:expr) => { $default };
}
