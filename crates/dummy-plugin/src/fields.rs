//! Field schema and extraction dispatch.
//!
//! The schema is fixed. A field id is the index of its descriptor in
//! [`FIELDS`], so dispatch is a table lookup followed by a match on the
//! [`Field`] variant stored in the descriptor.

use crate::error::{PluginError, Result};
use serde::Serialize;
use std::fmt;

/// Value type of an extractable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Uint64,
    String,
}

/// Extractable fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// `dummy.divisible[N]`
    Divisible,
    /// `dummy.value`
    Value,
    /// `dummy.strvalue`
    StrValue,
}

/// Static metadata describing one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    #[serde(skip)]
    pub id: u64,
    #[serde(skip)]
    pub field: Field,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub name: &'static str,
    #[serde(rename = "argRequired", skip_serializing_if = "is_false")]
    pub arg_required: bool,
    pub desc: &'static str,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// The field schema, ordered by id.
pub static FIELDS: [FieldDescriptor; 3] = [
    FieldDescriptor {
        id: 0,
        field: Field::Divisible,
        field_type: FieldType::Uint64,
        name: "dummy.divisible",
        arg_required: true,
        desc: "Return 1 if the value is divisible by the provided divisor, 0 otherwise",
    },
    FieldDescriptor {
        id: 1,
        field: Field::Value,
        field_type: FieldType::Uint64,
        name: "dummy.value",
        arg_required: false,
        desc: "The sample value in the event",
    },
    FieldDescriptor {
        id: 2,
        field: Field::StrValue,
        field_type: FieldType::String,
        name: "dummy.strvalue",
        arg_required: false,
        desc: "The sample value in the event, as a string",
    },
];

impl Field {
    pub fn from_id(id: u64) -> Option<Field> {
        usize::try_from(id)
            .ok()
            .and_then(|idx| FIELDS.get(idx))
            .map(|d| d.field)
    }

    pub fn from_name(name: &str) -> Option<Field> {
        FIELDS.iter().find(|d| d.name == name).map(|d| d.field)
    }

    pub fn descriptor(self) -> &'static FieldDescriptor {
        match self {
            Field::Divisible => &FIELDS[0],
            Field::Value => &FIELDS[1],
            Field::StrValue => &FIELDS[2],
        }
    }

    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    /// Compute this field for a decoded sample.
    ///
    /// `raw` is the payload text the sample was decoded from.
    pub(crate) fn extract(self, arg: Option<&str>, raw: &str, sample: u64) -> Result<FieldValue> {
        match self {
            Field::Divisible => {
                let arg = arg.unwrap_or_default();
                let divisor = arg
                    .trim()
                    .parse::<i64>()
                    .ok()
                    .filter(|d| *d != 0)
                    .ok_or_else(|| PluginError::InvalidArgument {
                        field: self.name(),
                        arg: arg.to_string(),
                    })?;
                let divisible = sample % divisor.unsigned_abs() == 0;
                Ok(FieldValue::U64(u64::from(divisible)))
            }
            Field::Value => Ok(FieldValue::U64(sample)),
            Field::StrValue => Ok(FieldValue::Str(raw.to_string())),
        }
    }
}

/// A typed extraction result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    U64(u64),
    Str(String),
}

impl FieldValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::U64(_) => FieldType::Uint64,
            FieldValue::Str(_) => FieldType::String,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::U64(v) => write!(f, "{v}"),
            FieldValue::Str(s) => f.write_str(s),
        }
    }
}

/// One field to extract from an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractRequest {
    pub field_id: u64,
    pub arg: Option<String>,
}

impl ExtractRequest {
    pub fn new(field_id: u64, arg: Option<&str>) -> Self {
        Self {
            field_id,
            arg: arg.map(str::to_string),
        }
    }

    /// Parse a filter-style field reference such as `dummy.value` or
    /// `dummy.divisible[7]`.
    pub fn parse(reference: &str) -> Result<Self> {
        let reference = reference.trim();
        let (name, arg) = match reference.split_once('[') {
            Some((name, rest)) => {
                let arg = rest
                    .strip_suffix(']')
                    .ok_or_else(|| PluginError::UnknownField(reference.to_string()))?;
                (name, Some(arg))
            }
            None => (reference, None),
        };
        let descriptor = FIELDS
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| PluginError::UnknownField(name.to_string()))?;
        if descriptor.arg_required && arg.is_none() {
            return Err(PluginError::InvalidArgument {
                field: descriptor.name,
                arg: String::new(),
            });
        }
        Ok(Self::new(descriptor.id, arg))
    }
}

/// Decode an event payload into its text and numeric sample.
pub(crate) fn decode_sample(payload: &[u8]) -> Result<(&str, u64)> {
    let raw = std::str::from_utf8(payload)
        .map_err(|e| PluginError::MalformedPayload(format!("payload is not UTF-8: {e}")))?;
    let sample = raw
        .parse::<u64>()
        .map_err(|e| PluginError::MalformedPayload(format!("{raw:?} is not a sample: {e}")))?;
    Ok((raw, sample))
}
