//! Static per-kind schemas.
//!
//! Every field carries its default value and an explicit [`FieldKind`]. The
//! name-based rules in [`FieldKind::infer`] are only consulted for fields a
//! stored document carries beyond its schema.

mod label;

pub use label::field_label;

use crate::core::{EntityKind, Fields, value};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Value as JsonValue, json};

/// Choices of the `projectStatus` selector.
pub const PROJECT_STATUSES: &[&str] = &["pending", "approved", "rejected", "completed"];

/// Input widget of a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Password,
    Email,
    Tel,
    Textarea,
    Select { options: &'static [&'static str] },
    MultiValue,
    Flag,
}

impl FieldKind {
    /// Derives a widget from a field name and its value. First matching rule wins.
    pub fn infer(name: &str, default: &JsonValue) -> Self {
        match name {
            "balance" | "fundGoal" => FieldKind::Number,
            "password" => FieldKind::Password,
            "email" => FieldKind::Email,
            "phone" => FieldKind::Tel,
            "description" => FieldKind::Textarea,
            "projectStatus" => FieldKind::Select {
                options: PROJECT_STATUSES,
            },
            _ => match default {
                JsonValue::Array(_) => FieldKind::MultiValue,
                JsonValue::Number(_) => FieldKind::Number,
                JsonValue::Bool(_) => FieldKind::Flag,
                _ => FieldKind::Text,
            },
        }
    }

    /// Converts raw widget input into the stored value.
    pub fn coerce(&self, raw: &str) -> JsonValue {
        match self {
            FieldKind::Number => value::number(leading_number(raw)),
            FieldKind::MultiValue => JsonValue::Array(
                raw.split(',')
                    .map(str::trim)
                    .filter(|token| !token.is_empty())
                    .map(|token| JsonValue::String(token.to_string()))
                    .collect(),
            ),
            FieldKind::Flag => JsonValue::Bool(matches!(
                raw.trim().to_ascii_lowercase().as_str(),
                "true" | "yes" | "1" | "on"
            )),
            _ => JsonValue::String(raw.to_string()),
        }
    }

    /// Text shown inside the widget for a stored value.
    pub fn edit_text(&self, value: Option<&JsonValue>) -> String {
        match (self, value) {
            (_, None) => String::new(),
            (FieldKind::MultiValue, Some(stored)) if !stored.is_array() => String::new(),
            (_, Some(stored)) => value::display(stored),
        }
    }

    /// HTML-style input type name, used for hints and logs.
    pub fn input_type(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Password => "password",
            FieldKind::Email => "email",
            FieldKind::Tel => "tel",
            FieldKind::Textarea => "textarea",
            FieldKind::Select { .. } => "select",
            FieldKind::MultiValue => "array",
            FieldKind::Flag => "checkbox",
        }
    }

    pub fn is_masked(&self) -> bool {
        matches!(self, FieldKind::Password)
    }

    pub fn is_multiline(&self) -> bool {
        matches!(self, FieldKind::Textarea)
    }
}

/// Whether a stored password value is already a bcrypt hash.
pub fn is_password_hash(stored: &str) -> bool {
    stored.starts_with("$2")
}

lazy_static! {
    static ref LEADING_NUMBER: Regex =
        Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").expect("static pattern");
}

/// Longest numeric prefix of `raw` after leading whitespace, `0` when there is
/// none: `"12abc"` is 12, `"1,000"` is 1.
fn leading_number(raw: &str) -> f64 {
    LEADING_NUMBER
        .find(raw.trim_start())
        .and_then(|prefix| prefix.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// One declared field of a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub default: JsonValue,
}

impl FieldSpec {
    pub fn new(name: &'static str, kind: FieldKind, default: JsonValue) -> Self {
        Self {
            name,
            kind,
            default,
        }
    }

    pub fn label(&self) -> String {
        field_label(self.name)
    }
}

/// Ordered field list of an entity kind.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityKindSchema {
    kind: EntityKind,
    fields: Vec<FieldSpec>,
}

impl EntityKindSchema {
    pub fn new(kind: EntityKind, fields: Vec<FieldSpec>) -> Self {
        Self { kind, fields }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|field| field.name)
    }

    /// Fresh form values holding every field's default.
    pub fn defaults(&self) -> Fields {
        self.fields
            .iter()
            .map(|field| (field.name.to_string(), field.default.clone()))
            .collect()
    }
}

lazy_static! {
    static ref SCHEMAS: Vec<EntityKindSchema> =
        EntityKind::ALL.iter().map(|kind| build(*kind)).collect();
}

fn build(kind: EntityKind) -> EntityKindSchema {
    use FieldKind::*;

    let fields = match kind {
        EntityKind::Creators => vec![
            FieldSpec::new("name", Text, json!("")),
            FieldSpec::new("phone", Tel, json!("")),
            FieldSpec::new("email", Email, json!("")),
            FieldSpec::new("password", Password, json!("")),
        ],
        EntityKind::Projects => vec![
            FieldSpec::new("projectTitle", Text, json!("")),
            FieldSpec::new("balance", Number, json!(0)),
            FieldSpec::new("fundGoal", Number, json!(0)),
            FieldSpec::new("description", Textarea, json!("")),
            FieldSpec::new(
                "projectStatus",
                Select {
                    options: PROJECT_STATUSES,
                },
                json!("pending"),
            ),
            FieldSpec::new("creatorId", Text, json!("")),
        ],
        EntityKind::Users => vec![
            FieldSpec::new("name", Text, json!("")),
            FieldSpec::new("email", Email, json!("")),
            FieldSpec::new("phone", Tel, json!("")),
            FieldSpec::new("password", Password, json!("")),
            FieldSpec::new("backedProjects", MultiValue, json!([])),
        ],
        EntityKind::Admins => vec![
            FieldSpec::new("adminName", Text, json!("")),
            FieldSpec::new("password", Password, json!("")),
        ],
    };

    EntityKindSchema::new(kind, fields)
}

/// Schema of `kind`. Kinds form a closed enum, so the lookup cannot fail.
pub fn schema(kind: EntityKind) -> &'static EntityKindSchema {
    &SCHEMAS[kind.index()]
}
