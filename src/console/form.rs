use crate::core::{
    ConsoleError, EntityInstance, EntityKind, Fields, ID_FIELD, Result, StoreError, StoreResult,
};
use crate::schema::{self, FieldKind, field_label, is_password_hash};
use serde_json::Value as JsonValue;

/// One rendered form row.
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    /// Text presented inside the widget.
    pub text: String,
}

/// Values behind the create/edit form of one entity kind.
///
/// Fresh forms hold exactly the schema's keys. Forms loaded from an instance
/// hold exactly that instance's fields plus its id, extras included.
#[derive(Debug, Clone, PartialEq)]
pub struct FormValues {
    kind: EntityKind,
    values: Fields,
}

impl FormValues {
    pub fn defaults(kind: EntityKind) -> Self {
        Self {
            kind,
            values: schema::schema(kind).defaults(),
        }
    }

    pub fn from_instance(kind: EntityKind, instance: &EntityInstance) -> Self {
        Self {
            kind,
            values: instance.to_record(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn values(&self) -> &Fields {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<&JsonValue> {
        self.values.get(name)
    }

    /// Widget of a field: declared by the schema, otherwise inferred from its name
    /// and current value.
    pub fn field_kind(&self, name: &str) -> FieldKind {
        match schema::schema(self.kind).field(name) {
            Some(spec) => spec.kind,
            None => FieldKind::infer(name, self.values.get(name).unwrap_or(&JsonValue::Null)),
        }
    }

    /// Applies raw widget input to a single field, coercing it for the widget.
    pub fn set_raw(&mut self, name: &str, raw: &str) -> Result<()> {
        let editable = name != ID_FIELD
            && (self.values.contains_key(name) || schema::schema(self.kind).contains(name));
        if !editable {
            return Err(ConsoleError::UnknownField {
                kind: self.kind,
                field: name.to_string(),
            });
        }

        let value = self.field_kind(name).coerce(raw);
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Fields to persist: everything but the identifier.
    pub fn payload(&self) -> Fields {
        self.values
            .iter()
            .filter(|(name, _)| name.as_str() != ID_FIELD)
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// [`payload`](Self::payload) with password fields hashed by bcrypt at
    /// `cost`. Empty values and values that are already hashes are kept.
    pub fn sealed_payload(&self, cost: u32) -> StoreResult<Fields> {
        let mut payload = self.payload();
        for (name, value) in payload.iter_mut() {
            if !self.field_kind(name).is_masked() {
                continue;
            }
            let Some(plain) = value.as_str().filter(|s| !s.is_empty() && !is_password_hash(s))
            else {
                continue;
            };
            let hash = bcrypt::hash(plain, cost)
                .map_err(|err| StoreError::rejected(format!("Failed to hash '{}': {}", name, err)))?;
            *value = JsonValue::String(hash);
        }
        Ok(payload)
    }

    /// Rows to render: schema fields in declared order, then any extra fields
    /// carried by an edited instance.
    pub fn fields(&self) -> Vec<FormField> {
        let schema = schema::schema(self.kind);
        let declared: Vec<&str> = schema.keys().collect();
        let extras = self
            .values
            .keys()
            .filter(|name| name.as_str() != ID_FIELD && !schema.contains(name))
            .map(String::as_str);

        declared
            .into_iter()
            .chain(extras)
            .map(|name| {
                let kind = self.field_kind(name);
                FormField {
                    name: name.to_string(),
                    label: field_label(name),
                    kind,
                    text: kind.edit_text(self.values.get(name)),
                }
            })
            .collect()
    }
}
