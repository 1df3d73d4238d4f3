use super::error::ConsoleError;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

/// Field map of a stored document, in insertion order.
pub type Fields = serde_json::Map<String, JsonValue>;

/// Name under which the store-assigned identifier appears in form values.
pub const ID_FIELD: &str = "id";

/// The managed record categories. Each one owns its own key space in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Creators,
    Projects,
    Users,
    Admins,
}

impl EntityKind {
    /// Tab order of the console.
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Creators,
        EntityKind::Projects,
        EntityKind::Users,
        EntityKind::Admins,
    ];

    /// Collection name in the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Creators => "creators",
            EntityKind::Projects => "projects",
            EntityKind::Users => "users",
            EntityKind::Admins => "admins",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            EntityKind::Creators => "Creators",
            EntityKind::Projects => "Projects",
            EntityKind::Users => "Users",
            EntityKind::Admins => "Admins",
        }
    }

    /// Title used in "Add New ..." / "Edit ..." headings.
    pub fn singular_title(&self) -> &'static str {
        match self {
            EntityKind::Creators => "Creator",
            EntityKind::Projects => "Project",
            EntityKind::Users => "User",
            EntityKind::Admins => "Admin",
        }
    }

    /// Field the store orders listings by.
    pub fn order_field(&self) -> &'static str {
        match self {
            EntityKind::Creators | EntityKind::Users => "name",
            EntityKind::Projects => "projectTitle",
            EntityKind::Admins => "adminName",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL
            .iter()
            .position(|kind| kind == self)
            .unwrap_or_default()
    }

    pub fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(&self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConsoleError::UnknownKind(s.to_string()))
    }
}

/// A stored document: opaque store-assigned id plus its fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityInstance {
    pub id: String,
    pub fields: Fields,
}

impl EntityInstance {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&JsonValue> {
        if field == ID_FIELD {
            return None;
        }
        self.fields.get(field)
    }

    /// Flattened view with the identifier first, the way the listing sees a row.
    pub fn to_record(&self) -> Fields {
        let mut record = Fields::new();
        record.insert(ID_FIELD.to_string(), JsonValue::String(self.id.clone()));
        for (name, value) in &self.fields {
            if name != ID_FIELD {
                record.insert(name.clone(), value.clone());
            }
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_round_trip_through_names() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.as_str().parse::<EntityKind>().unwrap(), kind);
        }
        assert_eq!("Projects".parse::<EntityKind>().unwrap(), EntityKind::Projects);
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let err = "backers".parse::<EntityKind>().unwrap_err();
        assert_eq!(err, ConsoleError::UnknownKind("backers".to_string()));
    }

    #[test]
    fn test_tab_navigation_wraps() {
        assert_eq!(EntityKind::Admins.next(), EntityKind::Creators);
        assert_eq!(EntityKind::Creators.previous(), EntityKind::Admins);
        assert_eq!(EntityKind::Projects.index(), 1);
    }

    #[test]
    fn test_record_puts_id_first() {
        let fields = json!({"name": "Ada", "id": "shadowed"});
        let instance = EntityInstance::new("c1", fields.as_object().unwrap().clone());
        let record = instance.to_record();

        let keys: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["id", "name"]);
        assert_eq!(record["id"], json!("c1"));
        assert_eq!(instance.get("id"), None);
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_value(EntityKind::Admins).unwrap(), json!("admins"));
    }
}
