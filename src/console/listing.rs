use crate::core::{EntityInstance, ID_FIELD, value};
use crate::schema::{EntityKindSchema, field_label};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

/// Where listing columns come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnSource {
    /// Keys of the first instance. Keys only later rows carry are not shown.
    #[default]
    FirstRow,
    /// Schema fields in declared order, followed by first-row extras.
    Schema,
}

impl FromStr for ColumnSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first-row" | "first_row" | "firstrow" => Ok(Self::FirstRow),
            "schema" => Ok(Self::Schema),
            _ => Err(format!("column source must be 'first-row' or 'schema', got '{}'", s)),
        }
    }
}

impl fmt::Display for ColumnSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnSource::FirstRow => f.write_str("first-row"),
            ColumnSource::Schema => f.write_str("schema"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRow {
    pub id: String,
    pub cells: Vec<String>,
}

/// Table view of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Listing {
    pub columns: Vec<Column>,
    pub rows: Vec<ListingRow>,
}

impl Listing {
    pub fn build(
        instances: &[EntityInstance],
        schema: &EntityKindSchema,
        source: ColumnSource,
    ) -> Self {
        let columns: Vec<Column> = column_names(instances, schema, source)
            .into_iter()
            .map(|name| Column {
                label: field_label(&name),
                name,
            })
            .collect();

        let rows = instances
            .iter()
            .map(|instance| ListingRow {
                id: instance.id.clone(),
                cells: columns
                    .iter()
                    .map(|column| format_cell(instance.get(&column.name)))
                    .collect(),
            })
            .collect();

        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Column names for a snapshot, never including the identifier.
pub fn column_names(
    instances: &[EntityInstance],
    schema: &EntityKindSchema,
    source: ColumnSource,
) -> Vec<String> {
    let first_row = instances
        .first()
        .map(|first| {
            first
                .fields
                .keys()
                .filter(|name| name.as_str() != ID_FIELD)
                .cloned()
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    match source {
        ColumnSource::FirstRow => first_row,
        ColumnSource::Schema => schema
            .keys()
            .map(str::to_string)
            .chain(first_row.into_iter().filter(|name| !schema.contains(name)))
            .collect(),
    }
}

/// Cell text: absent and null are empty, arrays comma-joined, objects as JSON.
pub fn format_cell(cell: Option<&JsonValue>) -> String {
    cell.map(value::display).unwrap_or_default()
}
