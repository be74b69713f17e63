//! # Domain Types
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Table (5 fixed names)   Row (untyped)         User (auth state)        │
//! │  ─────────────────────   ──────────────────    ──────────────────       │
//! │  customer                { "id": 1,            id (UUID)                │
//! │  employee                  "name": "...",      email / phone            │
//! │  item                      ... }               role, aud                │
//! │  receipt                                                                │
//! │  payment                 Shape is owned by the backend schema,          │
//! │                          not by this code.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Table
// =============================================================================

/// One of the five backend tables mirrored into local collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Customer,
    Employee,
    Item,
    Receipt,
    Payment,
}

impl Table {
    /// Every synced table, in the order collections are reported.
    pub const ALL: [Table; 5] = [
        Table::Customer,
        Table::Employee,
        Table::Item,
        Table::Receipt,
        Table::Payment,
    ];

    /// Table name as it exists in the backend schema.
    pub const fn name(&self) -> &'static str {
        match self {
            Table::Customer => "customer",
            Table::Employee => "employee",
            Table::Item => "item",
            Table::Receipt => "receipt",
            Table::Payment => "payment",
        }
    }

    /// Plural name of the local collection fed by this table.
    pub const fn collection_name(&self) -> &'static str {
        match self {
            Table::Customer => "customers",
            Table::Employee => "employees",
            Table::Item => "items",
            Table::Receipt => "receipts",
            Table::Payment => "payments",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Table {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "customer" | "customers" => Ok(Table::Customer),
            "employee" | "employees" => Ok(Table::Employee),
            "item" | "items" => Ok(Table::Item),
            "receipt" | "receipts" => Ok(Table::Receipt),
            "payment" | "payments" => Ok(Table::Payment),
            other => Err(CoreError::UnknownTable(other.to_string())),
        }
    }
}

// =============================================================================
// Row
// =============================================================================

/// A single backend row. Column names and types are not known locally.
pub type Row = Map<String, Value>;

/// Converts a decoded response body into rows.
///
/// The body must be a JSON array whose elements are all objects; anything
/// else is reported against `table`.
pub fn rows_from_value(table: Table, value: Value) -> CoreResult<Vec<Row>> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(CoreError::MalformedRows {
                table: table.to_string(),
                reason: format!("expected array, got {}", json_kind(&other)),
            })
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(row) => Ok(row),
            other => Err(CoreError::MalformedRows {
                table: table.to_string(),
                reason: format!("element {} is {}, expected object", index, json_kind(&other)),
            }),
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// User
// =============================================================================

/// The authenticated user attached to a persisted session.
///
/// Mirrors the subset of the auth server's user object that callers use;
/// unknown fields are ignored when decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Auth user id (UUID).
    pub id: Uuid,

    /// Audience the session was issued for (usually "authenticated").
    #[serde(default)]
    pub aud: Option<String>,

    /// Database role used for row-level security.
    #[serde(default)]
    pub role: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    /// Free-form profile data set at sign-up.
    #[serde(default)]
    pub user_metadata: Map<String, Value>,
}

impl User {
    /// Best human-readable label for logs: email, then phone, then id.
    pub fn display_name(&self) -> String {
        self.email
            .clone()
            .or_else(|| self.phone.clone())
            .unwrap_or_else(|| self.id.to_string())
    }
}
