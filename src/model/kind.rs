//! CRM object kinds and their known field sets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// One of the five record categories held by the cache.
///
/// Serializes as the collection name (`"leads"`, `"contacts"`, ...), which is
/// also the key used in the snapshot's `lastSync` map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    #[serde(rename = "leads", alias = "lead")]
    Lead,
    #[serde(rename = "contacts", alias = "contact")]
    Contact,
    #[serde(rename = "accounts", alias = "account")]
    Account,
    #[serde(rename = "opportunities", alias = "opportunity")]
    Opportunity,
    #[serde(rename = "tasks", alias = "task")]
    Task,
}

impl ObjectKind {
    /// All kinds, in summary/export order.
    pub const ALL: [Self; 5] = [
        Self::Lead,
        Self::Contact,
        Self::Account,
        Self::Opportunity,
        Self::Task,
    ];

    /// Collection name, as used in the persisted document.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Lead => "leads",
            Self::Contact => "contacts",
            Self::Account => "accounts",
            Self::Opportunity => "opportunities",
            Self::Task => "tasks",
        }
    }

    /// Human-readable plural label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Lead => "Leads",
            Self::Contact => "Contacts",
            Self::Account => "Accounts",
            Self::Opportunity => "Opportunities",
            Self::Task => "Tasks",
        }
    }

    /// Known columns for this kind, `id` first.
    ///
    /// This is the documented CSV column order.
    #[must_use]
    pub const fn fields(&self) -> &'static [&'static str] {
        match self {
            Self::Lead => &["id", "name", "company", "email", "phone", "status"],
            Self::Contact => &["id", "name", "email", "phone", "account", "title"],
            Self::Account => &["id", "accountName", "industry", "phone", "website"],
            Self::Opportunity => &[
                "id",
                "opportunityName",
                "account",
                "stage",
                "amount",
                "probability",
                "closeDate",
            ],
            Self::Task => &["id", "subject", "dueDate", "status", "priority", "assignee"],
        }
    }

    /// The field shown as a record's title in listings.
    #[must_use]
    pub const fn title_field(&self) -> &'static str {
        self.fields()[1]
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = Error;

    /// Accepts collection names, singular names and the short tab labels,
    /// case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "leads" | "lead" => Ok(Self::Lead),
            "contacts" | "contact" => Ok(Self::Contact),
            "accounts" | "account" => Ok(Self::Account),
            "opportunities" | "opportunity" | "opps" | "opp" => Ok(Self::Opportunity),
            "tasks" | "task" => Ok(Self::Task),
            _ => Err(Error::UnknownKind(s.to_string())),
        }
    }
}
