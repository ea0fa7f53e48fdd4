use serde::{Deserialize, Serialize};

/// Credit or debit side of a bank statement entry
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    #[serde(rename = "C")]
    Credit,
    #[serde(rename = "D")]
    Debit,
}

impl EntryType {
    pub fn label(&self) -> &'static str {
        match self {
            EntryType::Credit => "income",
            EntryType::Debit => "expense",
        }
    }
}

/// Which dashboard card a statement belongs to (`entryId` on the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryKind {
    Transactions = 1,
    Investments = 2,
    FixedCosts = 3,
    Payments = 4,
}

impl EntryKind {
    pub const ALL: [EntryKind; 4] = [
        EntryKind::Transactions,
        EntryKind::Investments,
        EntryKind::FixedCosts,
        EntryKind::Payments,
    ];

    pub fn id(self) -> i64 {
        self as i64
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntryKind::Transactions => "Today's money",
            EntryKind::Investments => "Investments",
            EntryKind::FixedCosts => "Fixed costs",
            EntryKind::Payments => "Future money",
        }
    }
}

#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankStatement {
    pub id: i64,
    pub user_id: i64,
    pub entry_type: EntryType,
    /// Raw `entryId`; see `kind()`
    pub entry_id: i64,
    pub value: f64,
    #[serde(default)]
    pub description: String,
    pub date: String,
    #[serde(rename = "created_at", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl BankStatement {
    pub fn kind(&self) -> Option<EntryKind> {
        EntryKind::from_id(self.entry_id)
    }

    /// Value with credits positive and debits negative
    pub fn signed_value(&self) -> f64 {
        match self.entry_type {
            EntryType::Credit => self.value,
            EntryType::Debit => -self.value,
        }
    }
}

/// Payload for creating a statement
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStatement {
    pub user_id: i64,
    pub entry_type: EntryType,
    pub entry_id: i64,
    pub value: f64,
    pub description: String,
    pub date: String,
}

impl NewStatement {
    pub fn new(
        user_id: i64,
        kind: EntryKind,
        entry_type: EntryType,
        value: f64,
        description: &str,
        date: String,
    ) -> Self {
        Self {
            user_id,
            entry_type,
            entry_id: kind.id(),
            value,
            description: description.to_string(),
            date,
        }
    }
}

#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub user_id: i64,
    pub total_credits: f64,
    pub total_debits: f64,
    pub balance: f64,
}
