use serde::{Deserialize, Serialize};

use crate::utils::normalize_date;

#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    #[default]
    Income,
    Expense,
}

/// Transaction as the `transactions` endpoint returns it (PascalCase, loosely filled)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TransactionRecord {
    pub id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub category_id: Option<i64>,
    pub date: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default, rename = "Type")]
    pub kind: Option<TransactionType>,
}

#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub category_id: Option<i64>,
    /// Always `YYYY-MM-DD` when the backend sent a parseable date
    pub date: String,
    pub description: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

impl From<TransactionRecord> for Transaction {
    fn from(record: TransactionRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            category_id: record.category_id,
            date: normalize_date(&record.date),
            description: record.description.unwrap_or_default(),
            amount: record.amount.unwrap_or(0.0),
            kind: record.kind.unwrap_or_default(),
        }
    }
}

impl Transaction {
    /// Amount with income positive and expenses negative
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }
}

/// Payload for creating or updating a transaction
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionType>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_to_transaction_fills_defaults() {
        let json = r#"{"Id":3,"UserId":42,"CategoryId":null,"Date":"2025-03-10T15:00:00.000Z"}"#;
        let record: TransactionRecord = serde_json::from_str(json).unwrap();
        let transaction = Transaction::from(record);

        assert_eq!(transaction.date, "2025-03-10");
        assert_eq!(transaction.description, "");
        assert_eq!(transaction.amount, 0.0);
        assert_eq!(transaction.kind, TransactionType::Income);
    }

    #[test]
    fn test_expense_is_negative() {
        let json = r#"{"Id":4,"UserId":42,"Date":"2025-03-10","Amount":80.5,"Type":"expense","Description":"Groceries"}"#;
        let transaction = Transaction::from(serde_json::from_str::<TransactionRecord>(json).unwrap());
        assert_eq!(transaction.signed_amount(), -80.5);
        assert_eq!(transaction.description, "Groceries");
    }

    #[test]
    fn test_input_omits_unset_fields() {
        let input = TransactionInput {
            amount: Some(10.0),
            kind: Some(TransactionType::Expense),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&input).unwrap(),
            serde_json::json!({ "amount": 10.0, "type": "expense" })
        );
    }
}
