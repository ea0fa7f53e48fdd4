//! Dashboard figures computed from bank statements.

use std::collections::BTreeMap;

use crate::filter::Filterable;
use crate::models::{BankStatement, EntryKind, EntryType};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSummary {
    pub total_credits: f64,
    pub total_debits: f64,
    /// Signed total per dashboard card; credits add and debits subtract
    pub by_kind: BTreeMap<EntryKind, f64>,
    /// Statements whose `entryId` matches no known card
    pub uncategorized: f64,
    pub statement_count: usize,
}

impl DashboardSummary {
    pub fn from_statements(statements: &[BankStatement]) -> Self {
        let mut summary = Self {
            statement_count: statements.len(),
            ..Default::default()
        };

        for statement in statements {
            match statement.entry_type {
                EntryType::Credit => summary.total_credits += statement.value,
                EntryType::Debit => summary.total_debits += statement.value,
            }
            match statement.kind() {
                Some(kind) => *summary.by_kind.entry(kind).or_insert(0.0) += statement.signed_value(),
                None => summary.uncategorized += statement.signed_value(),
            }
        }

        summary
    }

    pub fn balance(&self) -> f64 {
        self.total_credits - self.total_debits
    }

    pub fn total_for(&self, kind: EntryKind) -> f64 {
        self.by_kind.get(&kind).copied().unwrap_or(0.0)
    }
}

/// Progress of the money saved toward the user's savings goal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalProgress {
    pub saved: f64,
    pub goal: f64,
}

impl GoalProgress {
    /// `None` unless the goal is a positive amount
    pub fn new(saved: f64, goal: f64) -> Option<Self> {
        (goal.is_finite() && goal > 0.0).then_some(Self { saved, goal })
    }

    /// Saved amount as a percentage of the goal. Not clamped: a negative
    /// balance or an exceeded goal shows as such.
    pub fn percentage(&self) -> f64 {
        self.saved / self.goal * 100.0
    }

    /// Percentage rounded to a whole number for display
    pub fn rounded_percentage(&self) -> i64 {
        self.percentage().round() as i64
    }

    pub fn remaining(&self) -> f64 {
        (self.goal - self.saved).max(0.0)
    }
}

/// The `limit` most recent statements, newest first. Undated statements sort last.
pub fn recent_statements(statements: &[BankStatement], limit: usize) -> Vec<&BankStatement> {
    let mut sorted: Vec<&BankStatement> = statements.iter().collect();
    sorted.sort_by(|a, b| b.record_date().cmp(&a.record_date()).then(b.id.cmp(&a.id)));
    sorted.truncate(limit);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement(id: i64, entry_type: EntryType, entry_id: i64, value: f64, date: &str) -> BankStatement {
        BankStatement {
            id,
            user_id: 42,
            entry_type,
            entry_id,
            value,
            description: String::new(),
            date: date.to_string(),
            created_at: None,
        }
    }

    #[test]
    fn test_summary_totals() {
        let statements = vec![
            statement(1, EntryType::Credit, 1, 3000.0, "2025-04-01"),
            statement(2, EntryType::Debit, 1, 500.0, "2025-04-02"),
            statement(3, EntryType::Debit, 3, 1500.0, "2025-04-05"),
            statement(4, EntryType::Credit, 2, 1000.0, "2025-04-06"),
            statement(5, EntryType::Credit, 9, 5.0, "2025-04-07"),
        ];
        let summary = DashboardSummary::from_statements(&statements);

        assert_eq!(summary.total_credits, 4005.0);
        assert_eq!(summary.total_debits, 2000.0);
        assert_eq!(summary.balance(), 2005.0);
        assert_eq!(summary.total_for(EntryKind::Transactions), 2500.0);
        assert_eq!(summary.total_for(EntryKind::FixedCosts), -1500.0);
        assert_eq!(summary.total_for(EntryKind::Investments), 1000.0);
        assert_eq!(summary.total_for(EntryKind::Payments), 0.0);
        assert_eq!(summary.uncategorized, 5.0);
        assert_eq!(summary.statement_count, 5);
    }

    #[test]
    fn test_goal_progress() {
        let progress = GoalProgress::new(6214.0, 10000.0).unwrap();
        assert!((progress.percentage() - 62.14).abs() < 1e-9);
        assert_eq!(progress.rounded_percentage(), 62);
        assert_eq!(progress.remaining(), 3786.0);

        let exceeded = GoalProgress::new(12000.0, 10000.0).unwrap();
        assert_eq!(exceeded.rounded_percentage(), 120);
        assert_eq!(exceeded.remaining(), 0.0);

        assert_eq!(GoalProgress::new(500.0, 0.0), None);
        assert_eq!(GoalProgress::new(500.0, -10.0), None);
    }

    #[test]
    fn test_recent_statements_newest_first() {
        let statements = vec![
            statement(1, EntryType::Credit, 1, 1.0, "2025-04-01"),
            statement(2, EntryType::Credit, 1, 1.0, "bad"),
            statement(3, EntryType::Credit, 1, 1.0, "2025-04-09T08:00:00Z"),
            statement(4, EntryType::Credit, 1, 1.0, "2025-04-03"),
        ];
        let recent: Vec<i64> = recent_statements(&statements, 3).iter().map(|s| s.id).collect();
        assert_eq!(recent, vec![3, 4, 1]);
    }
}
