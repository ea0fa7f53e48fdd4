//! Client-side record filtering for the statement, transaction, investment
//! and fixed-cost tables.
//!
//! Every criterion is optional; set criteria are combined with AND. Records
//! whose date cannot be parsed never match a date or month criterion.

use chrono::{Datelike, NaiveDate};

use crate::models::{BankStatement, FixedCost, Investment, Transaction};
use crate::utils::parse_date;

/// Something that can appear in a filtered table
pub trait Filterable {
    fn record_date(&self) -> Option<NaiveDate>;
    fn amount(&self) -> f64;
}

impl Filterable for BankStatement {
    fn record_date(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }

    fn amount(&self) -> f64 {
        self.value
    }
}

impl Filterable for Transaction {
    fn record_date(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }

    fn amount(&self) -> f64 {
        self.amount
    }
}

impl Filterable for Investment {
    fn record_date(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }

    fn amount(&self) -> f64 {
        self.amount
    }
}

impl Filterable for FixedCost {
    fn record_date(&self) -> Option<NaiveDate> {
        parse_date(&self.due_date)
    }

    fn amount(&self) -> f64 {
        self.amount
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    /// Calendar month, 1-12
    pub month: Option<u32>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    /// Inclusive
    pub start_date: Option<NaiveDate>,
    /// Inclusive
    pub end_date: Option<NaiveDate>,
}

impl RecordFilter {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches<T: Filterable + ?Sized>(&self, record: &T) -> bool {
        let amount = record.amount();
        if self.min_amount.is_some_and(|min| amount < min) {
            return false;
        }
        if self.max_amount.is_some_and(|max| amount > max) {
            return false;
        }

        if self.month.is_none() && self.start_date.is_none() && self.end_date.is_none() {
            return true;
        }

        let Some(date) = record.record_date() else {
            return false;
        };

        self.month.map_or(true, |month| date.month() == month)
            && self.start_date.map_or(true, |start| date >= start)
            && self.end_date.map_or(true, |end| date <= end)
    }

    pub fn apply<'a, T: Filterable>(&self, records: &'a [T]) -> Vec<&'a T> {
        records.iter().filter(|r| self.matches(*r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cost(id: i64, amount: f64, due_date: &str) -> FixedCost {
        FixedCost {
            id,
            description: format!("cost {}", id),
            amount,
            due_date: due_date.to_string(),
        }
    }

    fn ids(records: Vec<&FixedCost>) -> Vec<i64> {
        records.into_iter().map(|c| c.id).collect()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let costs = vec![cost(1, 1500.0, "2025-04-05"), cost(2, 100.0, "not a date")];
        let filter = RecordFilter::default();
        assert!(filter.is_empty());
        assert_eq!(ids(filter.apply(&costs)), vec![1, 2]);
    }

    #[test]
    fn test_amount_range_is_inclusive() {
        let costs = vec![
            cost(1, 99.99, "2025-04-01"),
            cost(2, 100.0, "2025-04-01"),
            cost(3, 1500.0, "2025-04-01"),
            cost(4, 1500.01, "2025-04-01"),
        ];
        let filter = RecordFilter {
            min_amount: Some(100.0),
            max_amount: Some(1500.0),
            ..Default::default()
        };
        assert_eq!(ids(filter.apply(&costs)), vec![2, 3]);
    }

    #[test]
    fn test_month_and_date_range_combine() {
        let costs = vec![
            cost(1, 10.0, "2025-03-31"),
            cost(2, 10.0, "2025-04-05T00:00:00.000Z"),
            cost(3, 10.0, "2025-04-20"),
            cost(4, 10.0, "2024-04-10"),
            cost(5, 10.0, "garbage"),
        ];

        let april = RecordFilter {
            month: Some(4),
            ..Default::default()
        };
        assert_eq!(ids(april.apply(&costs)), vec![2, 3, 4]);

        let april_2025_first_half = RecordFilter {
            month: Some(4),
            start_date: Some(day(2025, 4, 1)),
            end_date: Some(day(2025, 4, 15)),
            ..Default::default()
        };
        assert_eq!(ids(april_2025_first_half.apply(&costs)), vec![2]);
    }

    #[test]
    fn test_unparseable_date_fails_date_criteria_only() {
        let costs = vec![cost(1, 50.0, "garbage")];
        let by_amount = RecordFilter {
            min_amount: Some(10.0),
            ..Default::default()
        };
        assert_eq!(ids(by_amount.apply(&costs)), vec![1]);

        let by_start = RecordFilter {
            start_date: Some(day(2000, 1, 1)),
            ..Default::default()
        };
        assert!(by_start.apply(&costs).is_empty());
    }
}
