//! Command-line arguments.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use finboard_core::models::{EntryKind, EntryType, TransactionType};
use finboard_core::RecordFilter;

#[derive(Debug, Parser)]
#[command(name = "finboard", version, about = "Personal finance dashboard")]
pub struct Cli {
    /// Backend base URL (overrides the config file)
    #[arg(long, global = true, env = "FINBOARD_API_URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and store the session
    Login {
        /// Account email (defaults to the last one used)
        #[arg(long, env = "FINBOARD_EMAIL")]
        email: Option<String>,
    },
    /// Clear the stored session
    Logout,
    /// Show whether a valid session exists
    Status,
    /// Create an account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
    },
    /// Balance, per-card totals and recent activity
    Dashboard {
        /// Number of recent entries to show
        #[arg(long, default_value_t = 5)]
        recent: usize,
    },
    /// Bank statement entries behind the dashboard cards
    #[command(subcommand)]
    Statements(StatementsCommand),
    /// Income and expense transactions
    #[command(subcommand)]
    Transactions(TransactionsCommand),
    /// Investments
    #[command(subcommand)]
    Investments(InvestmentsCommand),
    /// Dashboard notes
    #[command(subcommand)]
    Notes(NotesCommand),
    /// Show the signed-in user's profile
    Profile,
    /// Show progress toward the savings goal, or set a new goal
    Goal {
        /// New goal amount
        #[arg(long)]
        set: Option<f64>,
    },
}

#[derive(Debug, Subcommand)]
pub enum StatementsCommand {
    List {
        #[arg(long, value_enum)]
        card: Option<Card>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    Add {
        #[arg(long, value_enum, default_value_t = Card::Today)]
        card: Card,
        #[arg(long, value_enum, default_value_t = Side::Income)]
        side: Side,
        #[arg(long)]
        amount: f64,
        #[arg(long, default_value = "")]
        description: String,
    },
    Delete {
        id: i64,
    },
}

#[derive(Debug, Subcommand)]
pub enum TransactionsCommand {
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },
    Add {
        #[arg(long, value_enum, default_value_t = Side::Income)]
        side: Side,
        #[arg(long)]
        amount: f64,
        #[arg(long, default_value = "")]
        description: String,
        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        category: Option<i64>,
    },
    Show {
        id: i64,
    },
    Update {
        id: i64,
        #[arg(long, value_enum)]
        side: Option<Side>,
        #[arg(long)]
        amount: Option<f64>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Debug, Subcommand)]
pub enum InvestmentsCommand {
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },
    Add {
        #[arg(long)]
        amount: f64,
        /// Expected return in percent
        #[arg(long, default_value_t = 0.0)]
        return_percentage: f64,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<i64>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    Update {
        id: i64,
        #[arg(long)]
        amount: Option<f64>,
        #[arg(long)]
        return_percentage: Option<f64>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Debug, Subcommand)]
pub enum NotesCommand {
    List,
    Add {
        text: String,
        #[arg(long)]
        due: Option<NaiveDate>,
    },
    Edit {
        id: i64,
        text: String,
        #[arg(long)]
        due: Option<NaiveDate>,
    },
    Delete {
        id: i64,
    },
}

/// Dashboard card an entry is booked against
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Card {
    Today,
    Future,
    Investments,
    FixedCosts,
}

impl From<Card> for EntryKind {
    fn from(card: Card) -> Self {
        match card {
            Card::Today => EntryKind::Transactions,
            Card::Future => EntryKind::Payments,
            Card::Investments => EntryKind::Investments,
            Card::FixedCosts => EntryKind::FixedCosts,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Side {
    Income,
    Expense,
}

impl From<Side> for EntryType {
    fn from(side: Side) -> Self {
        match side {
            Side::Income => EntryType::Credit,
            Side::Expense => EntryType::Debit,
        }
    }
}

impl From<Side> for TransactionType {
    fn from(side: Side) -> Self {
        match side {
            Side::Income => TransactionType::Income,
            Side::Expense => TransactionType::Expense,
        }
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Calendar month (1-12)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,
    #[arg(long)]
    pub min: Option<f64>,
    #[arg(long)]
    pub max: Option<f64>,
    /// First day to include (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,
    /// Last day to include (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,
}

impl From<FilterArgs> for RecordFilter {
    fn from(args: FilterArgs) -> Self {
        Self {
            month: args.month,
            min_amount: args.min,
            max_amount: args.max,
            start_date: args.from,
            end_date: args.to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_filtered_listing() {
        let cli = Cli::try_parse_from([
            "finboard", "statements", "list", "--card", "fixed-costs", "--month", "4", "--min", "100",
            "--from", "2025-04-01",
        ])
        .unwrap();

        match cli.command {
            Command::Statements(StatementsCommand::List { card, filter }) => {
                assert_eq!(card, Some(Card::FixedCosts));
                let filter = RecordFilter::from(filter);
                assert_eq!(filter.month, Some(4));
                assert_eq!(filter.min_amount, Some(100.0));
                assert_eq!(filter.start_date, NaiveDate::from_ymd_opt(2025, 4, 1));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_goal_and_investment_update() {
        let cli = Cli::try_parse_from(["finboard", "goal", "--set", "10000"]).unwrap();
        assert!(matches!(cli.command, Command::Goal { set: Some(goal) } if goal == 10000.0));

        let cli = Cli::try_parse_from([
            "finboard", "investments", "update", "5", "--return-percentage", "8.5",
        ])
        .unwrap();
        match cli.command {
            Command::Investments(InvestmentsCommand::Update { id, amount, return_percentage, .. }) => {
                assert_eq!(id, 5);
                assert_eq!(amount, None);
                assert_eq!(return_percentage, Some(8.5));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_month_out_of_range_is_rejected() {
        assert!(Cli::try_parse_from(["finboard", "transactions", "list", "--month", "13"]).is_err());
    }
}
