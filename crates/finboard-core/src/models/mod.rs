//! Data models for finboard entities.
//!
//! - `BankStatement`, `Balance`: the ledger behind the dashboard cards
//! - `Transaction`: income/expense records
//! - `Investment`, `FixedCost`, `Note`, `User`
//!
//! Wire formats differ per endpoint (camelCase vs PascalCase); each model
//! carries its own serde mapping.

pub mod fixed_cost;
pub mod investment;
pub mod note;
pub mod statement;
pub mod transaction;
pub mod user;

pub use fixed_cost::FixedCost;
pub use investment::{Investment, InvestmentInput};
pub use note::{Note, NoteInput, NoteStatus};
pub use statement::{Balance, BankStatement, EntryKind, EntryType, NewStatement};
pub use transaction::{Transaction, TransactionInput, TransactionRecord, TransactionType};
pub use user::User;
