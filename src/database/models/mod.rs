pub mod ledger;
pub mod user;

pub use ledger::{Income, Ledger, LedgerChanges, LedgerEntry, LedgerKind, LedgerRow, NewLedgerEntry, Spending};
pub use user::{NewUser, User, UserChanges, UserRow, Users};
