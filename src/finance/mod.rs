//! The finance API surface: its route contracts and the handlers mounted
//! behind them.

mod accounts;
pub mod contracts;
mod organizations;

pub use accounts::{Account, AccountPatch, AccountStore, AccountType, AccountsModule};
pub use organizations::{OrganizationView, OrganizationsModule};
