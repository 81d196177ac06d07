//! Transaction management for the budgeting application.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Validation of submitted transaction forms
//! - Database functions for storing and querying transactions
//! - Route handlers for the transaction API

mod core;
mod create_transaction_endpoint;
mod form;
mod transactions_endpoint;

pub use core::{
    NewRecurrence, Transaction, TransactionBuilder, TransactionKind, count_transactions,
    create_transaction, create_transaction_table, get_all_transactions, get_transaction,
};
pub use create_transaction_endpoint::create_transaction_endpoint;
pub use form::TransactionForm;
pub use transactions_endpoint::get_transactions_endpoint;
