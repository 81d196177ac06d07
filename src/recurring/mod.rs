//! Recurring transactions and the job that generates their transactions.

mod deactivate_endpoint;
mod list_endpoint;
mod materialize;
mod process_endpoint;
mod template;

pub use deactivate_endpoint::deactivate_recurring_endpoint;
pub use list_endpoint::get_recurring_transactions_endpoint;
pub use materialize::{
    MaterializationSummary, materialize_for_today, materialize_recurring_transactions,
};
pub use process_endpoint::process_recurring_endpoint;
pub use template::RecurringTemplate;
