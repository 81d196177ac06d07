//! Categories for grouping transactions.

mod db;
mod domain;
mod endpoints;

pub use db::{create_category, create_category_table, get_all_categories, get_category};
pub use domain::{Category, CategoryColor, CategoryName};
pub use endpoints::{create_category_endpoint, get_categories_endpoint};
