//! Core category domain types.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{Error, database_id::CategoryId, transaction::TransactionKind};

/// The longest allowed category name, in characters.
pub const MAX_CATEGORY_NAME_LENGTH: usize = 30;

/// A validated, non-empty category name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::InvalidCategoryName] if `name` is
    /// empty or longer than [MAX_CATEGORY_NAME_LENGTH] characters after trimming.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::InvalidCategoryName("name cannot be empty".to_owned()))
        } else if name.chars().count() > MAX_CATEGORY_NAME_LENGTH {
            Err(Error::InvalidCategoryName(format!(
                "name must be at most {MAX_CATEGORY_NAME_LENGTH} characters"
            )))
        } else {
            Ok(Self(name.to_owned()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is a valid name, e.g. when
    /// reading a name back from the database.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A hex color code such as "#1A2B3C".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryColor(String);

impl CategoryColor {
    /// Create a category color.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::InvalidCategoryColor] if `color`
    /// is not a '#' followed by six hex digits.
    pub fn new(color: &str) -> Result<Self, Error> {
        let color = color.trim();

        match color.strip_prefix('#') {
            Some(digits) if digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit()) => {
                Ok(Self(color.to_owned()))
            }
            _ => Err(Error::InvalidCategoryColor(color.to_owned())),
        }
    }

    /// Create a category color without validation.
    pub fn new_unchecked(color: &str) -> Self {
        Self(color.to_owned())
    }
}

impl AsRef<str> for CategoryColor {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A category for grouping transactions (e.g., 'Groceries', 'Salary').
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The display name of the category.
    pub name: CategoryName,
    /// Whether the category is for income or expenses.
    pub kind: TransactionKind,
    /// The color used to display the category.
    pub color: CategoryColor,
}

/// The data submitted for creating a category.
#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryForm {
    /// The category name.
    pub name: String,
    /// Whether the category is for income or expenses.
    pub kind: TransactionKind,
    /// A hex color code such as "#1A2B3C".
    pub color: String,
}


#[cfg(test)]
mod category_color_tests {
    use crate::{Error, category::CategoryColor};

    #[test]
    fn accepts_mixed_case_hex() {
        assert!(CategoryColor::new("#a1B2c3").is_ok());
    }

    #[test]
    fn rejects_missing_hash() {
        assert_eq!(
            CategoryColor::new("a1b2c3"),
            Err(Error::InvalidCategoryColor("a1b2c3".to_owned()))
        );
    }

    #[test]
    fn rejects_short_code() {
        assert!(CategoryColor::new("#fff").is_err());
    }

    #[test]
    fn rejects_non_hex_digits() {
        assert!(CategoryColor::new("#12345g").is_err());
    }
}
