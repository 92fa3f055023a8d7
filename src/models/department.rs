use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Department {
    pub id: i64,
    pub active: Option<bool>,
    pub created_at: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub name: Option<String>,
}

impl Default for Department {
    fn default() -> Self {
        Self {
            id: 0,
            active: Some(true),
            created_at: None,
            created_by: None,
            name: None,
        }
    }
}

impl Department {
    /// Unsaved department; the store assigns `id` and `created_at` on add.
    pub fn new(name: impl Into<String>, created_by: Option<String>) -> Self {
        Self {
            name: Some(name.into()),
            created_by,
            ..Self::default()
        }
    }
}

/// One page of a filtered listing together with the size of the whole
/// filtered set.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total_count: i64,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total_count: i64) -> Self {
        Self { items, total_count }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Newest,
    Name,
    NameDesc,
}

impl SortOrder {
    pub fn order_by(self) -> &'static str {
        match self {
            SortOrder::Newest => "id DESC",
            SortOrder::Name => "name ASC, id DESC",
            SortOrder::NameDesc => "name DESC, id DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "Name" => SortOrder::Name,
            "NameDesc" => SortOrder::NameDesc,
            _ => SortOrder::Newest,
        })
    }
}

/// Normalized search term; `None` means the listing is unfiltered.
pub fn search_term(query: &str) -> Option<&str> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// LIKE pattern matching `term` as a literal substring, escaped with `\`.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_department_is_active_and_unsaved() {
        let department = Department::default();
        assert_eq!(department.id, 0);
        assert_eq!(department.active, Some(true));
        assert!(department.created_at.is_none());
    }

    #[test]
    fn sort_order_falls_back_to_newest() {
        assert_eq!("Name".parse::<SortOrder>().unwrap(), SortOrder::Name);
        assert_eq!("NameDesc".parse::<SortOrder>().unwrap(), SortOrder::NameDesc);
        assert_eq!("".parse::<SortOrder>().unwrap(), SortOrder::Newest);
        assert_eq!("Id".parse::<SortOrder>().unwrap(), SortOrder::Newest);
    }

    #[test]
    fn blank_queries_do_not_filter() {
        assert_eq!(search_term(""), None);
        assert_eq!(search_term("   "), None);
        assert_eq!(search_term(" Sales "), Some("Sales"));
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Sales"), "%Sales%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
