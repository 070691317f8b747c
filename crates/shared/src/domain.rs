use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(ProductId);
id_newtype!(PostId);

impl FromStr for PostId {
    type Err = DomainError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        raw.trim()
            .parse::<i64>()
            .map(PostId)
            .map_err(|_| DomainError::InvalidSlug(raw.to_string()))
    }
}

/// Field the remote search endpoint orders results by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Title,
    Price,
    Rating,
}

impl SortField {
    pub const ALL: [SortField; 3] = [SortField::Title, SortField::Price, SortField::Rating];

    pub fn as_query_value(self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::Price => "price",
            SortField::Rating => "rating",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortField::Title => "Title",
            SortField::Price => "Price",
            SortField::Rating => "Rating",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query_value())
    }
}

impl FromStr for SortField {
    type Err = DomainError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        SortField::ALL
            .into_iter()
            .find(|field| field.as_query_value() == normalized)
            .ok_or_else(|| DomainError::UnknownSortField(raw.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_query_value(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    /// Label of the control that switches away from this order.
    pub fn toggle_label(self) -> &'static str {
        match self {
            SortOrder::Asc => "Sort Descending",
            SortOrder::Desc => "Sort Ascending",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query_value())
    }
}

impl FromStr for SortOrder {
    type Err = DomainError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            _ => Err(DomainError::UnknownSortOrder(raw.to_string())),
        }
    }
}

/// Search term plus ordering; fully determines the next search request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryState {
    pub search_term: String,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl QueryState {
    pub fn new(search_term: impl Into<String>, sort_by: SortField, sort_order: SortOrder) -> Self {
        Self {
            search_term: search_term.into(),
            sort_by,
            sort_order,
        }
    }
}
