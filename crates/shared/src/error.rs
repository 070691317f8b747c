use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("unknown sort field '{0}' (expected title, price or rating)")]
    UnknownSortField(String),
    #[error("unknown sort order '{0}' (expected asc or desc)")]
    UnknownSortOrder(String),
    #[error("invalid post slug '{0}': expected a numeric post id")]
    InvalidSlug(String),
}
