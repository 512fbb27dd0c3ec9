use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum FilterError {
    #[error("Invalid predicate template (expected one '{{}}' placeholder): {0}")]
    InvalidTemplate(&'static str),

    #[error("Invalid limit: {0}")]
    InvalidLimit(i64),

    #[error("Invalid offset: {0}")]
    InvalidOffset(i64),
}
