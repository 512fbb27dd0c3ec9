use uuid::Uuid;

/// A bind parameter produced by the filter builder
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    TextArray(Vec<String>),
    BigInt(i64),
    Uuid(Uuid),
}

/// One typed predicate clause. Column names and SQL fragments are `'static`
/// so only compile-time SQL ever reaches the query text; user input travels
/// exclusively as bind parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterCondition {
    /// `column = $n`
    Eq { column: &'static str, value: SqlParam },
    /// `(c1 ILIKE $n OR c2 ILIKE $n ...)` with `%term%`
    Search { columns: &'static [&'static str], term: String },
    /// `column = ANY($n)`
    AnyOf { column: &'static str, values: Vec<String> },
    /// Static SQL with a single `{}` standing in for the placeholder
    Template { sql: &'static str, value: SqlParam },
    /// Static SQL without parameters
    Raw(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOrderInfo {
    pub column: &'static str,
    pub sort: SortDirection,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlParam>,
}

/// Limit/offset window for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// Pages are 1-based. A missing or out-of-range limit falls back to
    /// `default_limit`; a page below 1 is treated as the first page.
    pub fn new(page: Option<i64>, limit: Option<i64>, default_limit: i64, max_limit: i64) -> Self {
        let limit = match limit {
            Some(l) if (1..=max_limit).contains(&l) => l,
            _ => default_limit,
        };
        let page = page.unwrap_or(1).max(1);
        Self {
            limit,
            offset: (page - 1).saturating_mul(limit),
        }
    }
}
