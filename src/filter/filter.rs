use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{Page, SqlParam, SqlResult};

/// A list query: static SELECT ... FROM ... JOIN text followed by generated
/// WHERE, GROUP BY, ORDER BY and a bound LIMIT/OFFSET window
#[derive(Debug, Clone)]
pub struct Filter {
    base: &'static str,
    where_data: FilterWhere,
    group_by: Option<&'static str>,
    order: FilterOrder,
    page: Option<Page>,
}

impl Filter {
    pub fn new(base: &'static str) -> Self {
        Self {
            base,
            where_data: FilterWhere::new(),
            group_by: None,
            order: FilterOrder::new(),
            page: None,
        }
    }

    pub fn where_mut(&mut self) -> &mut FilterWhere {
        &mut self.where_data
    }

    pub fn group_by(mut self, columns: &'static str) -> Self {
        self.group_by = Some(columns);
        self
    }

    pub fn order(mut self, order: FilterOrder) -> Self {
        self.order = order;
        self
    }

    pub fn page(mut self, page: Page) -> Result<Self, FilterError> {
        if page.limit < 1 {
            return Err(FilterError::InvalidLimit(page.limit));
        }
        if page.offset < 0 {
            return Err(FilterError::InvalidOffset(page.offset));
        }
        self.page = Some(page);
        Ok(self)
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let (where_clause, mut params) = self.where_data.generate(0)?;

        let limit_clause = match self.page {
            Some(page) => {
                params.push(SqlParam::BigInt(page.limit));
                params.push(SqlParam::BigInt(page.offset));
                format!("LIMIT ${} OFFSET ${}", params.len() - 1, params.len())
            }
            None => String::new(),
        };

        let query = [
            self.base.trim().to_string(),
            format!("WHERE {}", where_clause),
            self.group_by.map(|g| format!("GROUP BY {}", g)).unwrap_or_default(),
            self.order.generate(),
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult { query, params })
    }
}
