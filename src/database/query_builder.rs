use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::QueryAs;
use sqlx::{FromRow, PgPool, Postgres};

use crate::database::manager::DatabaseError;
use crate::filter::{Filter, SqlParam, SqlResult};

/// Runs a [`Filter`] against the pool, binding its parameters in order
pub struct QueryBuilder<T> {
    sql: SqlResult,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> QueryBuilder<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(filter: &Filter) -> Result<Self, DatabaseError> {
        let sql = filter
            .to_sql()
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        Ok(Self {
            sql,
            _phantom: std::marker::PhantomData,
        })
    }

    pub async fn select_all(self, pool: &PgPool) -> Result<Vec<T>, DatabaseError> {
        let mut q = sqlx::query_as::<_, T>(&self.sql.query);
        for p in self.sql.params.iter() {
            q = bind_param_query_as(q, p);
        }
        let rows = q.fetch_all(pool).await?;
        Ok(rows)
    }

    pub async fn select_optional(self, pool: &PgPool) -> Result<Option<T>, DatabaseError> {
        let mut q = sqlx::query_as::<_, T>(&self.sql.query);
        for p in self.sql.params.iter() {
            q = bind_param_query_as(q, p);
        }
        let row = q.fetch_optional(pool).await?;
        Ok(row)
    }
}

pub fn bind_param_query_as<'q, O>(
    q: QueryAs<'q, Postgres, O, PgArguments>,
    p: &SqlParam,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    match p {
        SqlParam::Text(s) => q.bind(s.clone()),
        SqlParam::TextArray(values) => q.bind(values.clone()),
        SqlParam::BigInt(i) => q.bind(*i),
        SqlParam::Uuid(id) => q.bind(*id),
    }
}
