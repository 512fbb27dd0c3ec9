use super::error::FilterError;
use super::types::{FilterCondition, SqlParam};

/// Accumulates typed predicate clauses and renders them as a WHERE body with
/// numbered placeholders
#[derive(Debug, Clone, Default)]
pub struct FilterWhere {
    conditions: Vec<FilterCondition>,
}

impl FilterWhere {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, condition: FilterCondition) -> &mut Self {
        self.conditions.push(condition);
        self
    }

    pub fn raw(&mut self, sql: &'static str) -> &mut Self {
        self.push(FilterCondition::Raw(sql))
    }

    pub fn eq(&mut self, column: &'static str, value: SqlParam) -> &mut Self {
        self.push(FilterCondition::Eq { column, value })
    }

    /// Case-insensitive substring match over several columns. Blank terms add nothing.
    pub fn search(&mut self, columns: &'static [&'static str], term: Option<&str>) -> &mut Self {
        match term.map(str::trim) {
            Some(term) if !term.is_empty() && !columns.is_empty() => self.push(FilterCondition::Search {
                columns,
                term: term.to_string(),
            }),
            _ => self,
        }
    }

    /// Membership test. An empty value list adds nothing.
    pub fn any_of(&mut self, column: &'static str, values: Vec<String>) -> &mut Self {
        if values.is_empty() {
            return self;
        }
        self.push(FilterCondition::AnyOf { column, values })
    }

    pub fn template(&mut self, sql: &'static str, value: SqlParam) -> &mut Self {
        self.push(FilterCondition::Template { sql, value })
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Render the clauses joined by AND. Placeholders start after
    /// `starting_param_index` existing parameters.
    pub fn generate(&self, starting_param_index: usize) -> Result<(String, Vec<SqlParam>), FilterError> {
        let mut params = Vec::new();
        let mut sql_conditions = Vec::with_capacity(self.conditions.len());

        for condition in &self.conditions {
            let mut param = |value: SqlParam| {
                params.push(value);
                format!("${}", starting_param_index + params.len())
            };

            let sql = match condition {
                FilterCondition::Eq { column, value } => {
                    format!("{} = {}", column, param(value.clone()))
                }
                FilterCondition::Search { columns, term } => {
                    let placeholder = param(SqlParam::Text(like_pattern(term)));
                    let ors: Vec<String> = columns
                        .iter()
                        .map(|column| format!("{} ILIKE {}", column, placeholder))
                        .collect();
                    format!("({})", ors.join(" OR "))
                }
                FilterCondition::AnyOf { column, values } => {
                    format!("{} = ANY({})", column, param(SqlParam::TextArray(values.clone())))
                }
                FilterCondition::Template { sql, value } => {
                    if sql.matches("{}").count() != 1 {
                        return Err(FilterError::InvalidTemplate(sql));
                    }
                    sql.replace("{}", &param(value.clone()))
                }
                FilterCondition::Raw(sql) => sql.to_string(),
            };
            sql_conditions.push(sql);
        }

        let where_clause = if sql_conditions.is_empty() {
            "1=1".to_string()
        } else {
            sql_conditions.join(" AND ")
        };
        Ok((where_clause, params))
    }
}

/// Wrap a search term for ILIKE, escaping the pattern metacharacters
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_COLUMNS: &[&str] = &["b.name", "m.name", "a.serial_no"];

    #[test]
    fn empty_filter_renders_tautology() {
        let (sql, params) = FilterWhere::new().generate(0).unwrap();
        assert_eq!(sql, "1=1");
        assert!(params.is_empty());
    }

    #[test]
    fn search_reuses_one_placeholder_across_columns() {
        let mut filter = FilterWhere::new();
        filter.search(SEARCH_COLUMNS, Some("dell"));
        let (sql, params) = filter.generate(0).unwrap();
        assert_eq!(sql, "(b.name ILIKE $1 OR m.name ILIKE $1 OR a.serial_no ILIKE $1)");
        assert_eq!(params, vec![SqlParam::Text("%dell%".to_string())]);
    }

    #[test]
    fn blank_search_and_empty_lists_are_skipped() {
        let mut filter = FilterWhere::new();
        filter.search(SEARCH_COLUMNS, Some("   ")).search(SEARCH_COLUMNS, None).any_of("u.user_type::text", vec![]);
        assert!(filter.is_empty());
    }

    #[test]
    fn placeholders_continue_from_starting_index() {
        let mut filter = FilterWhere::new();
        filter
            .raw("a.archived_at IS NULL")
            .eq("m.asset_type::text", SqlParam::Text("laptop".into()))
            .any_of("u.user_type::text", vec!["intern".into(), "freelancer".into()]);
        let (sql, params) = filter.generate(2).unwrap();
        assert_eq!(
            sql,
            "a.archived_at IS NULL AND m.asset_type::text = $3 AND u.user_type::text = ANY($4)"
        );
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn template_substitutes_placeholder() {
        let mut filter = FilterWhere::new();
        filter.template(
            "EXISTS (SELECT 1 FROM user_roles r WHERE r.user_id = u.id AND r.role::text = ANY({}))",
            SqlParam::TextArray(vec!["admin".into()]),
        );
        let (sql, _) = filter.generate(0).unwrap();
        assert!(sql.ends_with("r.role::text = ANY($1))"));
    }

    #[test]
    fn template_without_placeholder_is_rejected() {
        let mut filter = FilterWhere::new();
        filter.template("u.id IS NOT NULL", SqlParam::BigInt(1));
        assert_eq!(
            filter.generate(0).unwrap_err(),
            FilterError::InvalidTemplate("u.id IS NOT NULL")
        );
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
