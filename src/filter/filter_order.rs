use super::types::{FilterOrderInfo, SortDirection};

/// ORDER BY clause over a fixed set of columns
#[derive(Debug, Clone, Default)]
pub struct FilterOrder {
    infos: Vec<FilterOrderInfo>,
}

impl FilterOrder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn asc(mut self, column: &'static str) -> Self {
        self.infos.push(FilterOrderInfo { column, sort: SortDirection::Asc });
        self
    }

    pub fn desc(mut self, column: &'static str) -> Self {
        self.infos.push(FilterOrderInfo { column, sort: SortDirection::Desc });
        self
    }

    pub fn generate(&self) -> String {
        if self.infos.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = self
            .infos
            .iter()
            .map(|i| format!("{} {}", i.column, i.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }
}
