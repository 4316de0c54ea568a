//! Row query construction
//!
//! [`SelectQuery`] is a builder for the remote store's row-filtered
//! queries. The network client renders it to REST query pairs; the local
//! store evaluates the same structure directly against in-memory rows.

/// A single row filter
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Column equals value
    Eq(String, String),
    /// Case-insensitive substring match on any of the columns
    SearchAny(Vec<String>, String),
}

/// Row-filtered query against a named collection
#[derive(Debug, Clone, Default)]
pub struct SelectQuery {
    select: Option<String>,
    filters: Vec<Filter>,
    order: Option<(String, bool)>,
    limit: Option<u32>,
    range: Option<(u32, u32)>,
}

impl SelectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Column projection, including embedded joins
    /// (e.g. `"*, category:categories(id,name,slug)"`).
    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.select = Some(columns.into());
        self
    }

    /// Add an equality filter.
    pub fn eq(mut self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push(Filter::Eq(column.into(), value.to_string()));
        self
    }

    /// Add a case-insensitive substring search over several columns
    /// (rendered as an `or=(col.ilike.*term*,...)` disjunction).
    pub fn search_any(mut self, columns: &[&str], term: impl Into<String>) -> Self {
        self.filters.push(Filter::SearchAny(
            columns.iter().map(|c| c.to_string()).collect(),
            term.into(),
        ));
        self
    }

    /// Add ordering.
    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some((column.into(), ascending));
        self
    }

    /// Limit the number of rows.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Inclusive row range for paging.
    pub fn range(mut self, from: u32, to: u32) -> Self {
        self.range = Some((from, to));
        self
    }

    // Accessors used by the evaluating clients.

    pub fn selection(&self) -> Option<&str> {
        self.select.as_deref()
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn ordering(&self) -> Option<(&str, bool)> {
        self.order.as_ref().map(|(c, asc)| (c.as_str(), *asc))
    }

    pub fn row_limit(&self) -> Option<u32> {
        // A reversed range is an empty window, not an underflow.
        let span = |(from, to): (u32, u32)| to.checked_sub(from).map_or(0, |d| d + 1);
        match (self.limit, self.range) {
            (Some(l), Some(range)) => Some(l.min(span(range))),
            (Some(l), None) => Some(l),
            (None, Some(range)) => Some(span(range)),
            (None, None) => None,
        }
    }

    pub fn row_offset(&self) -> u32 {
        self.range.map(|(from, _)| from).unwrap_or(0)
    }

    /// Render to REST query pairs.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(select) = &self.select {
            pairs.push(("select".to_string(), select.clone()));
        }
        for filter in &self.filters {
            match filter {
                Filter::Eq(column, value) => {
                    pairs.push((column.clone(), format!("eq.{value}")));
                }
                Filter::SearchAny(columns, term) => {
                    let clauses: Vec<String> = columns
                        .iter()
                        .map(|c| format!("{c}.ilike.*{term}*"))
                        .collect();
                    pairs.push(("or".to_string(), format!("({})", clauses.join(","))));
                }
            }
        }
        if let Some((column, ascending)) = &self.order {
            let dir = if *ascending { "asc" } else { "desc" };
            pairs.push(("order".to_string(), format!("{column}.{dir}")));
        }
        if let Some((from, _)) = self.range {
            pairs.push(("offset".to_string(), from.to_string()));
        }
        if let Some(limit) = self.row_limit() {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }
}
