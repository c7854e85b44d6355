//! SQL query construction utilities
//!
//! `PaginatedQuery` centralizes the filtering, text search, ordering and
//! pagination every list endpoint performs, so handlers stay declarative.

use sqlx::query::QueryAs;
use sqlx::{Postgres, QueryBuilder};

/// Paginated query builder for list endpoints
///
/// ```ignore
/// let mut query = PaginatedQuery::new("SELECT * FROM patients WHERE 1=1");
/// query
///     .filter_eq("statut", params.statut)
///     .search_ilike(&["nom", "prenom", "email"], params.search.as_deref())
///     .order_by_param(params.ordering.as_deref(), &["nom", "prenom"], ("date_enregistrement", "DESC"))
///     .paginate(params.pagination.page, params.pagination.page_size);
/// let rows: Vec<Patient> = query.build_query_as().fetch_all(&pool).await?;
/// ```
pub struct PaginatedQuery<'a> {
    query: QueryBuilder<'a, Postgres>,
    page: u32,
    page_size: u32,
}

impl<'a> PaginatedQuery<'a> {
    /// Create a builder over a base query that already carries a WHERE clause
    pub fn new(base_query: &'static str) -> Self {
        Self {
            query: QueryBuilder::new(base_query),
            page: 1,
            page_size: 20,
        }
    }

    /// Add an equality filter (only if value is Some)
    pub fn filter_eq<T>(&mut self, column: &str, value: Option<T>) -> &mut Self
    where
        T: for<'q> sqlx::Encode<'q, Postgres> + sqlx::Type<Postgres> + Send + Sync + 'static,
    {
        if let Some(val) = value {
            self.query.push(format!(" AND {column} = "));
            self.query.push_bind(val);
        }
        self
    }

    /// Case-insensitive substring search across the given columns
    ///
    /// Equivalent of the old API's free-text `search` parameter: any listed
    /// column matching makes the row match.
    pub fn search_ilike(&mut self, columns: &[&str], term: Option<&str>) -> &mut Self {
        if let Some(term) = term {
            let trimmed = term.trim();
            if trimmed.is_empty() {
                return self;
            }
            let pattern = format!("%{trimmed}%");
            self.query.push(" AND (");
            for (i, column) in columns.iter().enumerate() {
                if i > 0 {
                    self.query.push(" OR ");
                }
                self.query.push(format!("{column}::text ILIKE "));
                self.query.push_bind(pattern.clone());
            }
            self.query.push(")");
        }
        self
    }

    /// Add an ORDER BY clause
    pub fn order_by(&mut self, column: &str, direction: &str) -> &mut Self {
        self.query.push(format!(" ORDER BY {column} {direction}"));
        self
    }

    /// Apply a client-supplied `ordering` parameter against a whitelist
    ///
    /// A leading `-` selects descending order. Unknown fields fall back to
    /// the resource default, so the column name interpolated into the query
    /// always comes from the whitelist.
    pub fn order_by_param(
        &mut self,
        ordering: Option<&str>,
        allowed: &[&str],
        default: (&str, &str),
    ) -> &mut Self {
        if let Some(raw) = ordering {
            let (field, direction) = match raw.strip_prefix('-') {
                Some(field) => (field, "DESC"),
                None => (raw, "ASC"),
            };
            if let Some(column) = allowed.iter().find(|c| **c == field) {
                return self.order_by(column, direction);
            }
        }
        self.order_by(default.0, default.1)
    }

    /// Apply pagination
    pub fn paginate(&mut self, page: Option<u32>, page_size: Option<u32>) -> &mut Self {
        self.page = page.unwrap_or(1).max(1);
        self.page_size = page_size.unwrap_or(20).clamp(1, 100);
        let offset = (self.page - 1) * self.page_size;
        self.query.push(" LIMIT ");
        self.query.push_bind(i64::from(self.page_size));
        self.query.push(" OFFSET ");
        self.query.push_bind(i64::from(offset));
        self
    }

    /// Build the final query for a typed fetch
    pub fn build_query_as<T>(&mut self) -> QueryAs<'_, Postgres, T, sqlx::postgres::PgArguments>
    where
        T: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow>,
    {
        self.query.build_query_as()
    }

    /// Underlying query builder for advanced cases
    pub fn query_builder(&mut self) -> &mut QueryBuilder<'a, Postgres> {
        &mut self.query
    }

    /// Current page
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Current page size
    pub fn page_size(&self) -> u32 {
        self.page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql(query: &mut PaginatedQuery<'_>) -> String {
        query.query_builder().sql().to_string()
    }

    #[test]
    fn filter_eq_none_adds_nothing() {
        let mut query = PaginatedQuery::new("SELECT * FROM patients WHERE 1=1");
        query.filter_eq("statut", None::<String>);
        assert_eq!(sql(&mut query), "SELECT * FROM patients WHERE 1=1");
    }

    #[test]
    fn filter_eq_some_binds() {
        let mut query = PaginatedQuery::new("SELECT * FROM patients WHERE 1=1");
        query.filter_eq("statut", Some("actif"));
        assert!(sql(&mut query).contains("AND statut ="));
    }

    #[test]
    fn search_spans_all_columns() {
        let mut query = PaginatedQuery::new("SELECT * FROM patients WHERE 1=1");
        query.search_ilike(&["nom", "prenom"], Some("dup"));
        let rendered = sql(&mut query);
        assert!(rendered.contains("nom::text ILIKE"));
        assert!(rendered.contains(" OR prenom::text ILIKE"));
    }

    #[test]
    fn blank_search_ignored() {
        let mut query = PaginatedQuery::new("SELECT * FROM patients WHERE 1=1");
        query.search_ilike(&["nom"], Some("   "));
        assert_eq!(sql(&mut query), "SELECT * FROM patients WHERE 1=1");
    }

    #[test]
    fn ordering_param_descending() {
        let mut query = PaginatedQuery::new("SELECT * FROM patients WHERE 1=1");
        query.order_by_param(Some("-nom"), &["nom", "prenom"], ("date_enregistrement", "DESC"));
        assert!(sql(&mut query).ends_with("ORDER BY nom DESC"));
    }

    #[test]
    fn ordering_param_rejects_unknown_field() {
        let mut query = PaginatedQuery::new("SELECT * FROM patients WHERE 1=1");
        query.order_by_param(
            Some("password; DROP TABLE patients"),
            &["nom", "prenom"],
            ("date_enregistrement", "DESC"),
        );
        assert!(sql(&mut query).ends_with("ORDER BY date_enregistrement DESC"));
    }

    #[test]
    fn pagination_clamps() {
        let mut query = PaginatedQuery::new("SELECT * FROM patients WHERE 1=1");
        query.paginate(Some(0), Some(500));
        assert_eq!(query.page(), 1);
        assert_eq!(query.page_size(), 100);
    }

    #[test]
    fn chaining() {
        let mut query = PaginatedQuery::new("SELECT * FROM facturations WHERE 1=1");
        query
            .filter_eq("statut", Some("impaye"))
            .search_ilike(&["description"], Some("consult"))
            .order_by_param(None, &["montant"], ("date_facturation", "DESC"))
            .paginate(Some(2), Some(25));
        assert_eq!(query.page(), 2);
        assert_eq!(query.page_size(), 25);
        let rendered = sql(&mut query);
        assert!(rendered.contains("ORDER BY date_facturation DESC"));
        assert!(rendered.contains("LIMIT"));
    }
}
