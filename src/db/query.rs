// src/db/query.rs
// DOCUMENTATION: Translation of HTTP query strings into SQL clauses
// PURPOSE: Shared filter/sort/projection/pagination handling for list endpoints
//
// Query grammar, shared by every list endpoint:
//   ?difficulty=easy&price[lte]=500   filtering (eq and gte/gt/lte/lt)
//   ?sort=-ratings_average,price      sorting, "-" prefix for descending
//   ?fields=name,price,summary        response projection
//   ?page=2&limit=10                  pagination
// Column names are resolved against a per-resource whitelist that also fixes
// the literal type, so arbitrary SQL can never reach the database.

use std::collections::HashMap;

use crate::errors::ApiError;

/// Query keys that are never treated as filters
const RESERVED_PARAMS: [&str; 4] = ["page", "sort", "limit", "fields"];

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 100;

/// How literals for a column are parsed and rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Numeric,
    Text,
    Boolean,
}

/// Whitelist entry: API parameter name, SQL expression it maps to, and type
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub column: &'static str,
    pub kind: ColumnType,
}

/// Per-resource whitelist plus the default sort order
#[derive(Debug, Clone, Copy)]
pub struct ResourceColumns {
    pub columns: &'static [ColumnSpec],
    pub default_sort: &'static str,
}

impl ResourceColumns {
    fn find(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl FilterOp {
    fn sql(self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
        }
    }

    fn parse(s: &str) -> Option<FilterOp> {
        match s {
            "gt" => Some(FilterOp::Gt),
            "gte" => Some(FilterOp::Gte),
            "lt" => Some(FilterOp::Lt),
            "lte" => Some(FilterOp::Lte),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Filter {
    column: &'static str,
    op: FilterOp,
    literal: String,
}

/// Parsed and validated query options, ready to render as SQL fragments
#[derive(Debug)]
pub struct QueryOptions {
    filters: Vec<Filter>,
    sort: Vec<(&'static str, bool)>,
    fields: Option<Vec<String>>,
    pub page: i64,
    pub limit: i64,
}

impl QueryOptions {
    /// Parse raw query parameters against a resource whitelist
    /// Unknown filter or sort names are a client error; unknown projection
    /// names are ignored
    pub fn from_params(
        params: &HashMap<String, String>,
        spec: &ResourceColumns,
    ) -> Result<QueryOptions, ApiError> {
        let mut filters = Vec::new();

        for (key, value) in params {
            if RESERVED_PARAMS.contains(&key.as_str()) {
                continue;
            }

            let (name, op) = split_operator(key)?;
            let column = spec
                .find(name)
                .ok_or_else(|| ApiError::InvalidInput(format!("Cannot filter on '{}'", name)))?;

            filters.push(Filter {
                column: column.column,
                op,
                literal: render_literal(value, column)?,
            });
        }

        // Deterministic WHERE ordering regardless of HashMap iteration
        filters.sort_by(|a, b| a.column.cmp(b.column));

        let sort_param = params
            .get("sort")
            .map(String::as_str)
            .unwrap_or(spec.default_sort);
        let mut sort = Vec::new();
        for part in sort_param.split(',').filter(|p| !p.is_empty()) {
            let (name, descending) = match part.strip_prefix('-') {
                Some(rest) => (rest, true),
                None => (part, false),
            };
            let column = spec
                .find(name)
                .ok_or_else(|| ApiError::InvalidInput(format!("Cannot sort on '{}'", name)))?;
            sort.push((column.column, descending));
        }

        let fields = params.get("fields").map(|f| {
            f.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect()
        });

        let page = params
            .get("page")
            .and_then(|p| p.parse::<i64>().ok())
            .unwrap_or(1)
            .max(1);

        let limit = params
            .get("limit")
            .and_then(|l| l.parse::<i64>().ok())
            .unwrap_or(DEFAULT_LIMIT)
            .clamp(1, MAX_LIMIT);

        Ok(QueryOptions {
            filters,
            sort,
            fields,
            page,
            limit,
        })
    }

    /// Rendered filter conditions, one per entry
    pub fn where_clauses(&self) -> Vec<String> {
        self.filters
            .iter()
            .map(|f| format!("{} {} {}", f.column, f.op.sql(), f.literal))
            .collect()
    }

    /// Full ORDER BY clause
    pub fn order_by(&self) -> String {
        let parts: Vec<String> = self
            .sort
            .iter()
            .map(|(column, descending)| {
                if *descending {
                    format!("{} DESC", column)
                } else {
                    format!("{} ASC", column)
                }
            })
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }

    /// LIMIT/OFFSET clause from page and limit
    pub fn limit_offset(&self) -> String {
        format!("LIMIT {} OFFSET {}", self.limit, (self.page - 1) * self.limit)
    }

    /// Apply the `fields` projection to one serialized item
    /// The id is always kept; unknown names are ignored
    pub fn project(&self, mut value: serde_json::Value) -> serde_json::Value {
        let fields = match &self.fields {
            Some(fields) => fields,
            None => return value,
        };

        if let serde_json::Value::Object(map) = &mut value {
            map.retain(|key, _| key == "id" || fields.iter().any(|f| f == key));
        }
        value
    }
}

/// Split "price[gte]" into ("price", Gte); bare keys are equality
fn split_operator(key: &str) -> Result<(&str, FilterOp), ApiError> {
    match key.find('[') {
        None => Ok((key, FilterOp::Eq)),
        Some(open) => {
            let close = key
                .rfind(']')
                .filter(|end| *end == key.len() - 1 && *end > open)
                .ok_or_else(|| {
                    ApiError::InvalidInput(format!("Malformed filter parameter '{}'", key))
                })?;
            let op = FilterOp::parse(&key[open + 1..close]).ok_or_else(|| {
                ApiError::InvalidInput(format!(
                    "Unknown filter operator in '{}' (expected gte, gt, lte or lt)",
                    key
                ))
            })?;
            Ok((&key[..open], op))
        }
    }
}

/// Render a filter value as a SQL literal according to the column type
/// Numeric values must parse and be finite; text is quote-escaped
fn render_literal(value: &str, column: &ColumnSpec) -> Result<String, ApiError> {
    match column.kind {
        ColumnType::Numeric => {
            let number: f64 = value.parse().map_err(|_| {
                ApiError::InvalidInput(format!("'{}' expects a numeric value", column.name))
            })?;
            if !number.is_finite() {
                return Err(ApiError::InvalidInput(format!(
                    "'{}' expects a finite number",
                    column.name
                )));
            }
            Ok(number.to_string())
        }
        ColumnType::Boolean => {
            let flag: bool = value.parse().map_err(|_| {
                ApiError::InvalidInput(format!("'{}' expects true or false", column.name))
            })?;
            Ok(if flag { "TRUE" } else { "FALSE" }.to_string())
        }
        ColumnType::Text => Ok(format!("'{}'", value.replace('\'', "''"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: ResourceColumns = ResourceColumns {
        columns: &[
            ColumnSpec {
                name: "price",
                column: "t.price",
                kind: ColumnType::Numeric,
            },
            ColumnSpec {
                name: "difficulty",
                column: "t.difficulty",
                kind: ColumnType::Text,
            },
            ColumnSpec {
                name: "paid",
                column: "b.paid",
                kind: ColumnType::Boolean,
            },
            ColumnSpec {
                name: "created_at",
                column: "t.created_at",
                kind: ColumnType::Numeric,
            },
        ],
        default_sort: "-created_at",
    };

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn operators_translate_to_sql() {
        let opts = QueryOptions::from_params(
            &params(&[("price[gte]", "400"), ("difficulty", "easy")]),
            &COLUMNS,
        )
        .unwrap();

        let clauses = opts.where_clauses();
        assert!(clauses.contains(&"t.price >= 400".to_string()));
        assert!(clauses.contains(&"t.difficulty = 'easy'".to_string()));
    }

    #[test]
    fn reserved_params_are_not_filters() {
        let opts = QueryOptions::from_params(
            &params(&[
                ("page", "2"),
                ("limit", "10"),
                ("sort", "price"),
                ("fields", "name"),
            ]),
            &COLUMNS,
        )
        .unwrap();
        assert!(opts.where_clauses().is_empty());
    }

    #[test]
    fn unknown_filter_column_is_rejected() {
        let err = QueryOptions::from_params(&params(&[("password_hash", "x")]), &COLUMNS);
        assert!(err.is_err());
    }

    #[test]
    fn unknown_operator_is_rejected() {
        let err = QueryOptions::from_params(&params(&[("price[regex]", "1")]), &COLUMNS);
        assert!(err.is_err());
    }

    #[test]
    fn numeric_columns_reject_text_values() {
        let err = QueryOptions::from_params(&params(&[("price[lte]", "cheap")]), &COLUMNS);
        assert!(err.is_err());
    }

    #[test]
    fn text_literals_are_quote_escaped() {
        let opts =
            QueryOptions::from_params(&params(&[("difficulty", "ea'sy; DROP TABLE")]), &COLUMNS)
                .unwrap();
        assert_eq!(
            opts.where_clauses(),
            vec!["t.difficulty = 'ea''sy; DROP TABLE'".to_string()]
        );
    }

    #[test]
    fn boolean_literals_render_as_keywords() {
        let opts = QueryOptions::from_params(&params(&[("paid", "true")]), &COLUMNS).unwrap();
        assert_eq!(opts.where_clauses(), vec!["b.paid = TRUE".to_string()]);
    }

    #[test]
    fn sort_parses_direction_prefixes() {
        let opts =
            QueryOptions::from_params(&params(&[("sort", "-price,difficulty")]), &COLUMNS).unwrap();
        assert_eq!(opts.order_by(), "ORDER BY t.price DESC, t.difficulty ASC");
    }

    #[test]
    fn default_sort_applies_when_missing() {
        let opts = QueryOptions::from_params(&params(&[]), &COLUMNS).unwrap();
        assert_eq!(opts.order_by(), "ORDER BY t.created_at DESC");
    }

    #[test]
    fn unknown_sort_column_is_rejected() {
        assert!(QueryOptions::from_params(&params(&[("sort", "secret_column")]), &COLUMNS).is_err());
    }

    #[test]
    fn pagination_defaults_and_clamps() {
        let opts = QueryOptions::from_params(&params(&[]), &COLUMNS).unwrap();
        assert_eq!(opts.limit_offset(), "LIMIT 100 OFFSET 0");

        let opts =
            QueryOptions::from_params(&params(&[("page", "3"), ("limit", "10")]), &COLUMNS).unwrap();
        assert_eq!(opts.limit_offset(), "LIMIT 10 OFFSET 20");

        let opts =
            QueryOptions::from_params(&params(&[("page", "-1"), ("limit", "5000")]), &COLUMNS)
                .unwrap();
        assert_eq!(opts.page, 1);
        assert_eq!(opts.limit, 100);
    }

    #[test]
    fn projection_keeps_id_and_requested_fields() {
        let opts =
            QueryOptions::from_params(&params(&[("fields", "price, difficulty")]), &COLUMNS).unwrap();
        let value = serde_json::json!({
            "id": "abc",
            "price": 400,
            "difficulty": "easy",
            "summary": "hidden"
        });

        let projected = opts.project(value);
        let map = projected.as_object().unwrap();
        assert_eq!(map.len(), 3);
        assert!(map.contains_key("id"));
        assert!(map.contains_key("price"));
        assert!(!map.contains_key("summary"));
    }

    #[test]
    fn no_fields_param_means_no_projection() {
        let opts = QueryOptions::from_params(&params(&[]), &COLUMNS).unwrap();
        let value = serde_json::json!({"id": "abc", "summary": "kept"});
        assert_eq!(opts.project(value.clone()), value);
    }

    #[test]
    fn malformed_bracket_is_rejected() {
        assert!(QueryOptions::from_params(&params(&[("price[gte", "4")]), &COLUMNS).is_err());
        assert!(QueryOptions::from_params(&params(&[("price[]", "4")]), &COLUMNS).is_err());
    }
}
