//! Query filters
//!
//! A `Filter` collects `AND`-ed conditions, ordering and paging, and renders
//! them with positional `?` parameters. Column names are checked against the
//! entity's declared members when rendered, never spliced in unchecked.

use morph_core::{IntoValue, Value};

use crate::error::{SqlError, SqlResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    IsNull,
    IsNotNull,
}

impl Op {
    fn sql(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "<>",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::Like => "LIKE",
            Op::IsNull => "IS NULL",
            Op::IsNotNull => "IS NOT NULL",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Condition {
    column: String,
    op: Op,
    value: Option<Value>,
}

/// Conditions, ordering and paging for a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
    order: Vec<(String, bool)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

/// Rendered clause text and its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    /// SQL text starting with a space, or empty
    pub sql: String,
    /// Positional parameters in order
    pub params: Vec<Value>,
}

impl Filter {
    /// Empty filter (matches every row).
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, column: &str, op: Op, value: Option<Value>) -> Self {
        self.conditions.push(Condition {
            column: column.to_string(),
            op,
            value,
        });
        self
    }

    /// `column = value`; a null value renders as `IS NULL`.
    pub fn eq(self, column: &str, value: impl IntoValue) -> Self {
        match value.into_value() {
            v if v.is_absent() => self.push(column, Op::IsNull, None),
            v => self.push(column, Op::Eq, Some(v)),
        }
    }

    /// `column <> value`; a null value renders as `IS NOT NULL`.
    pub fn ne(self, column: &str, value: impl IntoValue) -> Self {
        match value.into_value() {
            v if v.is_absent() => self.push(column, Op::IsNotNull, None),
            v => self.push(column, Op::Ne, Some(v)),
        }
    }

    /// `column < value`
    pub fn lt(self, column: &str, value: impl IntoValue) -> Self {
        self.push(column, Op::Lt, Some(value.into_value()))
    }

    /// `column <= value`
    pub fn le(self, column: &str, value: impl IntoValue) -> Self {
        self.push(column, Op::Le, Some(value.into_value()))
    }

    /// `column > value`
    pub fn gt(self, column: &str, value: impl IntoValue) -> Self {
        self.push(column, Op::Gt, Some(value.into_value()))
    }

    /// `column >= value`
    pub fn ge(self, column: &str, value: impl IntoValue) -> Self {
        self.push(column, Op::Ge, Some(value.into_value()))
    }

    /// `column LIKE pattern`
    pub fn like(self, column: &str, pattern: &str) -> Self {
        self.push(column, Op::Like, Some(Value::String(pattern.to_string())))
    }

    /// `column IS NULL`
    pub fn is_null(self, column: &str) -> Self {
        self.push(column, Op::IsNull, None)
    }

    /// `column IS NOT NULL`
    pub fn is_not_null(self, column: &str) -> Self {
        self.push(column, Op::IsNotNull, None)
    }

    /// Sort by `column`, ascending or descending.
    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order.push((column.to_string(), ascending));
        self
    }

    /// Return at most `n` rows.
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Skip the first `n` rows.
    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Only the `WHERE` part, for statements that cannot sort or page.
    pub(crate) fn render_where(&self, table: &str, columns: &[&str]) -> SqlResult<Clause> {
        let mut sql = String::new();
        let mut params = Vec::new();
        for (i, condition) in self.conditions.iter().enumerate() {
            let column = resolve_column(table, columns, &condition.column)?;
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            sql.push_str(&quote_ident(column));
            sql.push(' ');
            sql.push_str(condition.op.sql());
            if let Some(value) = &condition.value {
                sql.push_str(" ?");
                params.push(value.clone());
            }
        }
        Ok(Clause { sql, params })
    }

    /// `WHERE`, `ORDER BY`, `LIMIT` and `OFFSET`, validated against `columns`.
    pub fn render(&self, table: &str, columns: &[&str]) -> SqlResult<Clause> {
        let mut clause = self.render_where(table, columns)?;

        for (i, (column, ascending)) in self.order.iter().enumerate() {
            let column = resolve_column(table, columns, column)?;
            clause.sql.push_str(if i == 0 { " ORDER BY " } else { ", " });
            clause.sql.push_str(&quote_ident(column));
            clause.sql.push_str(if *ascending { " ASC" } else { " DESC" });
        }

        match (self.limit, self.offset) {
            (None, None) => {}
            (limit, offset) => {
                // SQLite needs a LIMIT before OFFSET; -1 means unbounded
                clause.sql.push_str(" LIMIT ?");
                clause
                    .params
                    .push(limit.map_or(Value::I64(-1), |n| Value::I64(n.min(i64::MAX as u64) as i64)));
                if let Some(offset) = offset {
                    clause.sql.push_str(" OFFSET ?");
                    clause.params.push(Value::I64(offset.min(i64::MAX as u64) as i64));
                }
            }
        }
        Ok(clause)
    }
}

/// Declared column matching `name`, ignoring ASCII case.
pub(crate) fn resolve_column<'c>(table: &str, columns: &[&'c str], name: &str) -> SqlResult<&'c str> {
    columns
        .iter()
        .copied()
        .find(|c| c.eq_ignore_ascii_case(name))
        .ok_or_else(|| SqlError::UnknownColumn {
            table: table.to_string(),
            column: name.to_string(),
        })
}

/// Double-quoted SQL identifier.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &[&str] = &["id", "name", "price"];

    #[test]
    fn test_render_conditions() {
        let clause = Filter::new()
            .gt("Price", 10)
            .like("name", "A%")
            .is_not_null("id")
            .render("items", COLUMNS)
            .unwrap();
        assert_eq!(
            clause.sql,
            r#" WHERE "price" > ? AND "name" LIKE ? AND "id" IS NOT NULL"#
        );
        assert_eq!(clause.params, vec![Value::I32(10), Value::String("A%".into())]);
    }

    #[test]
    fn test_null_equality() {
        let clause = Filter::new()
            .eq("name", None::<String>)
            .ne("price", None::<f64>)
            .render("items", COLUMNS)
            .unwrap();
        assert_eq!(clause.sql, r#" WHERE "name" IS NULL AND "price" IS NOT NULL"#);
        assert!(clause.params.is_empty());
    }

    #[test]
    fn test_order_and_paging() {
        let clause = Filter::new()
            .order_by("price", false)
            .order_by("id", true)
            .offset(5)
            .render("items", COLUMNS)
            .unwrap();
        assert_eq!(clause.sql, r#" ORDER BY "price" DESC, "id" ASC LIMIT ? OFFSET ?"#);
        assert_eq!(clause.params, vec![Value::I64(-1), Value::I64(5)]);
    }

    #[test]
    fn test_unknown_column_rejected() {
        let err = Filter::new()
            .eq("id; DROP TABLE items", 1)
            .render("items", COLUMNS)
            .unwrap_err();
        assert!(matches!(err, SqlError::UnknownColumn { .. }));
        assert!(Filter::new().order_by("nope", true).render("items", COLUMNS).is_err());
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }
}
