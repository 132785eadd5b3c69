//! Entity-level SQL client
//!
//! Maps reflected structs onto tables: one column per member, rows coming
//! back through the coercer so an `INTEGER` column fills a `u32`, an enum or
//! a `bool`, and a `TEXT` column fills a date.

use morph_core::{
    classify, Coercer, FromValue, IntoValue, Record, Reflect, ShapeKind, TypeHandle, Value,
};

use super::connection::{Connection, Row};
use super::filter::{quote_ident, resolve_column, Filter};
use crate::csv::Layout;
use crate::error::{SqlError, SqlResult};

/// A reflected struct stored in a table.
///
/// `KEY` names the primary-key member. On insert a null key (an `Option`
/// key set to `None`) is left out so the database assigns one.
pub trait Entity: Reflect + FromValue + IntoValue {
    /// Table name
    const TABLE: &'static str;
    /// Primary-key member
    const KEY: &'static str;
}

/// Declared columns of an entity, key included.
struct Columns {
    names: Vec<&'static str>,
    types: Vec<TypeHandle>,
    key: &'static str,
}

impl Columns {
    fn of<T: Entity>(coercer: &Coercer) -> SqlResult<Self> {
        let ty = TypeHandle::of::<T>();
        let layout = Layout::of(coercer, &ty).ok_or_else(|| SqlError::NotAnEntity(ty.to_string()))?;
        let names: Vec<&'static str> = layout.fields.iter().map(|f| f.name).collect();
        let types = layout.fields.iter().map(|f| f.ty).collect();
        let key = resolve_column(T::TABLE, &names, T::KEY)?;
        Ok(Columns { names, types, key })
    }

    /// Value of `record` for the column at `index`.
    ///
    /// Absent values (null or NaN) are refused for `NOT NULL` columns; SQLite
    /// would store a NaN `REAL` as `NULL` and fail the constraint.
    fn value(&self, table: &str, record: &Record, index: usize) -> SqlResult<Value> {
        let name = self.names[index];
        let value = record.get(name).cloned().unwrap_or(Value::Null);
        if value.is_absent() && !classify::is_nullable(&self.types[index]) {
            return Err(SqlError::AbsentValue {
                table: table.to_string(),
                column: name.to_string(),
            });
        }
        Ok(value)
    }

    fn list(&self) -> String {
        self.names
            .iter()
            .map(|n| quote_ident(n))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// SQL client over any [`Connection`].
pub struct DbClient<C: Connection> {
    conn: C,
    coercer: Coercer,
}

impl<C: Connection> DbClient<C> {
    /// Client using the global coercer.
    pub fn new(conn: C) -> Self {
        Self::with_coercer(conn, Coercer::global().clone())
    }

    /// Client with an explicit coercer.
    pub fn with_coercer(conn: C, coercer: Coercer) -> Self {
        DbClient { conn, coercer }
    }

    /// Underlying connection.
    pub fn connection(&self) -> &C {
        &self.conn
    }

    /// `CREATE TABLE IF NOT EXISTS` for `T`.
    ///
    /// Integer, boolean and enum members map to `INTEGER`, floats to
    /// `REAL`, everything else to `TEXT`. Non-optional members are
    /// `NOT NULL`.
    pub fn create_table<T: Entity>(&self) -> SqlResult<()> {
        let columns = Columns::of::<T>(&self.coercer)?;
        let definitions = columns
            .names
            .iter()
            .zip(&columns.types)
            .map(|(name, ty)| {
                let mut def = format!("{} {}", quote_ident(name), column_type(ty));
                if !classify::is_nullable(ty) {
                    def.push_str(" NOT NULL");
                }
                if *name == columns.key {
                    def.push_str(" PRIMARY KEY");
                }
                def
            })
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(T::TABLE),
            definitions
        );
        self.conn.execute(&sql, &[])?;
        Ok(())
    }

    /// Insert `item`, returning the row id of the new row.
    ///
    /// Fails with [`SqlError::AbsentValue`] when a non-optional member holds
    /// NaN.
    pub fn insert<T: Entity>(&self, item: T) -> SqlResult<i64> {
        let columns = Columns::of::<T>(&self.coercer)?;
        let record = Record::expect::<T>(item.into_value())?;

        let mut names = Vec::with_capacity(columns.names.len());
        let mut params = Vec::with_capacity(columns.names.len());
        for (index, name) in columns.names.iter().enumerate() {
            if *name == columns.key && record.get(name).map_or(true, Value::is_absent) {
                continue;
            }
            names.push(quote_ident(name));
            params.push(columns.value(T::TABLE, &record, index)?);
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(T::TABLE),
            names.join(", "),
            vec!["?"; params.len()].join(", ")
        );
        self.conn.insert(&sql, &params)
    }

    /// Update the row whose key matches `item`, returning rows affected.
    pub fn update<T: Entity>(&self, item: T) -> SqlResult<u64> {
        let columns = Columns::of::<T>(&self.coercer)?;
        let record = Record::expect::<T>(item.into_value())?;

        let mut assignments = Vec::new();
        let mut params = Vec::new();
        for (index, name) in columns.names.iter().enumerate() {
            if *name != columns.key {
                assignments.push(format!("{} = ?", quote_ident(name)));
                params.push(columns.value(T::TABLE, &record, index)?);
            }
        }
        params.push(record.get(columns.key).cloned().unwrap_or(Value::Null));

        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            quote_ident(T::TABLE),
            assignments.join(", "),
            quote_ident(columns.key)
        );
        self.conn.execute(&sql, &params)
    }

    /// Delete the row with the given key, returning rows affected.
    pub fn delete<T: Entity>(&self, key: impl IntoValue) -> SqlResult<u64> {
        let columns = Columns::of::<T>(&self.coercer)?;
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?",
            quote_ident(T::TABLE),
            quote_ident(columns.key)
        );
        self.conn.execute(&sql, &[key.into_value()])
    }

    /// Delete every row matching `filter`, returning rows affected.
    pub fn delete_where<T: Entity>(&self, filter: &Filter) -> SqlResult<u64> {
        let columns = Columns::of::<T>(&self.coercer)?;
        let clause = filter.render_where(T::TABLE, &columns.names)?;
        let sql = format!("DELETE FROM {}{}", quote_ident(T::TABLE), clause.sql);
        self.conn.execute(&sql, &clause.params)
    }

    /// Fetch one entity by key.
    pub fn get<T: Entity>(&self, key: impl IntoValue) -> SqlResult<Option<T>> {
        let columns = Columns::of::<T>(&self.coercer)?;
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ? LIMIT 1",
            columns.list(),
            quote_ident(T::TABLE),
            quote_ident(columns.key)
        );
        let row = self.conn.query(&sql, &[key.into_value()])?.into_iter().next();
        row.map(|row| self.entity_from(row)).transpose()
    }

    /// Fetch every entity matching `filter`.
    pub fn select<T: Entity>(&self, filter: &Filter) -> SqlResult<Vec<T>> {
        let columns = Columns::of::<T>(&self.coercer)?;
        let clause = filter.render(T::TABLE, &columns.names)?;
        let sql = format!(
            "SELECT {} FROM {}{}",
            columns.list(),
            quote_ident(T::TABLE),
            clause.sql
        );
        self.conn
            .query(&sql, &clause.params)?
            .into_iter()
            .map(|row| self.entity_from(row))
            .collect()
    }

    /// Number of rows matching `filter`.
    pub fn count<T: Entity>(&self, filter: &Filter) -> SqlResult<u64> {
        self.aggregate::<T, u64>("COUNT", None, filter)
    }

    /// `SUM(column)` over rows matching `filter`.
    ///
    /// Aggregates over no rows yield SQL `NULL`. An `Option` result reads
    /// that as `None`; any other `R` receives its default (`0`, `0.0`, `""`).
    /// The same holds for `avg`, `min` and `max`.
    pub fn sum<T: Entity, R: Reflect + FromValue>(&self, column: &str, filter: &Filter) -> SqlResult<R> {
        self.aggregate::<T, R>("SUM", Some(column), filter)
    }

    /// `AVG(column)` over rows matching `filter`.
    pub fn avg<T: Entity, R: Reflect + FromValue>(&self, column: &str, filter: &Filter) -> SqlResult<R> {
        self.aggregate::<T, R>("AVG", Some(column), filter)
    }

    /// `MIN(column)` over rows matching `filter`.
    pub fn min<T: Entity, R: Reflect + FromValue>(&self, column: &str, filter: &Filter) -> SqlResult<R> {
        self.aggregate::<T, R>("MIN", Some(column), filter)
    }

    /// `MAX(column)` over rows matching `filter`.
    pub fn max<T: Entity, R: Reflect + FromValue>(&self, column: &str, filter: &Filter) -> SqlResult<R> {
        self.aggregate::<T, R>("MAX", Some(column), filter)
    }

    fn entity_from<T: Entity>(&self, row: Row) -> SqlResult<T> {
        let value = Value::map(row.into_entries());
        self.coercer.coerce_into::<T>(value).map_err(SqlError::from)
    }

    fn aggregate<T: Entity, R: Reflect + FromValue>(
        &self,
        function: &str,
        column: Option<&str>,
        filter: &Filter,
    ) -> SqlResult<R> {
        let columns = Columns::of::<T>(&self.coercer)?;
        let target = match column {
            Some(name) => quote_ident(resolve_column(T::TABLE, &columns.names, name)?),
            None => "*".to_string(),
        };
        let clause = filter.render_where(T::TABLE, &columns.names)?;
        let sql = format!(
            "SELECT {}({}) FROM {}{}",
            function,
            target,
            quote_ident(T::TABLE),
            clause.sql
        );
        let scalar = self
            .conn
            .query(&sql, &clause.params)?
            .into_iter()
            .next()
            .and_then(|row| row.into_entries().next())
            .map(|(_, value)| value)
            .ok_or(SqlError::NoRows)?;
        Ok(self.coercer.coerce_into::<R>(scalar)?)
    }
}

impl<C: Connection + std::fmt::Debug> std::fmt::Debug for DbClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbClient").field("conn", &self.conn).finish()
    }
}

/// SQLite storage class for a member type, looking through `Option`.
fn column_type(ty: &TypeHandle) -> &'static str {
    let core = match ty.shape().kind {
        ShapeKind::Optional(inner) => inner,
        _ => *ty,
    };
    if classify::is_float(&core) {
        "REAL"
    } else if classify::is_numeric(&core, false) || classify::is_boolean(&core) || classify::is_enum(&core) {
        "INTEGER"
    } else {
        "TEXT"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_types() {
        assert_eq!(column_type(&TypeHandle::of::<u32>()), "INTEGER");
        assert_eq!(column_type(&TypeHandle::of::<Option<bool>>()), "INTEGER");
        assert_eq!(column_type(&TypeHandle::of::<f32>()), "REAL");
        assert_eq!(column_type(&TypeHandle::of::<String>()), "TEXT");
        assert_eq!(column_type(&TypeHandle::of::<chrono::NaiveDate>()), "TEXT");
    }
}
