//! DataTable marshaling
//!
//! A `DataTable` is a named grid of dynamic values whose columns come from
//! the members of a reflected struct. Items go in member-wise and come back
//! out through the coercer, so a table read from CSV text can be turned into
//! typed items directly.

use std::ops::Index;

use morph_core::{
    Coercer, CoerceError, CoerceResult, FromValue, IntoValue, Record, Reflect, TypeHandle, Value,
};

use crate::csv::{read_records, CsvOptions, Layout};
use crate::error::CsvResult;

/// Column of a [`DataTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct DataColumn {
    /// Member name
    pub name: String,
    /// Display caption (member display name)
    pub caption: String,
    /// Member type
    pub ty: TypeHandle,
}

/// One row of a [`DataTable`], in column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataRow {
    values: Vec<Value>,
}

impl DataRow {
    /// Value at a column position.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// All values in column order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check whether the row has no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Index<usize> for DataRow {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.values[index]
    }
}

/// Named table of rows typed by a struct's members.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    /// Table name (short name of the row type)
    pub name: String,
    /// Columns in member declaration order
    pub columns: Vec<DataColumn>,
    /// Rows
    pub rows: Vec<DataRow>,
}

impl DataTable {
    /// Empty table with the columns of the struct type `ty`.
    pub fn for_type(ty: &TypeHandle) -> CoerceResult<Self> {
        let layout = layout_of(ty)?;
        let columns = layout
            .fields
            .iter()
            .zip(&layout.members)
            .map(|(field, member)| DataColumn {
                name: field.name.to_string(),
                caption: member.display_name().to_string(),
                ty: field.ty,
            })
            .collect();
        Ok(DataTable {
            name: ty.short_name(),
            columns,
            rows: Vec::new(),
        })
    }

    /// Build a table from records of the struct type `ty`.
    ///
    /// Members a record lacks become `Null` cells.
    pub fn from_records(ty: &TypeHandle, records: impl IntoIterator<Item = Record>) -> CoerceResult<Self> {
        let mut table = Self::for_type(ty)?;
        for record in records {
            let values = table
                .columns
                .iter()
                .map(|column| record.get(&column.name).cloned().unwrap_or(Value::Null))
                .collect();
            table.rows.push(DataRow { values });
        }
        log::debug!("built table {} with {} rows", table.name, table.rows.len());
        Ok(table)
    }

    /// Build a table from items of a reflected struct.
    pub fn from_items<T: Reflect + IntoValue>(items: impl IntoIterator<Item = T>) -> CoerceResult<Self> {
        let records = items
            .into_iter()
            .map(|item| Record::expect::<T>(item.into_value()))
            .collect::<CoerceResult<Vec<_>>>()?;
        Self::from_records(&TypeHandle::of::<T>(), records)
    }

    /// Read CSV text into a table of `ty`.
    ///
    /// Field errors tolerated by the options' policy are logged and dropped.
    pub fn from_csv(text: &str, ty: &TypeHandle, options: &CsvOptions) -> CsvResult<Self> {
        let import = read_records(text, ty, options)?;
        if !import.is_clean() {
            log::warn!("{} field errors while reading table {}", import.errors.len(), ty);
        }
        Ok(Self::from_records(ty, import.rows)?)
    }

    /// Convert every row to `T`, matching columns to members by name.
    pub fn to_items<T: Reflect + FromValue>(&self) -> CoerceResult<Vec<T>> {
        self.to_items_with(Coercer::global())
    }

    /// Convert every row to `T` using an explicit coercer.
    pub fn to_items_with<T: Reflect + FromValue>(&self, coercer: &Coercer) -> CoerceResult<Vec<T>> {
        self.rows
            .iter()
            .map(|row| {
                let entries = self
                    .columns
                    .iter()
                    .zip(row.values())
                    .map(|(column, value)| (column.name.clone(), value.clone()));
                coercer.coerce_into::<T>(Value::map(entries))
            })
            .collect()
    }

    /// Column position by name or caption, ignoring ASCII case.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
            .or_else(|| self.columns.iter().position(|c| c.caption.eq_ignore_ascii_case(name)))
    }

    /// Cell at `row` in the named column.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// Struct layout of `ty`; non-struct types cannot back a table.
fn layout_of(ty: &TypeHandle) -> CoerceResult<Layout> {
    Layout::of(Coercer::global(), ty).ok_or_else(|| CoerceError::TypeConversion {
        from: ty.short_name(),
        to: "DataTable".to_string(),
        value: ty.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use morph_core::{FieldInfo, Shape, ShapeKind};

    struct Line;

    impl Reflect for Line {
        fn shape() -> Shape {
            Shape::new(ShapeKind::Struct(vec![
                FieldInfo::new::<u32>("sku").with_display("SKU code"),
                FieldInfo::new::<u16>("qty"),
            ]))
        }
    }

    #[test]
    fn test_columns_from_members() {
        let table = DataTable::for_type(&TypeHandle::of::<Line>()).unwrap();
        assert_eq!(table.name, "Line");
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.columns[0].caption, "SKU code");
        assert_eq!(table.columns[1].caption, "qty");
        assert_eq!(table.column_index("sku code"), Some(0));
        assert_eq!(table.column_index("QTY"), Some(1));
        assert_eq!(table.column_index("price"), None);
    }

    #[test]
    fn test_from_records_fills_missing_cells() {
        let mut record = Record::of::<Line>();
        record.insert("sku", Value::U32(12));
        let table = DataTable::from_records(&TypeHandle::of::<Line>(), [record]).unwrap();
        assert_eq!(table.value(0, "sku"), Some(&Value::U32(12)));
        assert_eq!(table.value(0, "qty"), Some(&Value::Null));
        assert_eq!(table.value(1, "qty"), None);
    }

    #[test]
    fn test_from_csv() {
        let text = "SKU code,qty\n7,2\n8,x\n";
        let table = DataTable::from_csv(text, &TypeHandle::of::<Line>(), &CsvOptions::default()).unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[0][0], Value::U32(7));
        assert_eq!(table.rows[1][1], Value::U16(0));
    }

    #[test]
    fn test_non_struct_rejected() {
        assert!(DataTable::for_type(&TypeHandle::of::<String>()).is_err());
    }
}
