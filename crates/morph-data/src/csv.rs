//! CSV marshaling
//!
//! Maps CSV rows onto reflected structs. Columns are matched to members by
//! header (member name first, then display name, ignoring ASCII case) or by
//! position when the input has no header row. Every field goes through the
//! [`Coercer`], so `"17"` lands in a `u32` and `"Red"` in an enum.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use morph_core::{
    Coercer, CoerceError, FieldInfo, FromValue, IntoValue, MemberDescriptor, Record, Reflect,
    TypeHandle, Value,
};
use serde::{Deserialize, Serialize};

use crate::error::{CsvError, CsvResult};

/// What to do when a field fails to convert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldPolicy {
    /// Keep the member's default and record the error
    #[default]
    SkipField,
    /// Drop the whole row and record the error
    SkipRow,
    /// Fail the import
    Abort,
}

/// CSV dialect and error policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    /// Field separator (ASCII)
    pub delimiter: char,
    /// First row holds column names
    pub has_headers: bool,
    /// Trim whitespace around fields and headers
    pub trim: bool,
    /// Per-field failure handling
    pub field_policy: FieldPolicy,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            has_headers: true,
            trim: true,
            field_policy: FieldPolicy::SkipField,
        }
    }
}

impl CsvOptions {
    /// Set the delimiter.
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set whether the input starts with a header row.
    pub fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    /// Set the field policy.
    pub fn with_policy(mut self, field_policy: FieldPolicy) -> Self {
        self.field_policy = field_policy;
        self
    }

    fn delimiter_byte(&self) -> CsvResult<u8> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(CsvError::InvalidDelimiter(self.delimiter))
        }
    }
}

/// A field that failed to convert but did not abort the import.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    /// 1-based input line
    pub line: u64,
    /// Member the column maps to
    pub column: String,
    /// Conversion failure
    pub error: CoerceError,
}

/// Imported rows plus the field errors tolerated along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvImport<T> {
    /// Successfully mapped rows
    pub rows: Vec<T>,
    /// Errors recorded under `SkipField` / `SkipRow`
    pub errors: Vec<FieldError>,
}

impl<T> CsvImport<T> {
    /// No field errors were recorded.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    fn map_rows<U>(self, f: impl FnMut(T) -> CsvResult<U>) -> CsvResult<CsvImport<U>> {
        Ok(CsvImport {
            rows: self.rows.into_iter().map(f).collect::<CsvResult<Vec<_>>>()?,
            errors: self.errors,
        })
    }
}

// ============================================================================
// Reading
// ============================================================================

/// Struct fields and their cached member metadata, in declaration order.
pub(crate) struct Layout {
    pub(crate) fields: Vec<FieldInfo>,
    pub(crate) members: Vec<Arc<MemberDescriptor>>,
}

impl Layout {
    pub(crate) fn of(coercer: &Coercer, ty: &TypeHandle) -> Option<Self> {
        let descriptor = coercer.cache().descriptor(ty);
        let fields = descriptor.shape().fields()?.to_vec();
        let members = coercer.cache().members(ty);
        Some(Layout { fields, members })
    }

    /// Field index for a header: member name first, then display name.
    pub(crate) fn resolve(&self, header: &str) -> Option<usize> {
        self.members
            .iter()
            .position(|m| m.name().eq_ignore_ascii_case(header))
            .or_else(|| {
                self.members
                    .iter()
                    .position(|m| m.display_name().eq_ignore_ascii_case(header))
            })
    }
}

/// Read `text` as rows of the struct type `ty`.
pub fn read_records(text: &str, ty: &TypeHandle, options: &CsvOptions) -> CsvResult<CsvImport<Record>> {
    read_records_with(Coercer::global(), text, ty, options)
}

/// Read `text` as rows of `ty` using an explicit coercer.
pub fn read_records_with(
    coercer: &Coercer,
    text: &str,
    ty: &TypeHandle,
    options: &CsvOptions,
) -> CsvResult<CsvImport<Record>> {
    let layout = Layout::of(coercer, ty).ok_or_else(|| CsvError::NotAStruct(ty.to_string()))?;

    let mut reader = ::csv::ReaderBuilder::new()
        .delimiter(options.delimiter_byte()?)
        .has_headers(options.has_headers)
        .trim(if options.trim { ::csv::Trim::All } else { ::csv::Trim::None })
        .flexible(true)
        .from_reader(text.as_bytes());

    let columns: Vec<Option<usize>> = if options.has_headers {
        reader
            .headers()?
            .iter()
            .map(|header| {
                let index = layout.resolve(header);
                if index.is_none() {
                    log::debug!("CSV column '{}' maps to no member of {}", header, ty);
                }
                index
            })
            .collect()
    } else {
        (0..layout.fields.len()).map(Some).collect()
    };

    let mut rows = Vec::new();
    let mut errors = Vec::new();

    'rows: for result in reader.records() {
        let row = result?;
        let line = row.position().map_or(0, |p| p.line());
        let mut record = Record::new(*ty);

        for (raw, column) in row.iter().zip(&columns) {
            let Some(index) = *column else { continue };
            // empty fields fall back to the member default
            if raw.is_empty() {
                continue;
            }
            let field = &layout.fields[index];

            match coercer.coerce(Value::String(raw.to_string()), &field.ty) {
                Ok(coerced) => {
                    record.insert(field.name, coerced);
                }
                Err(source) => match options.field_policy {
                    FieldPolicy::Abort => {
                        return Err(CsvError::Field {
                            line,
                            column: field.name.to_string(),
                            source,
                        });
                    }
                    FieldPolicy::SkipField => {
                        log::warn!("line {}: skipping field '{}': {}", line, field.name, source);
                        errors.push(FieldError {
                            line,
                            column: field.name.to_string(),
                            error: source,
                        });
                    }
                    FieldPolicy::SkipRow => {
                        log::warn!("line {}: skipping row: {}", line, source);
                        errors.push(FieldError {
                            line,
                            column: field.name.to_string(),
                            error: source,
                        });
                        continue 'rows;
                    }
                },
            }
        }

        rows.push(complete(coercer, record, &layout)?);
    }

    log::debug!("read {} {} rows ({} field errors)", rows.len(), ty, errors.len());
    Ok(CsvImport { rows, errors })
}

/// Fill unmapped or skipped members with their defaults, in declaration order.
fn complete(coercer: &Coercer, mut partial: Record, layout: &Layout) -> CsvResult<Record> {
    let mut record = Record::new(partial.ty());
    for field in &layout.fields {
        let value = match partial.remove(field.name) {
            Some(value) => value,
            None => coercer.create_instance(&field.ty, &[])?,
        };
        record.insert(field.name, value);
    }
    Ok(record)
}

/// Read `text` as rows of `T`.
pub fn read<T: Reflect + FromValue>(text: &str, options: &CsvOptions) -> CsvResult<CsvImport<T>> {
    read_records(text, &TypeHandle::of::<T>(), options)?
        .map_rows(|record| Ok(T::from_value(Value::Record(record))?))
}

/// Read a CSV file as rows of `T`.
pub fn read_file<T: Reflect + FromValue>(
    path: impl AsRef<Path>,
    options: &CsvOptions,
) -> CsvResult<CsvImport<T>> {
    let text = fs::read_to_string(path)?;
    read(&text, options)
}

// ============================================================================
// Writing
// ============================================================================

/// Render records of the struct type `ty` as CSV.
///
/// The header row uses member display names; each field is converted to
/// text by the coercer.
pub fn write_records(records: &[Record], ty: &TypeHandle, options: &CsvOptions) -> CsvResult<String> {
    write_records_with(Coercer::global(), records, ty, options)
}

/// Render records of `ty` as CSV using an explicit coercer.
pub fn write_records_with(
    coercer: &Coercer,
    records: &[Record],
    ty: &TypeHandle,
    options: &CsvOptions,
) -> CsvResult<String> {
    let layout = Layout::of(coercer, ty).ok_or_else(|| CsvError::NotAStruct(ty.to_string()))?;
    let text_type = TypeHandle::of::<String>();

    let mut writer = ::csv::WriterBuilder::new()
        .delimiter(options.delimiter_byte()?)
        .from_writer(Vec::new());

    if options.has_headers {
        writer.write_record(layout.members.iter().map(|m| m.display_name()))?;
    }

    for record in records {
        let mut fields = Vec::with_capacity(layout.fields.len());
        for field in &layout.fields {
            let value = record.get(field.name).cloned().unwrap_or(Value::Null);
            let text = match coercer.coerce(value, &text_type)? {
                Value::String(s) => s,
                other => other.to_string(),
            };
            fields.push(text);
        }
        writer.write_record(&fields)?;
    }

    writer.flush()?;
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes)
        .map_err(|e| CsvError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// Render `items` as CSV.
pub fn write<T: Reflect + IntoValue>(
    items: impl IntoIterator<Item = T>,
    options: &CsvOptions,
) -> CsvResult<String> {
    let records = items
        .into_iter()
        .map(|item| Record::expect::<T>(item.into_value()))
        .collect::<Result<Vec<_>, _>>()?;
    write_records(&records, &TypeHandle::of::<T>(), options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use morph_core::{FieldInfo, MetadataCache, Shape, ShapeKind, SideTable};

    struct Reading;

    impl Reflect for Reading {
        fn shape() -> Shape {
            Shape::new(ShapeKind::Struct(vec![
                FieldInfo::new::<String>("sensor"),
                FieldInfo::new::<f64>("value").with_display("Reading"),
                FieldInfo::new::<Option<u8>>("quality"),
            ]))
        }
    }

    fn ty() -> TypeHandle {
        TypeHandle::of::<Reading>()
    }

    #[test]
    fn test_header_mapping_by_name_and_display() {
        let text = "SENSOR,reading,Quality,ignored\nt1,21.5,3,x\nt2,19,,y\n";
        let import = read_records(text, &ty(), &CsvOptions::default()).unwrap();
        assert!(import.is_clean());
        assert_eq!(import.rows.len(), 2);
        let first = &import.rows[0];
        assert_eq!(first.get("sensor"), Some(&Value::String("t1".into())));
        assert_eq!(first.get("value"), Some(&Value::F64(21.5)));
        assert_eq!(first.get("quality"), Some(&Value::U8(3)));
        assert_eq!(import.rows[1].get("quality"), Some(&Value::Null));
    }

    #[test]
    fn test_positional_without_headers() {
        let options = CsvOptions::default().with_headers(false).with_delimiter(';');
        let import = read_records("t1;1.25;7\n", &ty(), &options).unwrap();
        assert_eq!(import.rows[0].get("value"), Some(&Value::F64(1.25)));
        assert_eq!(import.rows[0].get("quality"), Some(&Value::U8(7)));
    }

    #[test]
    fn test_missing_columns_take_defaults() {
        let import = read_records("sensor\nt9\n", &ty(), &CsvOptions::default()).unwrap();
        let row = &import.rows[0];
        assert_eq!(row.len(), 3);
        assert_eq!(row.get("value"), Some(&Value::F64(0.0)));
        assert_eq!(row.get("quality"), Some(&Value::Null));
    }

    #[test]
    fn test_skip_field_policy() {
        let text = "sensor,value,quality\nt1,abc,300\nt2,2,1\n";
        let import = read_records(text, &ty(), &CsvOptions::default()).unwrap();
        assert_eq!(import.rows.len(), 2);
        assert_eq!(import.errors.len(), 2);
        assert_eq!(import.errors[0].line, 2);
        assert_eq!(import.errors[0].column, "value");
        assert_eq!(import.errors[1].column, "quality");
        assert_eq!(import.rows[0].get("value"), Some(&Value::F64(0.0)));
        assert_eq!(import.rows[0].get("quality"), Some(&Value::Null));
    }

    #[test]
    fn test_skip_row_policy() {
        let text = "sensor,value,quality\nt1,abc,1\nt2,2,1\n";
        let options = CsvOptions::default().with_policy(FieldPolicy::SkipRow);
        let import = read_records(text, &ty(), &options).unwrap();
        assert_eq!(import.rows.len(), 1);
        assert_eq!(import.rows[0].get("sensor"), Some(&Value::String("t2".into())));
        assert_eq!(import.errors.len(), 1);
    }

    #[test]
    fn test_abort_policy() {
        let text = "sensor,value,quality\nt1,1,1\nt2,oops,1\n";
        let options = CsvOptions::default().with_policy(FieldPolicy::Abort);
        let err = read_records(text, &ty(), &options).unwrap_err();
        match err {
            CsvError::Field { line, column, .. } => {
                assert_eq!(line, 3);
                assert_eq!(column, "value");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_write_uses_display_names() {
        let mut record = Record::new(ty());
        record.insert("sensor", Value::String("t1".into()));
        record.insert("value", Value::F64(2.5));
        record.insert("quality", Value::Null);
        let text = write_records(&[record], &ty(), &CsvOptions::default()).unwrap();
        assert_eq!(text, "sensor,Reading,quality\nt1,2.5,\n");
    }

    #[test]
    fn test_write_with_explicit_coercer() {
        let captions = SideTable::new();
        captions.display::<Reading>("sensor", "Sensor id");
        let cache = MetadataCache::new().with_provider(Arc::new(captions));
        let coercer = Coercer::new(Arc::new(cache), Default::default());

        let mut record = Record::new(ty());
        record.insert("sensor", Value::String("t9".into()));
        record.insert("value", Value::F64(1.0));
        let options = CsvOptions::default();
        let text = write_records_with(&coercer, &[record.clone()], &ty(), &options).unwrap();
        assert_eq!(text, "Sensor id,Reading,quality\nt9,1,\n");

        let global = write_records(&[record], &ty(), &options).unwrap();
        assert!(global.starts_with("sensor,Reading,quality\n"));
    }

    #[test]
    fn test_invalid_delimiter_and_non_struct() {
        let options = CsvOptions::default().with_delimiter('§');
        assert!(matches!(
            read_records("a\n", &ty(), &options),
            Err(CsvError::InvalidDelimiter('§'))
        ));
        assert!(matches!(
            read_records("a\n", &TypeHandle::of::<u32>(), &CsvOptions::default()),
            Err(CsvError::NotAStruct(_))
        ));
    }

    #[test]
    fn test_options_from_toml() {
        let options: CsvOptions = toml::from_str("delimiter = ';'\nfield_policy = 'skip_row'\n").unwrap();
        assert_eq!(options.delimiter, ';');
        assert_eq!(options.field_policy, FieldPolicy::SkipRow);
        assert!(options.has_headers);
    }
}
