// src/output/columnar.rs

use anyhow::{Context, Result};
use arrow::array::{
    ArrayRef, Float64Array, Int64Array, StringArray, TimestampMicrosecondArray,
};
use arrow::datatypes::{DataType, Schema as ArrowSchema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::info;

use super::RecordSink;
use crate::{
    process::FieldValue,
    resolve::FieldsInfo,
    schema::{build_arrow_schema, SchemaTable},
};

/// Buffers rows and writes them as a single SNAPPY-compressed batch on
/// [`finish`](RecordSink::finish).
pub struct ParquetSink {
    path: PathBuf,
    schema: Arc<ArrowSchema>,
    writer: Option<ArrowWriter<BufWriter<File>>>,
    rows: Vec<Vec<Option<FieldValue>>>,
}

impl ParquetSink {
    pub fn create(path: &Path, schema: &SchemaTable) -> Result<Self> {
        let arrow_schema = build_arrow_schema(schema);
        let file = File::create(path)
            .with_context(|| format!("creating parquet file {}", path.display()))?;
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();
        let writer = ArrowWriter::try_new(BufWriter::new(file), arrow_schema.clone(), Some(props))
            .context("creating ArrowWriter for records")?;
        Ok(Self {
            path: path.to_path_buf(),
            schema: arrow_schema,
            writer: Some(writer),
            rows: Vec::new(),
        })
    }

    fn build_batch(&self) -> Result<RecordBatch> {
        let columns: Vec<ArrayRef> = self
            .schema
            .fields()
            .iter()
            .enumerate()
            .map(|(col, field)| column_array(field.data_type(), self.rows.iter().map(|r| r[col].as_ref())))
            .collect();
        RecordBatch::try_new(self.schema.clone(), columns).context("building record batch")
    }
}

fn column_array<'a>(
    data_type: &DataType,
    values: impl Iterator<Item = Option<&'a FieldValue>>,
) -> ArrayRef {
    match data_type {
        DataType::Int64 => Arc::new(
            values
                .map(|v| v.and_then(FieldValue::as_i64))
                .collect::<Int64Array>(),
        ),
        DataType::Float64 => Arc::new(
            values
                .map(|v| v.and_then(FieldValue::as_f64))
                .collect::<Float64Array>(),
        ),
        DataType::Timestamp(_, _) => Arc::new(
            values
                .map(|v| match v {
                    Some(FieldValue::Date(dt)) => Some(dt.and_utc().timestamp_micros()),
                    _ => None,
                })
                .collect::<TimestampMicrosecondArray>(),
        ),
        _ => Arc::new(
            values
                .map(|v| v.map(|v| v.to_string()))
                .collect::<StringArray>(),
        ),
    }
}

impl RecordSink for ParquetSink {
    fn write(&mut self, record: &FieldsInfo) -> Result<()> {
        self.rows
            .push(record.iter().map(|r| r.value().cloned()).collect());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };
        let batch = self.build_batch()?;
        writer.write(&batch).context("writing record batch")?;
        writer.close().context("closing ArrowWriter for records")?;
        info!(rows = self.rows.len(), path = %self.path.display(), "wrote parquet output");
        self.rows.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;
    use chrono::NaiveDate;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use crate::schema::parse_schema;

    #[test]
    fn writes_typed_nullable_columns() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("records.parquet");
        let schema = parse_schema(
            "obs_id,string,true,-\nfile_size,integer,true,-\ns_ra,double,true,-\nt_min,date,false,-\n",
            "test",
        )?;

        let mut full = FieldsInfo::from_schema(&schema);
        full.get_mut("obs_id").unwrap().resolve(FieldValue::String("jw01".into()));
        full.get_mut("file_size").unwrap().resolve(FieldValue::Integer(8640));
        full.get_mut("s_ra").unwrap().resolve(FieldValue::Double(53.25));
        full.get_mut("t_min").unwrap().resolve(FieldValue::Date(
            NaiveDate::from_ymd_opt(2022, 11, 18).unwrap().and_hms_opt(0, 0, 1).unwrap(),
        ));
        let empty = FieldsInfo::from_schema(&schema);

        let mut sink = ParquetSink::create(&path, &schema)?;
        sink.write(&full)?;
        sink.write(&empty)?;
        sink.finish()?;

        let mut reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&path)?)?.build()?;
        let batch = reader.next().unwrap()?;
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 4);

        let ids = batch.column(0).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(ids.value(0), "jw01");
        assert!(ids.is_null(1));
        let sizes = batch.column(1).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(sizes.value(0), 8640);
        let ras = batch.column(2).as_any().downcast_ref::<Float64Array>().unwrap();
        assert_eq!(ras.value(0), 53.25);
        assert!(ras.is_null(1));
        let times = batch
            .column(3)
            .as_any()
            .downcast_ref::<TimestampMicrosecondArray>()
            .unwrap();
        assert_eq!(times.value(0), 1_668_729_601_000_000);
        Ok(())
    }
}
