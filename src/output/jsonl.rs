// src/output/jsonl.rs

use anyhow::{Context, Result};
use std::io::Write;

use super::RecordSink;
use crate::resolve::FieldsInfo;

/// One JSON object per line, keys in schema order, unset fields `null`.
pub struct JsonlSink<W: Write + Send> {
    out: W,
    written: usize,
}

impl<W: Write + Send> JsonlSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> RecordSink for JsonlSink<W> {
    fn write(&mut self, record: &FieldsInfo) -> Result<()> {
        serde_json::to_writer(&mut self.out, record).context("serialising record")?;
        self.out.write_all(b"\n").context("writing record")?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush().context("flushing json lines output")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{process::FieldValue, schema::parse_schema};
    use chrono::NaiveDate;

    #[test]
    fn writes_one_object_per_line() -> Result<()> {
        let schema = parse_schema("obs_id,string,true,-\nt_min,date,false,-\ns_ra,double,true,-\n", "test")?;
        let mut first = FieldsInfo::from_schema(&schema);
        first
            .get_mut("obs_id")
            .unwrap()
            .resolve(FieldValue::String("a".into()));
        first.get_mut("t_min").unwrap().resolve(FieldValue::Date(
            NaiveDate::from_ymd_opt(2022, 11, 18)
                .unwrap()
                .and_hms_opt(3, 12, 47)
                .unwrap(),
        ));
        let second = FieldsInfo::from_schema(&schema);

        let mut sink = JsonlSink::new(Vec::new());
        sink.write(&first)?;
        sink.write(&second)?;
        sink.finish()?;
        assert_eq!(sink.written(), 2);

        let text = String::from_utf8(sink.into_inner())?;
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                r#"{"obs_id":"a","t_min":"2022-11-18T03:12:47","s_ra":null}"#,
                r#"{"obs_id":null,"t_min":null,"s_ra":null}"#,
            ]
        );
        Ok(())
    }
}
