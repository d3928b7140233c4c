//! Flat tabular view of one loaded entity.

use std::io;
use std::path::Path;

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

use crate::flatten::flatten;

/// Rows of dotted-path cells with the union of columns in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatTable {
    columns: IndexSet<String>,
    rows: Vec<IndexMap<String, String>>,
}

impl FlatTable {
    pub fn from_records(records: &[Value]) -> Self {
        let mut table = Self::default();
        for record in records {
            table.push(flatten(record));
        }
        table
    }

    pub fn push(&mut self, row: IndexMap<String, String>) {
        for column in row.keys() {
            if !self.columns.contains(column) {
                self.columns.insert(column.clone());
            }
        }
        self.rows.push(row);
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn write_csv<W: io::Write>(&self, writer: W) -> csv::Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(&self.columns)?;
        for row in &self.rows {
            csv.write_record(
                self.columns
                    .iter()
                    .map(|column| row.get(column).map(String::as_str).unwrap_or_default()),
            )?;
        }
        csv.flush()?;
        Ok(())
    }

    pub fn write_csv_file(&self, path: &Path) -> csv::Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_csv(file)
    }

    /// Render the table into an in-memory CSV buffer.
    pub fn to_csv_bytes(&self) -> csv::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn columns_are_unioned_in_order() {
        let table = FlatTable::from_records(&[
            json!({"a": 1, "b": {"c": "x"}}),
            json!({"a": 2, "d": true}),
        ]);
        let columns: Vec<_> = table.columns().collect();
        assert_eq!(columns, ["a", "b.c", "d"]);

        let bytes = table.to_csv_bytes().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "a,b.c,d\n1,x,\n2,,true\n");
    }
}
