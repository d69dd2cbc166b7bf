//! Dataset writers: CSV for the training step, JSON for inspection, plus the
//! class call graph.

use std::io::Write;

use thiserror::Error;

use crate::dataset::Dataset;
use crate::graph::ClassGraph;
use crate::objects::{ObjectFeatures, ObjectTable};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

pub fn write_dataset<W: Write>(
    dataset: &Dataset,
    format: ExportFormat,
    writer: W,
) -> Result<(), ExportError> {
    match format {
        ExportFormat::Csv => write_csv(dataset, writer),
        ExportFormat::Json => write_json(dataset, writer),
    }
}

/// Header row plus one record per class, without an index column.
pub fn write_csv<W: Write>(dataset: &Dataset, writer: W) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(dataset.columns())?;
    for record in dataset.records() {
        wtr.write_record(record.iter().map(ToString::to_string))?;
    }
    wtr.flush()?;
    Ok(())
}

/// An array with one object per class, keyed by column name.
pub fn to_json(dataset: &Dataset) -> serde_json::Value {
    let columns = dataset.columns();
    let rows = dataset
        .records()
        .map(|record| {
            let object: serde_json::Map<String, serde_json::Value> = columns
                .iter()
                .zip(&record)
                .map(|(column, cell)| ((*column).to_string(), cell.to_json()))
                .collect();
            serde_json::Value::Object(object)
        })
        .collect();
    serde_json::Value::Array(rows)
}

pub fn write_json<W: Write>(dataset: &Dataset, mut writer: W) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(&mut writer, &to_json(dataset))?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Object features on their own, one row per recorded class.
pub fn write_object_table<W: Write>(
    table: &ObjectTable,
    format: ExportFormat,
    mut writer: W,
) -> Result<(), ExportError> {
    match format {
        ExportFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(writer);
            let mut header = vec!["className"];
            header.extend_from_slice(ObjectFeatures::COLUMNS);
            wtr.write_record(&header)?;
            for row in table.rows() {
                let mut record = vec![row.class_name.clone()];
                record.extend(row.cells().iter().map(ToString::to_string));
                wtr.write_record(&record)?;
            }
            wtr.flush()?;
        }
        ExportFormat::Json => {
            let rows: Vec<_> = table.rows().collect();
            serde_json::to_writer_pretty(&mut writer, &rows)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
    }
    Ok(())
}

pub fn write_class_graph<W: Write>(graph: &ClassGraph, mut writer: W) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(&mut writer, &graph.to_json())?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractorConfig;
    use crate::features::CallTreeExtractor;
    use crate::model::{CallNode, CallTree};
    use crate::objects::ObjectSnapshot;

    fn dataset() -> Dataset {
        let tree = CallTree::new(vec![
            CallNode::new("a.Main", "main", 1).with_child(CallNode::new("a.Util", "help", 2)),
        ]);
        let table = CallTreeExtractor::new(ExtractorConfig::default())
            .extract(&tree)
            .finalize();
        Dataset::new(table)
    }

    #[test]
    fn csv_has_header_and_rows() {
        let mut out = Vec::new();
        write_csv(&dataset(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("className,numIntCalls,numExtCalls,ratioInternalExternal"));
        assert!(lines[1].starts_with("a.Main,0,2,0,"));
        assert!(lines[2].starts_with("a.Util,0,0,-1,"));
    }

    #[test]
    fn json_rows_are_keyed_by_column() {
        let json = to_json(&dataset());
        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["className"], "a.Main");
        assert_eq!(rows[0]["numExtCalls"], 2);
        assert_eq!(rows[1]["ratioIncomingOutgoing"], -1.0);
    }

    #[test]
    fn object_table_csv_uses_camel_case_header() {
        let config = ExtractorConfig::default();
        let all = ObjectSnapshot::from_csv(
            b"Name,Instance Count,Size (bytes)\na.Home,2,3000\n",
            &config,
        )
        .unwrap();
        let table = ObjectTable::build(&all, &ObjectSnapshot::default());

        let mut out = Vec::new();
        write_object_table(&table, ExportFormat::Csv, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "className,numObjectsTotal,numObjectsDeallocated,percDeallocated,avgObjectSize\n\
             a.Home,2,0,0,1.5\n"
        );
    }

    #[test]
    fn class_graph_is_pretty_json() {
        let tree = CallTree::new(vec![
            CallNode::new("a.Main", "main", 1).with_child(CallNode::new("a.Util", "<init>", 2)),
        ]);
        let mut graph = ClassGraph::new();
        graph.add_trace("Startup", &tree, &ExtractorConfig::default());

        let mut out = Vec::new();
        write_class_graph(&graph, &mut out).unwrap();
        assert!(out.ends_with(b"}\n"));
        let doc: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(doc["elements"]["nodes"].as_array().map(Vec::len), Some(2));
        assert_eq!(doc["elements"]["edges"][0]["data"]["label"], "creates");
    }

    #[test]
    fn write_dataset_dispatches_on_format() {
        let mut out = Vec::new();
        write_dataset(&dataset(), ExportFormat::Json, &mut out).unwrap();
        assert!(out.starts_with(b"["));
    }
}
