use crate::error::{CliError, Result};
use flamepp::core::math::{PS_S, PS_X, PS_Y};
use flamepp::core::models::State;
use flamepp::engine::Snapshot;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// One line of the per-element beam table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow {
    pub index: Option<usize>,
    pub name: String,
    pub pos: f64,
    pub ref_ion_ek: f64,
    pub ncharge: usize,
    pub x_centroid: f64,
    pub y_centroid: f64,
    pub x_rms: f64,
    pub y_rms: f64,
    pub z_rms: f64,
}

impl HistoryRow {
    /// Summarises `state` using the charge-state envelope.
    pub fn new(index: Option<usize>, name: &str, state: &State) -> Self {
        let envelope = state.envelope();
        Self {
            index,
            name: name.to_string(),
            pos: state.pos(),
            ref_ion_ek: state.reference().ion_ek,
            ncharge: state.ncharge(),
            x_centroid: envelope.moment0[PS_X],
            y_centroid: envelope.moment0[PS_Y],
            x_rms: envelope.rms[PS_X],
            y_rms: envelope.rms[PS_Y],
            z_rms: envelope.rms[PS_S],
        }
    }

    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self::new(Some(snapshot.index), &snapshot.name, &snapshot.state)
    }
}

/// Final beam of one scan point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanRow {
    pub value: f64,
    pub pos: f64,
    pub ref_ion_ek: f64,
    pub ncharge: usize,
    pub x_centroid: f64,
    pub y_centroid: f64,
    pub x_rms: f64,
    pub y_rms: f64,
    pub z_rms: f64,
}

impl ScanRow {
    pub fn new(value: f64, state: &State) -> Self {
        let summary = HistoryRow::new(None, "", state);
        Self {
            value,
            pos: summary.pos,
            ref_ion_ek: summary.ref_ion_ek,
            ncharge: summary.ncharge,
            x_centroid: summary.x_centroid,
            y_centroid: summary.y_centroid,
            x_rms: summary.x_rms,
            y_rms: summary.y_rms,
            z_rms: summary.z_rms,
        }
    }
}

/// Writes `rows` as CSV (or JSON) to `path`, or to standard output when no path is given.
pub fn write_rows<R: Serialize>(path: Option<&Path>, json: bool, rows: &[R]) -> Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path).map_err(|e| CliError::Output {
                path: path.to_path_buf(),
                source: e.into(),
            })?;
            write_to(BufWriter::new(file), json, rows)
        }
        None => write_to(std::io::stdout().lock(), json, rows),
    }
}

fn write_to<W: Write, R: Serialize>(writer: W, json: bool, rows: &[R]) -> Result<()> {
    if json {
        write_json(writer, rows)?;
    } else {
        write_csv(writer, rows)?;
    }
    Ok(())
}

pub fn write_csv<W: Write, R: Serialize>(
    writer: W,
    rows: &[R],
) -> std::result::Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_json<W: Write, R: Serialize>(
    writer: W,
    rows: &[R],
) -> std::result::Result<(), serde_json::Error> {
    serde_json::to_writer_pretty(writer, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flamepp::core::config::{ElementConfig, LatticeConfig, ParamMap};
    use flamepp::engine::Machine;

    fn state() -> State {
        let machine = Machine::new(
            LatticeConfig::builder()
                .global("IonEs", 931.494_32e6)
                .global("IonEk", 0.5e6)
                .global("IonZ", 0.25)
                .element(ElementConfig::new("D1", "drift").with("L", 1.0))
                .build(),
        )
        .unwrap();
        machine.alloc_state(&ParamMap::new()).unwrap()
    }

    #[test]
    fn row_reports_envelope_widths() {
        let row = HistoryRow::new(None, "initial", &state());
        assert_eq!(row.name, "initial");
        assert_eq!(row.ncharge, 1);
        assert_eq!(row.x_rms, 1.0);
        assert_eq!(row.x_centroid, 0.0);
        assert_eq!(row.ref_ion_ek, 0.5e6);
    }

    #[test]
    fn csv_has_header_and_one_line_per_row() {
        let rows = vec![
            HistoryRow::new(None, "initial", &state()),
            HistoryRow::new(Some(0), "D1", &state()),
        ];
        let mut buffer = Vec::new();
        write_csv(&mut buffer, &rows).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("index,name,pos,ref_ion_ek"));
        assert!(lines[2].starts_with("0,D1,"));
    }

    #[test]
    fn rows_are_written_to_the_requested_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.csv");
        let rows = vec![ScanRow::new(2.5, &state())];
        write_rows(Some(&path), false, &rows).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("value,pos,ref_ion_ek"));
        assert!(text.lines().nth(1).unwrap().starts_with("2.5,"));
    }

    #[test]
    fn unwritable_output_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        let rows = vec![ScanRow::new(1.0, &state())];
        assert!(matches!(
            write_rows(Some(&path), false, &rows),
            Err(CliError::Output { .. })
        ));
    }

    #[test]
    fn json_is_an_array_of_objects() {
        let rows = vec![HistoryRow::new(Some(0), "D1", &state())];
        let mut buffer = Vec::new();
        write_json(&mut buffer, &rows).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value[0]["name"], "D1");
        assert_eq!(value[0]["index"], 0);
    }
}
