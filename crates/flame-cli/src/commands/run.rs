use crate::cli::RunArgs;
use crate::error::Result;
use crate::output::{HistoryRow, write_rows};
use crate::progress::ElementProgress;
use flamepp::core::models::State;
use flamepp::engine::{HistoryRecorder, Observer};
use tracing::info;

pub fn run(args: RunArgs, show_progress: bool) -> Result<()> {
    let machine = super::load_machine(&args.lattice)?;
    let initial = super::initial_state(&machine, &args.set_values)?;

    let count = args.count.unwrap_or(machine.len());
    let total = count.min(machine.len().saturating_sub(args.start));
    let names: Vec<String> = machine
        .elements()
        .iter()
        .map(|e| e.name().to_string())
        .collect();

    let mut progress = ElementProgress::new(total as u64, names.clone(), show_progress)?;
    let mut recorder = HistoryRecorder::new(names);
    let mut state = initial.clone();
    let applied = {
        let mut observe = |index: usize, s: &State| {
            progress.observe(index, s);
            recorder.observe(index, s);
        };
        machine.propagate(&mut state, args.start, count, Some(&mut observe))
    };
    progress.finish();
    let applied = applied?;

    info!(
        applied,
        pos = state.pos(),
        ref_ion_ek = state.reference().ion_ek,
        "Propagation complete."
    );

    let mut rows = Vec::with_capacity(recorder.len() + 1);
    rows.push(HistoryRow::new(None, "initial", &initial));
    rows.extend(recorder.snapshots().iter().map(HistoryRow::from_snapshot));

    write_rows(args.output.as_deref(), args.json, &rows)?;
    if let Some(path) = &args.output {
        info!("Wrote {} rows to {:?}", rows.len(), path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::write_lattice;

    fn args(dir: &std::path::Path) -> RunArgs {
        RunArgs {
            lattice: write_lattice(dir),
            start: 0,
            count: None,
            output: Some(dir.join("history.csv")),
            json: false,
            set_values: vec![],
        }
    }

    #[test]
    fn history_has_initial_row_and_one_row_per_element() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(dir.path());
        let output = args.output.clone().unwrap();
        run(args, false).unwrap();

        let text = std::fs::read_to_string(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[1].starts_with(",initial,"));
        assert!(lines[4].starts_with("2,D2,"));
    }

    #[test]
    fn count_limits_the_history() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(dir.path());
        args.count = Some(1);
        args.json = true;
        let output = args.output.clone().unwrap();
        run(args, false).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(value[1]["name"], "D1");
    }

    #[test]
    fn beam_overrides_reach_the_initial_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(dir.path());
        args.json = true;
        args.set_values = vec!["IonEk=1.5e6".to_string()];
        let output = args.output.clone().unwrap();
        run(args, false).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();
        assert_eq!(value[0]["ref_ion_ek"], 1.5e6);
    }
}
