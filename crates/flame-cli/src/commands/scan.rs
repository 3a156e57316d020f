use crate::cli::ScanArgs;
use crate::error::{CliError, Result};
use crate::output::{ScanRow, write_rows};
use flamepp::core::config::ConfigValue;
use flamepp::workflows::scan;
use tracing::info;

pub fn run(args: ScanArgs) -> Result<()> {
    let machine = super::load_machine(&args.lattice)?;
    let initial = super::initial_state(&machine, &args.set_values)?;

    let index = machine
        .find(args.element.as_str())
        .first()
        .copied()
        .ok_or_else(|| {
            CliError::Argument(format!("no element named '{}' in the lattice", args.element))
        })?;
    info!(
        "Scanning '{}' of element '{}' (index {}) over {} values.",
        args.param,
        args.element,
        index,
        args.values.len()
    );

    let values: Vec<ConfigValue> = args.values.iter().copied().map(ConfigValue::Number).collect();
    let points = scan::parameter_scan(&machine, index, &args.param, &values, &initial)?;

    let rows: Vec<ScanRow> = args
        .values
        .iter()
        .zip(&points)
        .map(|(value, point)| ScanRow::new(*value, &point.state))
        .collect();
    write_rows(args.output.as_deref(), false, &rows)
}
