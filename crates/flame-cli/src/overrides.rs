use crate::error::{CliError, Result};
use flamepp::core::config::{ConfigValue, ParamMap};

/// Parses repeated `KEY=VALUE` arguments. Values are numbers, comma-separated
/// number lists, bracketed lists such as `[0.3]` (always vectors), or text.
pub fn parse_overrides(set_values: &[String]) -> Result<ParamMap> {
    let mut overrides = ParamMap::new();
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Argument(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(CliError::Argument(format!(
                "Missing key in --set value '{}'.",
                kv_pair
            )));
        }
        overrides.insert(key.to_string(), parse_value(value_str.trim())?);
    }
    Ok(overrides)
}

fn parse_value(value_str: &str) -> Result<ConfigValue> {
    if let Some(inner) = value_str
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    {
        let inner = inner.trim();
        if inner.is_empty() {
            return Ok(ConfigValue::Vector(Vec::new()));
        }
        return parse_numbers(inner).map(ConfigValue::Vector).ok_or_else(|| {
            CliError::Argument(format!("Invalid number list in --set value '{}'.", value_str))
        });
    }
    if let Ok(number) = value_str.parse::<f64>() {
        return Ok(ConfigValue::Number(number));
    }
    if value_str.contains(',') {
        if let Some(numbers) = parse_numbers(value_str) {
            return Ok(ConfigValue::Vector(numbers));
        }
    }
    Ok(ConfigValue::Text(value_str.to_string()))
}

fn parse_numbers(list: &str) -> Option<Vec<f64>> {
    list.split(',')
        .map(|part| part.trim().parse::<f64>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_lists_and_text_are_recognised() {
        let overrides = parse_overrides(&[
            "IonEk=1.5e6".to_string(),
            "moment0 = 1, 0, 0, 0, 0, 0, 1".to_string(),
            "Eng_Data_Dir=/data/fields".to_string(),
        ])
        .unwrap();
        assert_eq!(overrides["IonEk"], ConfigValue::Number(1.5e6));
        assert_eq!(
            overrides["moment0"],
            ConfigValue::Vector(vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0])
        );
        assert_eq!(
            overrides["Eng_Data_Dir"],
            ConfigValue::Text("/data/fields".to_string())
        );
    }

    #[test]
    fn bracketed_values_are_always_vectors() {
        let overrides = parse_overrides(&[
            "IonChargeStates=[0.3]".to_string(),
            "NCharge=[ 1, 2 ]".to_string(),
        ])
        .unwrap();
        assert_eq!(overrides["IonChargeStates"], ConfigValue::Vector(vec![0.3]));
        assert_eq!(overrides["NCharge"], ConfigValue::Vector(vec![1.0, 2.0]));
    }

    #[test]
    fn malformed_bracketed_list_is_rejected() {
        let result = parse_overrides(&["NCharge=[1, x]".to_string()]);
        assert!(matches!(result, Err(CliError::Argument(_))));
    }

    #[test]
    fn missing_separator_is_rejected() {
        let result = parse_overrides(&["IonEk".to_string()]);
        assert!(matches!(result, Err(CliError::Argument(_))));
    }

    #[test]
    fn empty_key_is_rejected() {
        let result = parse_overrides(&["=3".to_string()]);
        assert!(matches!(result, Err(CliError::Argument(_))));
    }
}
