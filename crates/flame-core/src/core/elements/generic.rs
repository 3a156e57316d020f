use super::error::ElementError;
use super::physics::{ElementPhysics, TransferContext, read_length_or};
use crate::core::config::{ConfigError, Params};
use crate::core::math::matrix::from_row_major;
use crate::core::math::{PS_1, PS_DIM, PhaseMatrix};

/// Element with a user-supplied transfer matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Generic {
    pub length: f64,
    pub matrix: PhaseMatrix,
}

impl Generic {
    pub fn from_params(params: &Params) -> Result<Self, ConfigError> {
        let key = if params.contains("transfer") { "transfer" } else { "matrix" };
        let values = params.vector(key)?;
        let matrix = from_row_major(values).ok_or_else(|| {
            params.invalid(key, format!("expected 36 or 49 values, got {}", values.len()))
        })?;
        let homogeneous = (0..PS_DIM).all(|j| {
            let expected = if j == PS_1 { 1.0 } else { 0.0 };
            matrix[(PS_1, j)] == expected
        });
        if !homogeneous {
            return Err(params.invalid(key, "last row must be (0, 0, 0, 0, 0, 0, 1)"));
        }
        Ok(Self {
            length: read_length_or(params, 0.0)?,
            matrix,
        })
    }
}

impl ElementPhysics for Generic {
    fn length(&self) -> f64 {
        self.length
    }

    fn transfer_matrix(&self, _ctx: &TransferContext<'_>) -> Result<PhaseMatrix, ElementError> {
        Ok(self.matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ConfigValue;
    use crate::core::elements::testing::{param_map, params};
    use crate::core::math::{PS_PX, PS_X};

    fn identity_values(n: usize) -> Vec<f64> {
        (0..n * n).map(|k| if k / n == k % n { 1.0 } else { 0.0 }).collect()
    }

    #[test]
    fn accepts_six_by_six_matrix() {
        let mut values = identity_values(6);
        values[1] = 250.0;
        let map = param_map(&[("transfer", ConfigValue::from(values))]);
        let g = Generic::from_params(&params(&map)).unwrap();
        assert_eq!(g.matrix[(PS_X, PS_PX)], 250.0);
        assert_eq!(g.length, 0.0);
    }

    #[test]
    fn accepts_matrix_alias_and_length() {
        let map = param_map(&[
            ("matrix", ConfigValue::from(identity_values(7))),
            ("L", 0.5_f64.into()),
        ]);
        let g = Generic::from_params(&params(&map)).unwrap();
        assert_eq!(g.matrix, PhaseMatrix::identity());
        assert_eq!(g.length, 0.5);
    }

    #[test]
    fn rejects_wrong_size() {
        let map = param_map(&[("transfer", ConfigValue::from(vec![1.0; 10]))]);
        assert!(matches!(
            Generic::from_params(&params(&map)),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn rejects_broken_homogeneous_row() {
        let mut values = identity_values(7);
        values[48] = 2.0;
        let map = param_map(&[("transfer", ConfigValue::from(values))]);
        assert!(Generic::from_params(&params(&map)).is_err());
    }
}
