use nalgebra::{SMatrix, SVector};
use thiserror::Error;

/// Dimension of the homogeneous phase space: six physical coordinates plus a constant.
pub const PS_DIM: usize = 7;

pub const PS_X: usize = 0;
pub const PS_PX: usize = 1;
pub const PS_Y: usize = 2;
pub const PS_PY: usize = 3;
pub const PS_S: usize = 4;
pub const PS_PS: usize = 5;
/// Homogeneous coordinate; always 1 in a centroid, carries affine terms in a transfer matrix.
pub const PS_1: usize = 6;

pub type PhaseMatrix = SMatrix<f64, PS_DIM, PS_DIM>;
pub type PhaseVector = SVector<f64, PS_DIM>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NumericError {
    #[error("Non-finite value encountered in {what}")]
    NonFinite { what: &'static str },
    #[error("Matrix is singular and cannot be inverted")]
    Singular,
}

/// A centroid at the origin, with the homogeneous coordinate set.
pub fn origin() -> PhaseVector {
    let mut v = PhaseVector::zeros();
    v[PS_1] = 1.0;
    v
}

pub fn check_matrix(m: &PhaseMatrix, what: &'static str) -> Result<(), NumericError> {
    if m.iter().all(|x| x.is_finite()) {
        Ok(())
    } else {
        Err(NumericError::NonFinite { what })
    }
}

pub fn check_vector(v: &PhaseVector, what: &'static str) -> Result<(), NumericError> {
    if v.iter().all(|x| x.is_finite()) {
        Ok(())
    } else {
        Err(NumericError::NonFinite { what })
    }
}

/// `a · b`, failing if either operand or the product is not finite.
pub fn compose(a: &PhaseMatrix, b: &PhaseMatrix) -> Result<PhaseMatrix, NumericError> {
    check_matrix(a, "left matrix operand")?;
    check_matrix(b, "right matrix operand")?;
    let product = a * b;
    check_matrix(&product, "matrix product")?;
    Ok(product)
}

/// `M · v`.
pub fn apply(m: &PhaseMatrix, v: &PhaseVector) -> Result<PhaseVector, NumericError> {
    check_matrix(m, "transfer matrix")?;
    check_vector(v, "centroid")?;
    let out = m * v;
    check_vector(&out, "transformed centroid")?;
    Ok(out)
}

/// `M · Σ · Mᵗ`, symmetrised to remove round-off asymmetry.
pub fn transform_covariance(
    m: &PhaseMatrix,
    sigma: &PhaseMatrix,
) -> Result<PhaseMatrix, NumericError> {
    check_matrix(m, "transfer matrix")?;
    check_matrix(sigma, "covariance")?;
    let out = m * sigma * m.transpose();
    let out = (out + out.transpose()) * 0.5;
    check_matrix(&out, "transformed covariance")?;
    Ok(out)
}

pub fn outer(a: &PhaseVector, b: &PhaseVector) -> PhaseMatrix {
    a * b.transpose()
}

/// Inverse by LU decomposition.
pub fn invert(m: &PhaseMatrix) -> Result<PhaseMatrix, NumericError> {
    check_matrix(m, "matrix to invert")?;
    let inverse = (*m).lu().try_inverse().ok_or(NumericError::Singular)?;
    check_matrix(&inverse, "matrix inverse")?;
    Ok(inverse)
}

/// Builds a matrix from row-major values. A 36-value slice fills the physical 6×6
/// block of an identity; a 49-value slice fills the whole matrix.
pub fn from_row_major(values: &[f64]) -> Option<PhaseMatrix> {
    let n = match values.len() {
        36 => 6,
        49 => PS_DIM,
        _ => return None,
    };
    let mut m = PhaseMatrix::identity();
    for (k, v) in values.iter().enumerate() {
        m[(k / n, k % n)] = *v;
    }
    Some(m)
}
