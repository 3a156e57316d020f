//! # Numeric Core
//!
//! Fixed-size linear algebra for the 7-dimensional homogeneous phase space used by
//! every transfer map in the engine, together with the physical constants and unit
//! conversions shared by the element models.
//!
//! All fallible operations check their inputs and outputs for non-finite values and
//! fail with [`NumericError`] instead of propagating NaN through a lattice.

pub mod constants;
pub mod matrix;

pub use matrix::{
    NumericError, PS_1, PS_DIM, PS_PS, PS_PX, PS_PY, PS_S, PS_X, PS_Y, PhaseMatrix, PhaseVector,
};
