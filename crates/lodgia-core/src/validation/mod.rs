//! Validation modules

pub mod gate;
pub mod validator;

pub use gate::{Admission, Rejection, ValidationGate};
pub use validator::{ImageValidator, ValidationError};
