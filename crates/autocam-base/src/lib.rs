use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod math;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    pub linear: f64,
    pub angular: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            linear: 1.0e-6,
            angular: 1.0e-6,
        }
    }
}

impl Tolerance {
    pub fn is_near_zero(&self, value: f64) -> bool {
        value.abs() <= self.linear
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown view direction: {0}")]
    UnknownDirection(String),
    #[error("conflicting view directions: {0} and {1}")]
    ConflictingDirections(&'static str, &'static str),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
