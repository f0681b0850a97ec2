use chrono::NaiveDate;
use thiserror::Error;

/// Failures raised while building or running a projection.
///
/// Parameter errors are raised before the first month is simulated. A
/// computation error aborts the run and no samples are returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    #[error("retirement age {retirement_age} must be <= death age {death_age}")]
    RetirementAfterDeath { retirement_age: u32, death_age: u32 },

    #[error("death age {death_age} exceeds the supported maximum of {max}")]
    HorizonTooLong { death_age: u32, max: u32 },

    #[error("{name} must be between 0 and 1, got {value}")]
    RateOutOfRange { name: &'static str, value: f64 },

    #[error("{name} must be a finite amount >= 0, got {value}")]
    InvalidAmount { name: &'static str, value: f64 },

    #[error("{name} must be finite, got {value}")]
    NonFiniteParameter { name: &'static str, value: f64 },

    #[error("birth date {birth_date} is after the evaluation date {as_of}")]
    BirthDateInFuture {
        birth_date: NaiveDate,
        as_of: NaiveDate,
    },

    #[error("net worth became non-finite at age {age:.2} (month {month} since birth)")]
    NonFiniteNetWorth { month: u32, age: f64 },
}

impl ProjectionError {
    /// True for failures caused by the inputs rather than by the recurrence.
    pub fn is_parameter_error(&self) -> bool {
        !matches!(self, ProjectionError::NonFiniteNetWorth { .. })
    }
}
