use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::error::ProjectionError;

/// Oldest death age accepted; keeps the monthly horizon bounded.
pub const MAX_DEATH_AGE: u32 = 150;

pub const MONTHS_PER_YEAR: u32 = 12;

/// Assumptions for a single projection run. Rates are fractions, amounts are
/// in one currency unit.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionParameters {
    pub birth_date: NaiveDate,
    pub retirement_age: u32,
    pub death_age: u32,
    pub pre_retirement_annual_income: f64,
    pub monthly_expenses_in_retirement: f64,
    pub tax_rate: f64,
    pub savings_rate: f64,
    pub annual_return_rate: f64,
    pub initial_savings: f64,
}

impl ProjectionParameters {
    /// Checks the domain invariants the engine relies on.
    ///
    /// A negative `initial_savings` is accepted here; the engine floors it
    /// at zero before the first sample.
    pub fn validate(&self) -> Result<(), ProjectionError> {
        if self.retirement_age > self.death_age {
            return Err(ProjectionError::RetirementAfterDeath {
                retirement_age: self.retirement_age,
                death_age: self.death_age,
            });
        }

        if self.death_age > MAX_DEATH_AGE {
            return Err(ProjectionError::HorizonTooLong {
                death_age: self.death_age,
                max: MAX_DEATH_AGE,
            });
        }

        for (name, value) in [
            ("tax_rate", self.tax_rate),
            ("savings_rate", self.savings_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ProjectionError::RateOutOfRange { name, value });
            }
        }

        for (name, value) in [
            (
                "pre_retirement_annual_income",
                self.pre_retirement_annual_income,
            ),
            (
                "monthly_expenses_in_retirement",
                self.monthly_expenses_in_retirement,
            ),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ProjectionError::InvalidAmount { name, value });
            }
        }

        for (name, value) in [
            ("annual_return_rate", self.annual_return_rate),
            ("initial_savings", self.initial_savings),
        ] {
            if !value.is_finite() {
                return Err(ProjectionError::NonFiniteParameter { name, value });
            }
        }

        Ok(())
    }

    pub fn pre_retirement_monthly_contribution(&self) -> f64 {
        (self.pre_retirement_annual_income / 12.0) * (1.0 - self.tax_rate) * self.savings_rate
    }

    /// Expenses are a pure outflow once retired.
    pub fn post_retirement_monthly_flow(&self) -> f64 {
        -self.monthly_expenses_in_retirement
    }

    pub fn monthly_return_rate(&self) -> f64 {
        self.annual_return_rate / 12.0
    }
}

/// One point of the projected net-worth curve, one per calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySample {
    pub age: f64,
    pub net_worth: f64,
    pub is_retired: bool,
}

/// Ascending, non-empty run of monthly samples produced by the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProjectionSeries {
    samples: Vec<MonthlySample>,
}

impl ProjectionSeries {
    /// Callers must pass at least one sample, ordered by age.
    pub(crate) fn from_samples(samples: Vec<MonthlySample>) -> Self {
        debug_assert!(!samples.is_empty());
        debug_assert!(samples.windows(2).all(|w| w[0].age < w[1].age));
        Self { samples }
    }

    pub fn samples(&self) -> &[MonthlySample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false for a series built by the engine.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> &MonthlySample {
        &self.samples[0]
    }

    pub fn last(&self) -> &MonthlySample {
        &self.samples[self.samples.len() - 1]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MonthlySample> {
        self.samples.iter()
    }

    /// First month spent in retirement.
    pub fn retirement_sample(&self) -> Option<&MonthlySample> {
        self.samples.iter().find(|s| s.is_retired)
    }

    /// First retired month whose balance has been drawn down to the floor.
    pub fn depletion_sample(&self) -> Option<&MonthlySample> {
        self.samples
            .iter()
            .find(|s| s.is_retired && s.net_worth == 0.0)
    }

    pub fn peak_net_worth(&self) -> f64 {
        self.samples
            .iter()
            .map(|s| s.net_worth)
            .fold(0.0, f64::max)
    }
}

impl<'a> IntoIterator for &'a ProjectionSeries {
    type Item = &'a MonthlySample;
    type IntoIter = std::slice::Iter<'a, MonthlySample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

/// Whole calendar months from `birth` to `as_of`. A month is counted once its
/// day-of-month has been reached. Returns `None` when `as_of` is before `birth`.
pub fn months_between(birth: NaiveDate, as_of: NaiveDate) -> Option<u32> {
    if as_of < birth {
        return None;
    }

    let mut months = (as_of.year() - birth.year()) * 12 + as_of.month() as i32
        - birth.month() as i32;
    if as_of.day() < birth.day() {
        months -= 1;
    }
    u32::try_from(months).ok()
}

/// Age in years for a month offset from birth, rounded to two decimals.
pub fn reported_age(month: u32) -> f64 {
    (f64::from(month) / f64::from(MONTHS_PER_YEAR) * 100.0).round() / 100.0
}
