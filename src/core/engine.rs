use chrono::{Local, NaiveDate};

use super::error::ProjectionError;
use super::types::{
    MONTHS_PER_YEAR, MonthlySample, ProjectionParameters, ProjectionSeries, months_between,
    reported_age,
};

#[derive(Debug, Clone, Copy)]
struct CashFlows {
    pre_retirement: f64,
    post_retirement: f64,
    monthly_return: f64,
}

impl CashFlows {
    fn from_parameters(params: &ProjectionParameters) -> Self {
        Self {
            pre_retirement: params.pre_retirement_monthly_contribution(),
            post_retirement: params.post_retirement_monthly_flow(),
            monthly_return: params.monthly_return_rate(),
        }
    }

    fn for_regime(self, is_retired: bool) -> f64 {
        if is_retired {
            self.post_retirement
        } else {
            self.pre_retirement
        }
    }
}

/// Month offsets from birth that drive the simulation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Horizon {
    start_month: u32,
    retirement_month: u32,
    end_month: u32,
}

impl Horizon {
    fn new(params: &ProjectionParameters, as_of: NaiveDate) -> Result<Self, ProjectionError> {
        let start_month = months_between(params.birth_date, as_of).ok_or(
            ProjectionError::BirthDateInFuture {
                birth_date: params.birth_date,
                as_of,
            },
        )?;
        Ok(Self {
            start_month,
            retirement_month: params.retirement_age * MONTHS_PER_YEAR,
            // The series runs through the end of the death year.
            end_month: (params.death_age + 1) * MONTHS_PER_YEAR,
        })
    }

    fn simulated_months(self) -> usize {
        self.end_month.saturating_sub(self.start_month) as usize
    }
}

/// Projects net worth month by month from today until the end of the death year.
pub fn project(params: &ProjectionParameters) -> Result<ProjectionSeries, ProjectionError> {
    project_at(params, Local::now().date_naive())
}

/// Same as [`project`], evaluated as if today were `as_of`.
///
/// The first sample sits at the current age with the floored initial savings
/// and is never retired. Each following month compounds the previous balance,
/// adds the cash flow of the previous month's regime and floors the result at
/// zero. The retirement flag flips once the month count reaches
/// `retirement_age * 12` and never flips back.
pub fn project_at(
    params: &ProjectionParameters,
    as_of: NaiveDate,
) -> Result<ProjectionSeries, ProjectionError> {
    params.validate()?;
    let horizon = Horizon::new(params, as_of)?;
    let flows = CashFlows::from_parameters(params);

    let mut samples = Vec::with_capacity(horizon.simulated_months().max(1));
    let mut net_worth = params.initial_savings.max(0.0);
    let mut is_retired = false;
    samples.push(MonthlySample {
        age: reported_age(horizon.start_month),
        net_worth,
        is_retired,
    });

    for month in (horizon.start_month + 1)..horizon.end_month {
        net_worth = advance_month(net_worth, flows.monthly_return, flows.for_regime(is_retired))
            .ok_or(ProjectionError::NonFiniteNetWorth {
                month,
                age: reported_age(month),
            })?;
        is_retired = is_retired || month >= horizon.retirement_month;
        samples.push(MonthlySample {
            age: reported_age(month),
            net_worth,
            is_retired,
        });
    }

    tracing::debug!(
        samples = samples.len(),
        start_month = horizon.start_month,
        retirement_month = horizon.retirement_month,
        end_month = horizon.end_month,
        "projection complete"
    );

    Ok(ProjectionSeries::from_samples(samples))
}

/// One step of the recurrence. `None` when the balance leaves the finite range.
fn advance_month(net_worth: f64, monthly_return: f64, cash_flow: f64) -> Option<f64> {
    let next = net_worth + net_worth * monthly_return + cash_flow;
    if !next.is_finite() {
        return None;
    }
    Some(next.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn as_of() -> NaiveDate {
        date(2026, 10, 17)
    }

    fn sample_parameters() -> ProjectionParameters {
        ProjectionParameters {
            birth_date: date(1991, 6, 5),
            retirement_age: 65,
            death_age: 92,
            pre_retirement_annual_income: 120_000.0,
            monthly_expenses_in_retirement: 13_000.0,
            tax_rate: 0.3,
            savings_rate: 0.1,
            annual_return_rate: 0.07,
            initial_savings: 100_000.0,
        }
    }

    /// Born exactly `years` before `as_of()` so the series starts on a whole age.
    fn parameters_aged(years: i32) -> ProjectionParameters {
        let mut params = sample_parameters();
        params.birth_date = date(2026 - years, 10, 17);
        params
    }

    #[test]
    fn first_sample_is_current_age_with_initial_savings() {
        let series = project_at(&sample_parameters(), as_of()).expect("valid projection");
        let first = series.first();
        // 424 whole months between 1991-06-05 and 2026-10-17.
        assert_eq!(first.age, reported_age(424));
        assert_eq!(first.age, 35.33);
        assert_approx(first.net_worth, 100_000.0);
        assert!(!first.is_retired);
    }

    #[test]
    fn series_spans_through_end_of_death_year() {
        let series = project_at(&sample_parameters(), as_of()).expect("valid projection");
        assert_eq!(series.last().age, reported_age(93 * 12 - 1));
        assert!(series.last().age >= 92.0);
        assert_eq!(series.len(), (93 * 12 - 424) as usize);
    }

    #[test]
    fn retiring_in_the_death_year_flips_the_flag_within_the_series() {
        let mut params = parameters_aged(64);
        params.retirement_age = 65;
        params.death_age = 65;

        let series = project_at(&params, as_of()).expect("valid projection");
        assert!(!series.first().is_retired);
        assert!(series.last().is_retired);
        assert_eq!(series.len(), 24);

        let retired = series.retirement_sample().expect("must retire");
        assert_eq!(retired.age, 65.0);
        let flips = series
            .samples()
            .windows(2)
            .filter(|w| w[0].is_retired != w[1].is_retired)
            .count();
        assert_eq!(flips, 1);
    }

    #[test]
    fn zero_return_accumulates_contributions_linearly() {
        let mut params = parameters_aged(30);
        params.retirement_age = 60;
        params.death_age = 60;
        params.annual_return_rate = 0.0;
        params.tax_rate = 0.0;
        params.savings_rate = 1.0;
        params.pre_retirement_annual_income = 12_000.0;
        params.initial_savings = 2_500.0;

        let series = project_at(&params, as_of()).expect("valid projection");
        assert_approx(series.samples()[12].net_worth, 2_500.0 + 12_000.0);
        assert_approx(series.samples()[12].age, 31.0);
    }

    #[test]
    fn expenses_beyond_savings_drain_to_zero_and_stay_there() {
        let mut params = parameters_aged(65);
        params.retirement_age = 65;
        params.death_age = 70;
        params.annual_return_rate = 0.0;
        params.initial_savings = 30_000.0;
        params.monthly_expenses_in_retirement = 13_000.0;

        let series = project_at(&params, as_of()).expect("valid projection");
        let samples = series.samples();
        // Seed month is pre-retirement: +700 contribution, then retired draws.
        assert_approx(samples[1].net_worth, 30_700.0);
        assert_approx(samples[2].net_worth, 17_700.0);
        assert_approx(samples[3].net_worth, 4_700.0);
        assert_eq!(samples[4].net_worth, 0.0);
        assert!(samples[4..].iter().all(|s| s.net_worth == 0.0 && s.is_retired));
        assert_eq!(series.depletion_sample().map(|s| s.age), Some(samples[4].age));
    }

    #[test]
    fn negative_initial_savings_is_floored_at_zero() {
        let mut params = sample_parameters();
        params.initial_savings = -500.0;

        let series = project_at(&params, as_of()).expect("valid projection");
        assert_eq!(series.first().net_worth, 0.0);
        assert!(series.iter().all(|s| s.net_worth >= 0.0));
    }

    #[test]
    fn zero_balance_regrows_from_pre_retirement_contributions() {
        let mut params = parameters_aged(40);
        params.initial_savings = -10_000.0;
        params.annual_return_rate = -0.5;

        let series = project_at(&params, as_of()).expect("valid projection");
        let samples = series.samples();
        assert_eq!(samples[0].net_worth, 0.0);
        assert_approx(samples[1].net_worth, 700.0);
        assert!(samples[2].net_worth > samples[1].net_worth);
    }

    #[test]
    fn regime_for_a_month_comes_from_the_previous_sample() {
        let mut params = parameters_aged(64);
        params.retirement_age = 65;
        params.annual_return_rate = 0.0;
        params.initial_savings = 50_000.0;

        let series = project_at(&params, as_of()).expect("valid projection");
        let samples = series.samples();
        // Month 12 is the first retired sample, but it still earned the contribution.
        assert!(!samples[11].is_retired);
        assert!(samples[12].is_retired);
        assert_approx(samples[12].net_worth, 50_000.0 + 12.0 * 700.0);
        assert_approx(samples[13].net_worth, 50_000.0 + 12.0 * 700.0 - 13_000.0);
    }

    #[test]
    fn already_past_the_horizon_yields_only_the_seed_sample() {
        let mut params = parameters_aged(95);
        params.retirement_age = 65;
        params.death_age = 92;

        let series = project_at(&params, as_of()).expect("valid projection");
        assert_eq!(series.len(), 1);
        assert_eq!(series.first().age, 95.0);
        assert!(!series.first().is_retired);
    }

    #[test]
    fn retirement_after_death_is_rejected_before_simulating() {
        let mut params = sample_parameters();
        params.retirement_age = 93;
        let err = project_at(&params, as_of()).expect_err("must reject");
        assert!(err.is_parameter_error());
        assert!(matches!(err, ProjectionError::RetirementAfterDeath { .. }));
    }

    #[test]
    fn birth_date_after_evaluation_date_is_rejected() {
        let mut params = sample_parameters();
        params.birth_date = date(2030, 1, 1);
        let err = project_at(&params, as_of()).expect_err("must reject");
        assert!(matches!(err, ProjectionError::BirthDateInFuture { .. }));
    }

    #[test]
    fn overflowing_growth_is_a_computation_error() {
        let mut params = sample_parameters();
        params.annual_return_rate = 1e308;

        let err = project_at(&params, as_of()).expect_err("must overflow");
        assert!(!err.is_parameter_error());
        assert_eq!(
            err,
            ProjectionError::NonFiniteNetWorth {
                month: 425,
                age: reported_age(425),
            }
        );
    }

    #[test]
    fn advance_month_applies_growth_flow_and_floor() {
        assert_eq!(advance_month(1_000.0, 0.01, 50.0), Some(1_060.0));
        assert_eq!(advance_month(1_000.0, 0.0, -5_000.0), Some(0.0));
        assert_eq!(advance_month(f64::MAX, 1.0, 0.0), None);
    }

    #[test]
    fn fixed_date_reruns_are_identical() {
        let params = sample_parameters();
        let a = project_at(&params, as_of()).expect("valid projection");
        let b = project_at(&params, as_of()).expect("valid projection");
        assert_eq!(a, b);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_series_invariants_hold(
            age_years in 18i32..80,
            retirement_age in 30u32..80,
            death_extra in 0u32..30,
            income in 0u32..400_000,
            expenses in 0u32..20_000,
            tax_bp in 0u32..=10_000,
            savings_bp in 0u32..=10_000,
            return_bp in -3_000i32..3_000,
            initial_savings in -50_000i32..2_000_000,
        ) {
            let mut params = parameters_aged(age_years);
            params.retirement_age = retirement_age;
            params.death_age = retirement_age + death_extra;
            params.pre_retirement_annual_income = f64::from(income);
            params.monthly_expenses_in_retirement = f64::from(expenses);
            params.tax_rate = f64::from(tax_bp) / 10_000.0;
            params.savings_rate = f64::from(savings_bp) / 10_000.0;
            params.annual_return_rate = f64::from(return_bp) / 10_000.0;
            params.initial_savings = f64::from(initial_savings);

            let series = project_at(&params, as_of()).expect("valid projection");
            let samples = series.samples();

            prop_assert_eq!(series.first().age, f64::from(age_years as u32));
            prop_assert!(
                series.last().age >= f64::from(params.death_age)
                    || samples.len() == 1
            );
            for s in samples {
                prop_assert!(s.net_worth >= 0.0 && s.net_worth.is_finite());
            }
            for w in samples.windows(2) {
                prop_assert!(w[1].age > w[0].age);
                prop_assert!(!(w[0].is_retired && !w[1].is_retired));
            }
        }
    }
}
