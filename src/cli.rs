use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::core::{ProjectionError, ProjectionParameters};

pub const DEFAULT_BIRTH_DATE: &str = "1991-06-05";
pub const DEFAULT_RETIREMENT_AGE: u32 = 65;
pub const DEFAULT_DEATH_AGE: u32 = 92;
pub const DEFAULT_ANNUAL_INCOME: f64 = 120_000.0;
pub const DEFAULT_TAX_RATE_PCT: f64 = 30.0;
pub const DEFAULT_SAVINGS_RATE_PCT: f64 = 10.0;
pub const DEFAULT_ANNUAL_RETURN_PCT: f64 = 7.0;
pub const DEFAULT_MONTHLY_EXPENSES: f64 = 13_000.0;
pub const DEFAULT_INITIAL_SAVINGS: f64 = 100_000.0;

#[derive(Parser, Debug)]
#[command(
    name = "networth",
    about = "Month-by-month net worth projection with a pre/post retirement regime"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API
    Serve {
        #[arg(long, help = "Bind address, overrides HOST")]
        host: Option<String>,
        #[arg(long, help = "Listen port, overrides PORT")]
        port: Option<u16>,
    },
    /// Print the projected series
    Project {
        #[command(flatten)]
        params: ParameterArgs,
        #[arg(long, help = "Evaluate as of this date instead of today (YYYY-MM-DD)")]
        as_of: Option<NaiveDate>,
        #[arg(
            long,
            default_value_t = 12,
            value_parser = clap::value_parser!(u32).range(1..),
            help = "Print every Nth month in table output"
        )]
        every: u32,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Print the sample the chart marker snaps to for an age
    Nearest {
        #[command(flatten)]
        params: ParameterArgs,
        #[arg(long, help = "Evaluate as of this date instead of today (YYYY-MM-DD)")]
        as_of: Option<NaiveDate>,
        #[arg(long, allow_negative_numbers = true, help = "Query age in years")]
        age: f64,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct ParameterArgs {
    #[arg(long, default_value = DEFAULT_BIRTH_DATE, help = "Birth date (YYYY-MM-DD)")]
    pub birth_date: NaiveDate,
    #[arg(long, default_value_t = DEFAULT_RETIREMENT_AGE)]
    pub retirement_age: u32,
    #[arg(long, default_value_t = DEFAULT_DEATH_AGE, help = "Age to project through")]
    pub death_age: u32,
    #[arg(
        long,
        default_value_t = DEFAULT_ANNUAL_INCOME,
        help = "Gross annual income before retirement"
    )]
    pub annual_income: f64,
    #[arg(long, default_value_t = DEFAULT_TAX_RATE_PCT, help = "Flat tax rate in percent")]
    pub tax_rate: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_SAVINGS_RATE_PCT,
        help = "Share of after-tax income saved, in percent"
    )]
    pub savings_rate: f64,
    #[arg(
        long,
        allow_negative_numbers = true,
        default_value_t = DEFAULT_ANNUAL_RETURN_PCT,
        help = "Expected annual investment return in percent, e.g. 7"
    )]
    pub annual_return: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_MONTHLY_EXPENSES,
        help = "Monthly expenses once retired"
    )]
    pub monthly_expenses: f64,
    #[arg(
        long,
        allow_negative_numbers = true,
        default_value_t = DEFAULT_INITIAL_SAVINGS,
        help = "Savings today; negative values are treated as zero"
    )]
    pub initial_savings: f64,
}

impl Default for ParameterArgs {
    fn default() -> Self {
        Self {
            birth_date: NaiveDate::from_ymd_opt(1991, 6, 5).unwrap_or_default(),
            retirement_age: DEFAULT_RETIREMENT_AGE,
            death_age: DEFAULT_DEATH_AGE,
            annual_income: DEFAULT_ANNUAL_INCOME,
            tax_rate: DEFAULT_TAX_RATE_PCT,
            savings_rate: DEFAULT_SAVINGS_RATE_PCT,
            annual_return: DEFAULT_ANNUAL_RETURN_PCT,
            monthly_expenses: DEFAULT_MONTHLY_EXPENSES,
            initial_savings: DEFAULT_INITIAL_SAVINGS,
        }
    }
}

/// Converts percent inputs to fractions and checks the result.
pub fn build_parameters(args: ParameterArgs) -> Result<ProjectionParameters, ProjectionError> {
    let params = ProjectionParameters {
        birth_date: args.birth_date,
        retirement_age: args.retirement_age,
        death_age: args.death_age,
        pre_retirement_annual_income: args.annual_income,
        monthly_expenses_in_retirement: args.monthly_expenses,
        tax_rate: args.tax_rate / 100.0,
        savings_rate: args.savings_rate / 100.0,
        annual_return_rate: args.annual_return / 100.0,
        initial_savings: args.initial_savings,
    };
    params.validate()?;
    Ok(params)
}
