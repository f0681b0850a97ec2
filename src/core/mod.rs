mod engine;
mod error;
mod lookup;
mod types;

pub use engine::{project, project_at};
pub use error::ProjectionError;
pub use lookup::{ceiling_index, nearest};
pub use types::{
    MAX_DEATH_AGE, MonthlySample, ProjectionParameters, ProjectionSeries, months_between,
    reported_age,
};
