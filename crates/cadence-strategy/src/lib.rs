//! Monthly content plan generation.
//!
//! Plans are built from fixed topic templates and variation pools. The caller
//! supplies the random source so runs can be reproduced with a seeded RNG.

mod generator;
mod pools;

pub use generator::{generate_plan, PlanRequest};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StrategyError {
    #[error("brand name must not be empty")]
    EmptyBrandName,

    #[error("plan duration must be at least one day")]
    ZeroDuration,

    #[error("plan starting {start} with {days} days runs past the supported date range")]
    DateOverflow { start: chrono::NaiveDate, days: u32 },
}
