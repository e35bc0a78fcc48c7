//! Emergency-response statistics for the Berlin fire/EMS service.
//!
//! Every dashboard view runs the same pipeline over a CSV export:
//! load, normalize, select, aggregate, rank. The terminal presenter in
//! [`output`] only renders what the pipeline produced.

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod loader;
pub mod normalize;
pub mod output;
pub mod rank;
pub mod select;
pub mod types;
pub mod util;
pub mod views;

pub use aggregate::{aggregate, GroupSpec, Reduction, SummaryRow, SummaryTable};
pub use config::{Config, ParsePolicy};
pub use dashboard::Dashboard;
pub use error::{Error, Result};
pub use rank::{rank, Direction, RankSpec};
pub use select::{domain, with_valid_response_time, Selection};
pub use types::{Field, Measure, MissionType, NormalizedMission, Record, RegionalRecord, Value};
pub use views::{Dataset, View, ViewOutput, ViewParams};
