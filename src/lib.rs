// Re-export all public modules
pub mod shared;
pub mod population;
pub mod hegemony;
pub mod aggregator;
pub mod date_range;
pub mod report;
pub mod runner;
pub mod logging;

// Re-export commonly used types at the crate root
pub use aggregator::{aggregate, compute_hegemony, AggregateResult, AggregationOptions};
pub use date_range::{DateRange, Granularity};
pub use hegemony::{HegemonyObservation, HegemonyQuery, HegemonySource, IhrHegemonyClient};
pub use population::{ApnicPopulationClient, PopulationEstimate, PopulationRecord, PopulationSource};
pub use report::{PlotSeries, ReportRenderer};
pub use runner::{ReportConfig, ReportRunner, RunSummary};
pub use shared::{AddressFamily, HegeError, Result, ASN};
