pub mod composer;
pub mod data_sync;
pub mod phenology;
pub mod physics;
pub mod report;
pub mod rules;
pub mod sampler;

pub use composer::{AdvisoryComposer, AdvisoryInput};
pub use data_sync::DataSyncService;
pub use report::{ReportJob, ReportOutcome};
pub use rules::RulesEngine;
