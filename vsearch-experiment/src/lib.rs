pub mod config;
pub mod error;
pub mod placement;
pub mod results;
pub mod schedule;
pub mod state;
pub mod trial;

pub use config::{coerce, Bounds, ExperimentSettings};
pub use error::ExportError;
pub use placement::PlacementEngine;
pub use results::{write_config, ResultsLog, ResultsSummary};
pub use schedule::EventQueue;
pub use state::{ExperimentEvent, ExperimentStateMachine, PresentationRequest, RenderRequest};
pub use trial::{Trial, TrialTimestamps};
