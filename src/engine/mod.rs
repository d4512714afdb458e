mod grouping;
mod metadata;
mod normalize;
mod orchestrator;
mod scoring;
mod trajectory;
mod trend;


pub use orchestrator::{BatchAssessment, assess_batch};
