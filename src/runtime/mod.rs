/// Runtime orchestrator module - Gateway

mod orchestrator;

pub use orchestrator::Orchestrator;
