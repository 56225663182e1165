//! Contracts for the external collaborator consumed by the driving task.

mod agent;

pub use agent::{AgentFactory, AgentSession, CallHandle};
