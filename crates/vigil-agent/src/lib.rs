//! Collaborator glue for the Vigil agent session.
//!
//! Implements the `vigil-core` collaborator traits over the hosted
//! services the demo runs against: a video-edge REST client
//! ([`StreamEdge`]) for call setup/teardown and the human join URL, and a
//! hosted-LLM client ([`GeminiClient`]) for the conversational turns. The
//! media path itself (WebRTC, speech, pose) is the vendor's problem and is
//! not reimplemented here.

mod edge;
mod gemini;
mod live;
pub mod prompts;

pub use edge::StreamEdge;
pub use gemini::GeminiClient;
pub use live::{LiveAgent, LiveAgentFactory};
