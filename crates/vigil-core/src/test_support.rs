//! Deterministic collaborator doubles for lifecycle tests.
//!
//! [`ScriptedAgent`] walks the same milestone sequence as the live
//! collaborator but entirely in-process: each milestone can be made to
//! fail, or to halt forever so a test can cancel the session at a known
//! point. [`ScriptedFactory`] counts constructions, which lets tests prove
//! a rejected `start()` never built a second collaborator.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{AgentError, AgentResult};
use crate::traits::{AgentFactory, AgentSession, CallHandle};

/// Named points in the driving sequence where behavior can be injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    CreateUser,
    DemoJoinUrl,
    CreateCall,
    Join,
    Greet,
    Assess,
    WrapUp,
    Finish,
}

/// Behavior of one scripted session.
#[derive(Debug, Clone)]
pub struct Script {
    pub join_url: String,
    pub assessment: Option<String>,
    pub fail_at: Option<Milestone>,
    pub halt_at: Option<Milestone>,
}

impl Script {
    /// A session that completes every milestone successfully.
    pub fn happy() -> Self {
        Self {
            join_url: "https://demo.example.test/join/room1".to_string(),
            assessment: Some(
                "Observation Summary: patient is seated upright and attentive. \
                 Posture: good. Breathing: normal (14-16 bpm). \
                 Visible Concerns: none. \
                 Wellness Recommendation: take a short stretch break each hour."
                    .to_string(),
            ),
            fail_at: None,
            halt_at: None,
        }
    }

    /// Fail with a scripted error when the milestone is reached.
    pub fn fail_at(mut self, milestone: Milestone) -> Self {
        self.fail_at = Some(milestone);
        self
    }

    /// Suspend forever when the milestone is reached (for cancel tests).
    pub fn halt_at(mut self, milestone: Milestone) -> Self {
        self.halt_at = Some(milestone);
        self
    }

    /// The collaborator answers the assessment prompt with nothing.
    pub fn without_assessment(mut self) -> Self {
        self.assessment = None;
        self
    }
}

/// In-process [`AgentSession`] following a [`Script`].
pub struct ScriptedAgent {
    script: Script,
    responses: usize,
}

impl ScriptedAgent {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            responses: 0,
        }
    }

    async fn checkpoint(&self, milestone: Milestone) -> AgentResult<()> {
        if self.script.halt_at == Some(milestone) {
            std::future::pending::<()>().await;
        }
        if self.script.fail_at == Some(milestone) {
            return Err(AgentError::Transport(format!(
                "scripted failure at {milestone:?}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl AgentSession for ScriptedAgent {
    async fn create_user(&mut self) -> AgentResult<()> {
        self.checkpoint(Milestone::CreateUser).await
    }

    async fn demo_join_url(&mut self, _call_type: &str, _call_id: &str) -> AgentResult<String> {
        self.checkpoint(Milestone::DemoJoinUrl).await?;
        Ok(self.script.join_url.clone())
    }

    async fn create_call(&mut self, call_type: &str, call_id: &str) -> AgentResult<CallHandle> {
        self.checkpoint(Milestone::CreateCall).await?;
        Ok(CallHandle::new(call_type, call_id))
    }

    async fn join(&mut self, _call: &CallHandle) -> AgentResult<()> {
        self.checkpoint(Milestone::Join).await
    }

    async fn simple_response(&mut self, _prompt: &str) -> AgentResult<Option<String>> {
        let turn = self.responses;
        self.responses += 1;
        match turn {
            0 => {
                self.checkpoint(Milestone::Greet).await?;
                Ok(Some("Hello, let's begin.".to_string()))
            }
            1 => {
                self.checkpoint(Milestone::Assess).await?;
                Ok(self.script.assessment.clone())
            }
            _ => {
                self.checkpoint(Milestone::WrapUp).await?;
                Ok(Some("Goodbye.".to_string()))
            }
        }
    }

    async fn finish(&mut self) -> AgentResult<()> {
        // Teardown is also invoked on unwind paths; never halt here.
        if self.script.fail_at == Some(Milestone::Finish) {
            return Err(AgentError::Transport(
                "scripted failure at Finish".to_string(),
            ));
        }
        Ok(())
    }
}

/// Factory handing out [`ScriptedAgent`]s, counting every construction.
pub struct ScriptedFactory {
    script: Mutex<Script>,
    created: AtomicUsize,
    fail_on_create: bool,
}

impl ScriptedFactory {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            created: AtomicUsize::new(0),
            fail_on_create: false,
        })
    }

    /// A factory whose `create()` always fails (setup-failure tests).
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(Script::happy()),
            created: AtomicUsize::new(0),
            fail_on_create: true,
        })
    }

    /// Replace the script used for subsequent sessions.
    pub fn set_script(&self, script: Script) {
        *self.script.lock().unwrap() = script;
    }

    /// How many collaborators have been constructed.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl AgentFactory for ScriptedFactory {
    fn create(&self) -> AgentResult<Box<dyn AgentSession>> {
        if self.fail_on_create {
            return Err(AgentError::Setup(
                "scripted factory refuses to build an agent".to_string(),
            ));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        let script = self.script.lock().unwrap().clone();
        Ok(Box::new(ScriptedAgent::new(script)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_agent_returns_the_assessment_on_the_second_turn() {
        let mut agent = ScriptedAgent::new(Script::happy());
        let greet = agent.simple_response("hi").await.unwrap();
        assert!(greet.is_some());

        let assessment = agent.simple_response("assess").await.unwrap();
        assert_eq!(assessment, Script::happy().assessment);
    }

    #[tokio::test]
    async fn failure_injection_targets_one_milestone() {
        let mut agent = ScriptedAgent::new(Script::happy().fail_at(Milestone::Join));
        agent.create_user().await.unwrap();
        let call = agent.create_call("default", "r").await.unwrap();
        assert!(agent.join(&call).await.is_err());
    }
}
