//! Scripted generator for tests

use async_trait::async_trait;
use parking_lot::Mutex;

use super::client::{AiError, TextGenerator};

/// Returns a fixed reply and records every prompt it receives
pub struct ScriptedGenerator {
    reply: Result<String, AiError>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: AiError) -> Self {
        Self {
            reply: Err(error),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn last_prompt(&self) -> Option<(String, String)> {
        self.prompts.lock().last().cloned()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, system: &str, user: &str) -> Result<String, AiError> {
        self.prompts.lock().push((system.to_string(), user.to_string()));
        self.reply.clone()
    }
}
