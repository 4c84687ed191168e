//! Password input seam.

use std::collections::VecDeque;

use fpw_common::{Error, Password, Result};

/// Source of passwords and sink for user-facing notices.
///
/// The terminal implementation lives in the CLI; [`ScriptedPrompt`] feeds
/// fixed answers for tests and non-interactive callers.
pub trait PasswordPrompt {
    /// Ask for a password without echoing it.
    ///
    /// # Errors
    /// - Input could not be read (no terminal, end of input)
    fn read_password(&mut self, prompt: &str) -> Result<Password>;

    /// Show a message to the user.
    fn notify(&mut self, message: &str);
}

/// Prompt that replays a fixed list of answers.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    prompts: Vec<String>,
    messages: Vec<String>,
}

impl ScriptedPrompt {
    /// Create a prompt answering with `answers` in order.
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
            messages: Vec::new(),
        }
    }

    /// Prompts shown so far.
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    /// Notices shown so far.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Answers not consumed yet.
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl PasswordPrompt for ScriptedPrompt {
    fn read_password(&mut self, prompt: &str) -> Result<Password> {
        self.prompts.push(prompt.to_string());
        self.answers
            .pop_front()
            .map(Password::new)
            .ok_or_else(|| Error::Prompt("No more input".to_string()))
    }

    fn notify(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}
