//! Interactive questions asked during a command.
//!
//! Prompts are an explicit suspension point: the recorder awaits an answer,
//! and a cancelled prompt surfaces as [`BeeError::UserCancelled`] instead of
//! terminating the process from inside a callback.

use std::io::{BufRead, Write};

use async_trait::async_trait;

use crate::error::{BeeError, Result};

/// Checks a text answer; `Err` carries the message shown before re-asking.
pub type Validator = fn(&str) -> std::result::Result<(), String>;

#[async_trait]
pub trait Prompt: Send + Sync {
    /// Ask for free text, re-asking until `validate` accepts the answer.
    async fn text(&self, message: &str, validate: Validator) -> Result<String>;

    /// Ask a yes/no question. An empty answer takes `default`.
    async fn confirm(&self, message: &str, default: bool) -> Result<bool>;
}

// ---------------------------------------------------------------------------
// Terminal
// ---------------------------------------------------------------------------

/// Prompts on stderr, answers from stdin. End-of-input (Ctrl-D) cancels.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    async fn ask(&self, question: String) -> Result<String> {
        let answer = tokio::task::spawn_blocking(move || read_answer(&question))
            .await
            .map_err(|e| BeeError::Io(std::io::Error::other(e)))??;
        answer.ok_or(BeeError::UserCancelled)
    }
}

fn read_answer(question: &str) -> std::io::Result<Option<String>> {
    let mut stderr = std::io::stderr().lock();
    write!(stderr, "? {} › ", question)?;
    stderr.flush()?;

    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line)? == 0 {
        writeln!(stderr)?;
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

#[async_trait]
impl Prompt for TerminalPrompt {
    async fn text(&self, message: &str, validate: Validator) -> Result<String> {
        loop {
            let answer = self.ask(message.to_string()).await?;
            match validate(&answer) {
                Ok(()) => return Ok(answer),
                Err(reason) => eprintln!("{}", reason),
            }
        }
    }

    async fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        let hint = if default { "(Y/n)" } else { "(y/N)" };
        loop {
            let answer = self.ask(format!("{} {}", message, hint)).await?;
            match parse_yes_no(&answer, default) {
                Some(value) => return Ok(value),
                None => eprintln!("Please answer y or n."),
            }
        }
    }
}

fn parse_yes_no(answer: &str, default: bool) -> Option<bool> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Scripted
// ---------------------------------------------------------------------------

#[cfg(test)]
pub use scripted::ScriptedPrompt;

#[cfg(test)]
mod scripted {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{parse_yes_no, Prompt, Validator};
    use crate::error::{BeeError, Result};

    /// Replays canned answers in order; running out of answers cancels.
    #[derive(Debug, Default)]
    pub struct ScriptedPrompt {
        answers: Mutex<VecDeque<String>>,
    }

    impl ScriptedPrompt {
        pub fn new<I, S>(answers: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self {
                answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            }
        }

        fn next(&self) -> Result<String> {
            self.answers
                .lock()
                .map_err(|_| BeeError::UserCancelled)?
                .pop_front()
                .ok_or(BeeError::UserCancelled)
        }
    }

    #[async_trait]
    impl Prompt for ScriptedPrompt {
        async fn text(&self, _message: &str, validate: Validator) -> Result<String> {
            loop {
                let answer = self.next()?;
                if validate(&answer).is_ok() {
                    return Ok(answer);
                }
            }
        }

        async fn confirm(&self, _message: &str, default: bool) -> Result<bool> {
            loop {
                if let Some(value) = parse_yes_no(&self.next()?, default) {
                    return Ok(value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short(s: &str) -> std::result::Result<(), String> {
        if s.len() <= 3 {
            Ok(())
        } else {
            Err("too long".into())
        }
    }

    #[test]
    fn test_parse_yes_no() {
        assert_eq!(parse_yes_no("", true), Some(true));
        assert_eq!(parse_yes_no("", false), Some(false));
        assert_eq!(parse_yes_no(" YES ", false), Some(true));
        assert_eq!(parse_yes_no("n", true), Some(false));
        assert_eq!(parse_yes_no("maybe", true), None);
    }

    #[tokio::test]
    async fn test_scripted_text_skips_invalid_answers() {
        let prompt = ScriptedPrompt::new(["toolong", "ok"]);
        assert_eq!(prompt.text("note", short).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_scripted_prompt_cancels_when_exhausted() {
        let prompt = ScriptedPrompt::new(Vec::<String>::new());
        assert!(matches!(
            prompt.confirm("sure?", true).await,
            Err(BeeError::UserCancelled)
        ));
    }
}
