// src/types.rs
// Data shared between the worker, the escalation protocol and the sink

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Target language. Identity is the code alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Language {
    pub code: String,
    pub display_name: String,
}

impl Language {
    pub fn new(code: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            display_name: display_name.into(),
        }
    }
}

impl PartialEq for Language {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for Language {}

/// Snapshot of what the user typed, read once per loop tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInput {
    pub text: String,
    pub language: Language,
}

/// Context handed from the shallow pass to the deep pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EscalationContext {
    /// Names of flags that came back `yes`, in reply order, no duplicates
    pub issue_flags: Vec<String>,
    pub detected_input_language: String,
}

impl EscalationContext {
    /// Flags joined the way the deep template expects them
    pub fn flags_joined(&self) -> String {
        self.issue_flags.join(", ")
    }
}

/// The request a result answers. Kept so a result can be refined later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub text: String,
    pub language: Language,
    pub context: EscalationContext,
}

/// One value of the escalation sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationResult {
    pub translation: String,
    /// A deep pass is still expected and may supersede this value
    pub pending: bool,
    /// Interim notice from the shallow pass, only set while pending
    pub notification: Option<String>,
    pub request: TranslationRequest,
}

/// Canonical UI string -> translated string
pub type LocalizationCatalog = HashMap<String, String>;
