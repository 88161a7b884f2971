// src/llm/prompt.rs
// Named prompt templates with `{Variable}` placeholders

use crate::error::{Result, TranslatorError};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info};

/// Template for the cheap review pass
pub const SHALLOW_TEMPLATE: &str = "translate_shallow";
/// Template for the escalated pass
pub const DEEP_TEMPLATE: &str = "translate_deep";

const DEFAULT_SHALLOW: &str = include_str!("../../prompts/translate_shallow.txt");
const DEFAULT_DEEP: &str = include_str!("../../prompts/translate_deep.txt");

/// Variables bound into a template, by placeholder name
pub type PromptVariables = BTreeMap<String, String>;

/// Set of templates available to a language model
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    templates: HashMap<String, String>,
}

impl Default for PromptLibrary {
    fn default() -> Self {
        let mut templates = HashMap::new();
        templates.insert(SHALLOW_TEMPLATE.to_string(), DEFAULT_SHALLOW.to_string());
        templates.insert(DEEP_TEMPLATE.to_string(), DEFAULT_DEEP.to_string());
        Self { templates }
    }
}

impl PromptLibrary {
    /// Built-in templates, overridden by `<dir>/<name>.txt` where present
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        let mut library = Self::default();
        let Some(dir) = dir else {
            return Ok(library);
        };

        for name in [SHALLOW_TEMPLATE, DEEP_TEMPLATE] {
            let path = dir.join(format!("{}.txt", name));
            if path.is_file() {
                let body = std::fs::read_to_string(&path)?;
                info!(template = name, path = %path.display(), "Loaded prompt override");
                library.templates.insert(name.to_string(), body);
            } else {
                debug!(template = name, path = %path.display(), "No prompt override, using built-in");
            }
        }

        Ok(library)
    }

    /// Add or replace a template
    pub fn insert(&mut self, name: impl Into<String>, body: impl Into<String>) {
        self.templates.insert(name.into(), body.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.templates.get(name).map(String::as_str)
    }

    /// Render a template with the given variables
    pub fn render(&self, name: &str, variables: &PromptVariables) -> Result<String> {
        let template = self
            .get(name)
            .ok_or_else(|| TranslatorError::Config(format!("unknown prompt template '{}'", name)))?;
        render_template(name, template, variables)
    }
}

fn render_template(name: &str, template: &str, variables: &PromptVariables) -> Result<String> {
    let mut out = String::with_capacity(template.len() + 256);
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('}') {
            out.push('}');
            rest = &tail[1..];
            continue;
        }

        // `{` ... `}` group
        match tail[1..].find('}') {
            Some(end) => {
                let key = &tail[1..1 + end];
                if is_identifier(key) {
                    let value = variables.get(key).ok_or_else(|| {
                        TranslatorError::Config(format!(
                            "template '{}' uses {{{}}} but no such variable was supplied",
                            name, key
                        ))
                    })?;
                    out.push_str(value);
                } else {
                    out.push_str(&tail[..end + 2]);
                }
                rest = &tail[end + 2..];
            }
            None => {
                out.push_str(tail);
                rest = "";
            }
        }
    }
    out.push_str(rest);

    Ok(out)
}

fn is_identifier(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
