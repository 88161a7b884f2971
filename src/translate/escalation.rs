// src/translate/escalation.rs
// Shallow review pass with conditional escalation to a deep pass

use super::parser::{ParsedReply, parse};
use crate::error::{Result, TranslatorError};
use crate::llm::{DEEP_TEMPLATE, LanguageModel, PromptVariables, SHALLOW_TEMPLATE};
use crate::types::{EscalationContext, Language, TranslationRequest, TranslationResult};
use async_stream::try_stream;
use futures::Stream;
use std::sync::Arc;
use tracing::{debug, info};

/// Number of raised flags at which the deep pass runs
pub const ESCALATION_THRESHOLD: usize = 2;

const TRANSLATION_FIELD: &str = "Translation";
const INPUT_LANGUAGE_FIELD: &str = "Input language";
const NOTIFICATION_FIELD: &str = "Notification";
const UNKNOWN_LANGUAGE: &str = "unknown";
const NO_FLAGS: &str = "none";
const NO_NOTIFICATION: &str = "none";

/// Drives the language model through the shallow and deep templates
#[derive(Clone)]
pub struct EscalationProtocol {
    model: Arc<dyn LanguageModel>,
}

impl EscalationProtocol {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Lazy sequence of one or two results.
    ///
    /// Nothing runs until the stream is polled. The deep pass starts only when
    /// the stream is polled past the pending result, so dropping the stream
    /// after the first item abandons it. The first error ends the sequence.
    pub fn run(
        &self,
        text: String,
        fast_translation: String,
        language: Language,
    ) -> impl Stream<Item = Result<TranslationResult>> + Send + 'static {
        let model = self.model.clone();

        try_stream! {
            let shallow = invoke(
                model.as_ref(),
                SHALLOW_TEMPLATE,
                shallow_variables(&text, &fast_translation, &language),
            )
            .await?;
            let translation = required_translation(&shallow)?;

            let issue_count = shallow.issue_count();
            let context = EscalationContext {
                issue_flags: shallow.active_flags(),
                detected_input_language: detect_input_language(shallow.field(INPUT_LANGUAGE_FIELD)),
            };
            let request = TranslationRequest {
                text,
                language,
                context,
            };

            if issue_count < ESCALATION_THRESHOLD {
                debug!(issue_count, "Shallow pass accepted");
                yield TranslationResult {
                    translation,
                    pending: false,
                    notification: None,
                    request,
                };
            } else {
                info!(
                    issue_count,
                    flags = %request.context.flags_joined(),
                    input_language = %request.context.detected_input_language,
                    "Escalating to deep pass"
                );
                yield TranslationResult {
                    translation: translation.clone(),
                    pending: true,
                    notification: notification(&shallow),
                    request: request.clone(),
                };

                let deep = invoke(model.as_ref(), DEEP_TEMPLATE, deep_variables(&request, &translation)).await?;
                yield TranslationResult {
                    translation: required_translation(&deep)?,
                    pending: false,
                    notification: None,
                    request,
                };
            }
        }
    }

    /// Run only the deep pass against an earlier result
    pub async fn refine(&self, previous: &TranslationResult) -> Result<TranslationResult> {
        info!(
            language = %previous.request.language.code,
            flags = %previous.request.context.flags_joined(),
            "Refining previous translation"
        );
        let variables = deep_variables(&previous.request, &previous.translation);
        let deep = invoke(self.model.as_ref(), DEEP_TEMPLATE, variables).await?;

        Ok(TranslationResult {
            translation: required_translation(&deep)?,
            pending: false,
            notification: None,
            request: previous.request.clone(),
        })
    }
}

async fn invoke(model: &dyn LanguageModel, template: &str, variables: PromptVariables) -> Result<ParsedReply> {
    let raw = model
        .run(template, &variables)
        .await
        .map_err(TranslatorError::provider)?;
    let reply = parse(&raw);
    debug!(
        template,
        model = %model.model_name(),
        fields = ?reply.fields,
        flags = ?reply.flags,
        "Parsed model reply"
    );
    Ok(reply)
}

fn required_translation(reply: &ParsedReply) -> Result<String> {
    reply
        .field(TRANSLATION_FIELD)
        .map(str::to_string)
        .ok_or_else(|| TranslatorError::MissingField(TRANSLATION_FIELD.to_string()))
}

/// The shallow reply's notice, unless the model answered "none"
fn notification(reply: &ParsedReply) -> Option<String> {
    reply
        .field(NOTIFICATION_FIELD)
        .filter(|text| !text.eq_ignore_ascii_case(NO_NOTIFICATION))
        .map(str::to_string)
}

fn shallow_variables(text: &str, fast_translation: &str, language: &Language) -> PromptVariables {
    let mut vars = PromptVariables::new();
    vars.insert("UserInput".into(), text.to_string());
    vars.insert("FastTranslation".into(), fast_translation.to_string());
    vars.insert("Language".into(), language.display_name.clone());
    vars
}

/// `reference` is the shallow translation on escalation, or the previous
/// result on refinement
fn deep_variables(request: &TranslationRequest, reference: &str) -> PromptVariables {
    let mut vars = shallow_variables(&request.text, reference, &request.language);

    let input_language = if request.context.detected_input_language.is_empty() {
        UNKNOWN_LANGUAGE.to_string()
    } else {
        request.context.detected_input_language.clone()
    };
    let flags = if request.context.issue_flags.is_empty() {
        NO_FLAGS.to_string()
    } else {
        request.context.flags_joined()
    };

    vars.insert("InputLanguage".into(), input_language);
    vars.insert("Flags".into(), flags);
    vars
}

/// First word of the reported input language, capitalized.
///
/// `"english, with some French"` becomes `"English"`; a missing or blank
/// field becomes `"unknown"`.
pub fn detect_input_language(field: Option<&str>) -> String {
    let token = field
        .and_then(|value| value.split(|c: char| c.is_whitespace() || c == ',').find(|t| !t.is_empty()));

    match token {
        Some(token) => {
            let mut chars = token.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => UNKNOWN_LANGUAGE.to_string(),
            }
        }
        None => UNKNOWN_LANGUAGE.to_string(),
    }
}
