// src/cli/console.rs
// Interactive console: a line-oriented Sink plus the stdin command loop

use super::Settings;
use crate::background::{self, WorkerHandle};
use crate::config::{LanguageCatalog, TranslatorConfig};
use crate::error::TranslatorError;
use crate::fast::GoogleTranslateClient;
use crate::llm::{ChatModelConnector, PromptLibrary};
use crate::sink::Sink;
use crate::types::{Language, LocalizationCatalog, TranslationResult, UserInput};
use anyhow::Result;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

const PROCESSING: &str = "Processing...";
const NOT_ACCURATE: &str = "Translation is not accurate and will be updated soon.";
const FAST_LABEL: &str = "Fast translation (Google Translate):";
const FULL_LABEL: &str = "Improved translation (AI):";
const REFINE_HINT: &str = "Type :refine to improve this translation further.";
const SEPARATOR: &str = "----------------";

/// UI strings in display order; these are the localization keys
const UI_STRINGS: [&str; 5] = [PROCESSING, NOT_ACCURATE, FAST_LABEL, FULL_LABEL, REFINE_HINT];

const HELP: &str = "\
Type text and press Enter; it is translated on the next poll.
  :force        improved translation of the current text now
  :refine       improve the last result again
  :lang <code>  switch target language (code or name)
  :key <key>    use another API key
  :quit         exit";

struct ConsoleState {
    text: String,
    language: Language,
    localization: LocalizationCatalog,
    last_result: Option<TranslationResult>,
}

/// Sink that prints to a writer (stdout in the binary)
pub struct ConsoleSink {
    state: Mutex<ConsoleState>,
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleSink {
    pub fn new(language: Language, out: Box<dyn Write + Send>) -> Self {
        Self {
            state: Mutex::new(ConsoleState {
                text: String::new(),
                language,
                localization: LocalizationCatalog::new(),
                last_result: None,
            }),
            out: Mutex::new(out),
        }
    }

    pub fn stdout(language: Language) -> Self {
        Self::new(language, Box::new(std::io::stdout()))
    }

    fn state(&self) -> MutexGuard<'_, ConsoleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the input text
    pub fn set_text(&self, text: impl Into<String>) {
        self.state().text = text.into();
    }

    /// Switch the target language; the last result no longer applies
    pub fn set_language(&self, language: Language) {
        let mut state = self.state();
        state.language = language;
        state.last_result = None;
    }

    pub fn language(&self) -> Language {
        self.state().language.clone()
    }

    /// Last final (non-pending) result, if any
    pub fn refinable_result(&self) -> Option<TranslationResult> {
        self.state().last_result.clone().filter(|r| !r.pending)
    }

    fn localized(&self, key: &str) -> String {
        self.state()
            .localization
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    pub fn print(&self, line: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
            debug!(error = %e, "Console write failed");
        }
    }
}

impl Sink for ConsoleSink {
    fn user_input(&self) -> UserInput {
        let state = self.state();
        UserInput {
            text: state.text.clone(),
            language: state.language.clone(),
        }
    }

    fn start_translate(&self, force: bool) {
        if force {
            self.print(&self.localized(PROCESSING));
        }
    }

    fn fast_translated(&self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.print(&format!("{}\n{}", self.localized(FAST_LABEL), text));
    }

    fn full_translated(&self, result: &TranslationResult) {
        self.state().last_result = Some(result.clone());

        let mut block = format!("{}\n{}", self.localized(FULL_LABEL), result.translation);
        if result.pending {
            block.push_str(&format!("\n{}\n{}", SEPARATOR, self.localized(NOT_ACCURATE)));
            if let Some(ref notification) = result.notification {
                block.push_str(&format!("\n{}", notification));
            }
        } else {
            block.push_str(&format!("\n{}", self.localized(REFINE_HINT)));
        }
        self.print(&block);
    }

    fn update_localization(&self, catalog: &LocalizationCatalog) {
        debug!(strings = catalog.len(), "Console localization updated");
        self.state().localization = catalog.clone();
    }

    fn localization_strings(&self) -> Vec<String> {
        UI_STRINGS.iter().map(|s| s.to_string()).collect()
    }

    fn error(&self, err: &TranslatorError) {
        self.print(&format!("Error: {}", err.to_user_string()));
    }

    fn end_translate(&self) {}
}

/// Run the interactive console until `:quit` or end of input
pub async fn run_console(
    settings: Settings,
    catalog: LanguageCatalog,
    mut file_config: TranslatorConfig,
) -> Result<()> {
    let prompts = PromptLibrary::load(settings.prompts_dir.as_deref())?;
    let connector = Arc::new(ChatModelConnector::new(
        settings.api_base.clone(),
        settings.model.clone(),
        prompts,
    ));
    let sink = Arc::new(ConsoleSink::stdout(settings.language.clone()));

    let (handle, join) = background::spawn(
        sink.clone(),
        Arc::new(GoogleTranslateClient::new()),
        connector,
        settings.worker.clone(),
    );

    sink.print(&format!(
        "Target language: {} ({}). Type :help for commands.",
        settings.language.display_name, settings.language.code
    ));

    match settings.api_key.as_deref() {
        Some(key) => {
            let _ = handle.rebind_credentials(key).await;
        }
        None => sink.print("No API key set: only fast translations until you use :key <api-key>."),
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if !handle_line(&line, &sink, &handle, &catalog).await {
            break;
        }
    }

    handle.shutdown();
    if let Err(e) = join.await.map_err(TranslatorError::from) {
        warn!(error = %e, "Worker task ended abnormally");
    }

    let language = sink.language();
    file_config.ui.language = Some(language.code.clone());
    if let Err(e) = file_config.save() {
        warn!(error = %e, "Failed to save selected language");
    }
    info!(language = %language.code, "Console closed");

    Ok(())
}

/// Handle one input line. Returns false when the console should exit.
async fn handle_line(line: &str, sink: &ConsoleSink, handle: &WorkerHandle, catalog: &LanguageCatalog) -> bool {
    let trimmed = line.trim();
    let (command, argument) = match trimmed.split_once(char::is_whitespace) {
        Some((command, argument)) => (command, argument.trim()),
        None => (trimmed, ""),
    };

    match command {
        ":quit" | ":q" => return false,
        ":help" => sink.print(HELP),
        ":force" => handle.force_translate(),
        ":refine" => match sink.refinable_result() {
            Some(previous) => handle.refine(previous),
            None => sink.print("Nothing to refine yet. Use :force first."),
        },
        ":lang" => match catalog.resolve(argument) {
            Some(language) => {
                sink.print(&format!("Target language: {} ({})", language.display_name, language.code));
                sink.set_language(language);
                handle.force_translate();
            }
            None => sink.print(&format!("Unknown language '{}'.", argument)),
        },
        ":key" => {
            if argument.is_empty() {
                sink.print("Usage: :key <api-key>");
            } else if handle.rebind_credentials(argument).await.is_ok() {
                sink.print("API key accepted.");
            }
        }
        _ if command.starts_with(':') => sink.print(&format!("Unknown command '{}'. Type :help.", command)),
        _ => sink.set_text(line),
    }
    true
}
