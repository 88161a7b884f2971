//! Integration tests for the background reconciliation worker
//!
//! All tests run with paused virtual time and mock providers.


use ai_translator::background::{WorkerConfig, WorkerHandle, spawn};
use ai_translator::llm::{DEEP_TEMPLATE, SHALLOW_TEMPLATE};
use ai_translator::types::{EscalationContext, LocalizationCatalog, TranslationRequest, TranslationResult};
use std::sync::Arc;
use std::time::Duration;
use test_utils::*;
use tokio::task::JoinHandle;

const UI_KEYS: [&str; 2] = ["Processing...", "Refine"];

const SHALLOW_ESCALATES: &str = "@Input language: english\n@Translation: Hola\n@Text is ambiguous: yes\n@Text has idioms: yes\n@Notification: Checking idioms";
const SHALLOW_FINE: &str = "@Input language: English\n@Translation: Hola\n@Text is ambiguous: no\n@Text has idioms: yes";
const DEEP_REPLY: &str = "@Analysis: a plain greeting\n@Translation: ¡Hola!";

struct Harness {
    sink: Arc<RecordingSink>,
    fast: Arc<MockFastTranslator>,
    model: Arc<ScriptedModel>,
    connector: Arc<MockConnector>,
    handle: WorkerHandle,
    join: JoinHandle<()>,
}

impl Harness {
    fn start(model: Arc<ScriptedModel>, config: WorkerConfig) -> Self {
        let sink = RecordingSink::new(spanish(), &UI_KEYS);
        let fast = MockFastTranslator::new();
        let connector = MockConnector::new(model.clone());
        let (handle, join) = spawn(sink.clone(), fast.clone(), connector.clone(), config);
        Self {
            sink,
            fast,
            model,
            connector,
            handle,
            join,
        }
    }

    /// Worker with default timing, past its first (localization) iteration
    async fn ready(model: Arc<ScriptedModel>, connect: bool) -> Self {
        let harness = Self::start(model, WorkerConfig::default());
        if connect {
            harness.handle.rebind_credentials("sk-test").await.unwrap();
        }
        settle().await;
        harness.sink.clear();
        harness
    }
}

fn catalog(pairs: &[(&str, &str)]) -> LocalizationCatalog {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn end_is_last_and_once_per_start(events: &[SinkEvent]) {
    let starts = events.iter().filter(|e| matches!(e, SinkEvent::Start(_))).count();
    let ends = events.iter().filter(|e| matches!(e, SinkEvent::End)).count();
    assert_eq!(starts, ends, "{:?}", events);
    if starts > 0 {
        assert_eq!(events.last(), Some(&SinkEvent::End), "{:?}", events);
    }
}

#[tokio::test(start_paused = true)]
async fn test_first_wakeup_builds_localization_only() {
    let harness = Harness::start(ScriptedModel::new(&[]), WorkerConfig::default());
    settle().await;

    assert_eq!(
        harness.sink.events(),
        vec![SinkEvent::Localization(catalog(&[
            ("Processing...", "[es] Processing..."),
            ("Refine", "[es] Refine"),
        ]))]
    );
    // One batch call for all keys
    assert_eq!(harness.fast.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unforced_poll_runs_fast_pass_only() {
    let harness = Harness::ready(ScriptedModel::new(&[]), true).await;

    harness.sink.set_text("  Hello  ");
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(
        harness.sink.events(),
        vec![
            SinkEvent::Start(false),
            SinkEvent::Fast("[es] Hello".into()),
            SinkEvent::End,
        ]
    );
    assert!(harness.model.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unchanged_text_is_not_retranslated() {
    let harness = Harness::ready(ScriptedModel::new(&[]), false).await;

    harness.sink.set_text("Hello");
    tokio::time::sleep(Duration::from_secs(5)).await;
    let calls_after_first = harness.fast.calls();
    harness.sink.clear();

    // Several more polls with the same text
    tokio::time::sleep(Duration::from_secs(15)).await;
    assert!(harness.sink.events().is_empty());
    assert_eq!(harness.fast.calls(), calls_after_first);

    harness.sink.set_text("Hello again");
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(harness.sink.fast_results(), vec!["[es] Hello again"]);
}

#[tokio::test(start_paused = true)]
async fn test_unforced_cycles_are_rate_limited() {
    let config = WorkerConfig {
        poll_interval: Duration::from_secs(1),
        min_update_interval: Duration::from_secs(3),
        ..Default::default()
    };
    let harness = Harness::start(ScriptedModel::new(&[]), config);
    settle().await;
    harness.sink.clear();

    // t = 0.5: picked up by the poll at t = 1
    tokio::time::sleep(Duration::from_millis(400)).await;
    harness.sink.set_text("A");
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(harness.sink.fast_results(), vec!["[es] A"]);

    // t = 1.5: polls at 2 and 3 are too soon after the update at 1
    harness.sink.set_text("B");
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(harness.sink.fast_results(), vec!["[es] A"]);

    // poll at 4 is allowed
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(harness.sink.fast_results(), vec!["[es] A", "[es] B"]);
}

#[tokio::test(start_paused = true)]
async fn test_forced_cycle_escalates_to_deep_pass() {
    let harness = Harness::ready(ScriptedModel::new(&[SHALLOW_ESCALATES, DEEP_REPLY]), true).await;

    harness.sink.set_text("Hello");
    harness.handle.force_translate();
    settle().await;

    let events = harness.sink.events();
    assert_eq!(events.len(), 5, "{:?}", events);
    assert_eq!(events[0], SinkEvent::Start(true));
    assert_eq!(events[1], SinkEvent::Fast("[es] Hello".into()));
    end_is_last_and_once_per_start(&events);

    let results = harness.sink.full_results();
    assert_eq!(results.len(), 2);
    assert!(results[0].pending);
    assert_eq!(results[0].translation, "Hola");
    assert_eq!(results[0].notification.as_deref(), Some("Checking idioms"));
    assert!(!results[1].pending);
    assert_eq!(results[1].translation, "¡Hola!");

    assert_eq!(harness.model.templates(), vec![SHALLOW_TEMPLATE, DEEP_TEMPLATE]);
    let (_, deep_vars) = &harness.model.calls()[1];
    assert_eq!(deep_vars["Flags"], "Text is ambiguous, Text has idioms");
    assert_eq!(deep_vars["InputLanguage"], "English");
    assert_eq!(deep_vars["FastTranslation"], "Hola");
    assert_eq!(deep_vars["Language"], "Spanish");
}

#[tokio::test(start_paused = true)]
async fn test_forced_cycle_ignores_debounce_and_uses_cache() {
    let harness = Harness::ready(ScriptedModel::new(&[SHALLOW_FINE, SHALLOW_FINE]), true).await;

    harness.sink.set_text("Hello");
    harness.handle.force_translate();
    settle().await;
    let fast_calls = harness.fast.calls();

    // Same text, immediately: still runs because it is forced
    harness.handle.force_translate();
    settle().await;

    let results = harness.sink.full_results();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| !r.pending));
    assert_eq!(harness.sink.fast_results(), vec!["[es] Hello", "[es] Hello"]);
    assert_eq!(harness.fast.calls(), fast_calls, "second fast pass should hit the cache");
    end_is_last_and_once_per_start(&harness.sink.events());
}

#[tokio::test(start_paused = true)]
async fn test_force_during_deep_pass_abandons_it() {
    let model = ScriptedModel::with_delay(
        &[SHALLOW_ESCALATES, "@Translation: Hola otra vez\n@Text has idioms: no"],
        Duration::from_secs(1),
    );
    let harness = Harness::ready(model, true).await;

    let handle = harness.handle.clone();
    harness.sink.on_pending(move || handle.force_translate());

    harness.sink.set_text("Hello");
    harness.handle.force_translate();
    tokio::time::sleep(Duration::from_secs(5)).await;

    let results = harness.sink.full_results();
    assert_eq!(results.len(), 2, "{:?}", results);
    assert!(results[0].pending);
    assert_eq!(results[0].translation, "Hola");
    assert!(!results[1].pending);
    assert_eq!(results[1].translation, "Hola otra vez");

    // The deep template was never run
    assert_eq!(harness.model.templates(), vec![SHALLOW_TEMPLATE, SHALLOW_TEMPLATE]);

    let events = harness.sink.events();
    assert_eq!(events[3], SinkEvent::End, "{:?}", events);
    assert_eq!(events[4], SinkEvent::Start(true), "{:?}", events);
    end_is_last_and_once_per_start(&events);
}

#[tokio::test(start_paused = true)]
async fn test_not_connected_blocks_forced_cycle() {
    let harness = Harness::ready(ScriptedModel::new(&[SHALLOW_FINE]), false).await;

    harness.sink.set_text("Hello");
    harness.handle.force_translate();
    settle().await;

    let events = harness.sink.events();
    assert_eq!(events.len(), 4, "{:?}", events);
    assert_eq!(events[0], SinkEvent::Start(true));
    assert_eq!(events[1], SinkEvent::Fast("[es] Hello".into()));
    assert!(matches!(&events[2], SinkEvent::Error(msg) if msg.contains("not connected")));
    assert_eq!(events[3], SinkEvent::End);
    assert!(harness.model.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_failed_rebind_disconnects() {
    let harness = Harness::ready(ScriptedModel::new(&[SHALLOW_FINE]), true).await;
    assert!(harness.handle.is_connected().await);

    let err = harness.handle.rebind_credentials(REJECTED_KEY).await.unwrap_err();
    assert!(err.to_string().contains("invalid API key"));
    assert!(!harness.handle.is_connected().await);
    assert_eq!(harness.connector.attempts(), 2);
    assert_eq!(harness.sink.errors().len(), 1);

    harness.sink.set_text("Hello");
    harness.handle.force_translate();
    settle().await;
    assert!(harness.sink.errors()[1].contains("not connected"));

    // A good key restores the session
    harness.handle.rebind_credentials("sk-new").await.unwrap();
    harness.handle.force_translate();
    settle().await;
    assert_eq!(harness.sink.full_results().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_language_change_rebuilds_before_translating() {
    let harness = Harness::ready(ScriptedModel::new(&[SHALLOW_FINE]), true).await;

    harness.sink.set_text("Hello");
    harness.sink.set_language(german());
    harness.handle.force_translate();
    settle().await;

    let events = harness.sink.events();
    assert_eq!(
        events[0],
        SinkEvent::Localization(catalog(&[
            ("Processing...", "[de] Processing..."),
            ("Refine", "[de] Refine"),
        ]))
    );
    assert_eq!(events[1], SinkEvent::Start(true));
    assert_eq!(events[2], SinkEvent::Fast("[de] Hello".into()));
    assert_eq!(harness.sink.full_results()[0].request.language, german());
    end_is_last_and_once_per_start(&events);
}

#[tokio::test(start_paused = true)]
async fn test_language_change_counts_as_forced() {
    let harness = Harness::ready(ScriptedModel::new(&[SHALLOW_FINE]), true).await;

    // No force request: the poll notices the new language on its own
    harness.sink.set_text("Hello");
    harness.sink.set_language(german());
    tokio::time::sleep(Duration::from_secs(5)).await;

    let events = harness.sink.events();
    assert!(matches!(events[0], SinkEvent::Localization(_)), "{:?}", events);
    assert_eq!(events[1], SinkEvent::Start(true));
    assert_eq!(harness.model.templates(), vec![SHALLOW_TEMPLATE]);
}

#[tokio::test(start_paused = true)]
async fn test_localization_mismatch_keeps_catalog() {
    let harness = Harness::ready(ScriptedModel::new(&[]), false).await;

    harness.fast.set_mode(FastMode::Collapse);
    harness.sink.set_language(german());
    harness.handle.force_translate();
    settle().await;

    let events = harness.sink.events();
    assert_eq!(events.len(), 1, "{:?}", events);
    assert!(matches!(&events[0], SinkEvent::Error(msg) if msg.contains("localization count mismatch")));
    assert!(harness.sink.catalogs().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_refine_runs_deep_pass_only() {
    let harness = Harness::ready(ScriptedModel::new(&["@Translation: Refinado"]), true).await;

    let previous = TranslationResult {
        translation: "Hola".into(),
        pending: false,
        notification: None,
        request: TranslationRequest {
            text: "Hello".into(),
            language: spanish(),
            context: EscalationContext {
                issue_flags: vec!["Text has idioms".into()],
                detected_input_language: "English".into(),
            },
        },
    };

    // A pending text change waits for a later iteration
    harness.sink.set_text("Something else");
    harness.handle.refine(previous.clone());
    settle().await;

    let events = harness.sink.events();
    assert_eq!(events.len(), 3, "{:?}", events);
    assert_eq!(events[0], SinkEvent::Start(true));
    assert!(matches!(&events[1], SinkEvent::Full(r) if r.translation == "Refinado" && !r.pending));
    assert_eq!(events[2], SinkEvent::End);

    assert_eq!(harness.model.templates(), vec![DEEP_TEMPLATE]);
    let (_, vars) = &harness.model.calls()[0];
    assert_eq!(vars["UserInput"], "Hello");
    assert_eq!(vars["FastTranslation"], "Hola");
    assert_eq!(vars["Flags"], "Text has idioms");
    assert_eq!(vars["InputLanguage"], "English");
}

#[tokio::test(start_paused = true)]
async fn test_latest_refinement_wins() {
    let harness = Harness::ready(ScriptedModel::new(&["@Translation: Second"]), true).await;

    let make = |translation: &str| TranslationResult {
        translation: translation.into(),
        pending: false,
        notification: None,
        request: TranslationRequest {
            text: "Hello".into(),
            language: spanish(),
            context: EscalationContext::default(),
        },
    };
    harness.handle.refine(make("first"));
    harness.handle.refine(make("second"));
    settle().await;

    let calls = harness.model.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1["FastTranslation"], "second");
}

#[tokio::test(start_paused = true)]
async fn test_fast_failure_reported_and_cycle_ended() {
    let harness = Harness::ready(ScriptedModel::new(&[]), true).await;

    harness.fast.set_mode(FastMode::Fail);
    harness.sink.set_text("Hello");
    tokio::time::sleep(Duration::from_secs(5)).await;

    let events = harness.sink.events();
    assert_eq!(events.len(), 3, "{:?}", events);
    assert_eq!(events[0], SinkEvent::Start(false));
    assert!(matches!(&events[1], SinkEvent::Error(msg) if msg.contains("fast provider unavailable")));
    assert_eq!(events[2], SinkEvent::End);

    // The loop survives and picks up the next change
    harness.fast.set_mode(FastMode::Tag);
    harness.sink.set_text("Hello!");
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(harness.sink.fast_results(), vec!["[es] Hello!"]);
}

#[tokio::test(start_paused = true)]
async fn test_deep_failure_keeps_shallow_result() {
    let harness = Harness::ready(
        ScriptedModel::new(&[SHALLOW_ESCALATES, "@Analysis: no translation here"]),
        true,
    )
    .await;

    harness.sink.set_text("Hello");
    harness.handle.force_translate();
    settle().await;

    let events = harness.sink.events();
    assert_eq!(events.len(), 5, "{:?}", events);
    assert!(matches!(&events[2], SinkEvent::Full(r) if r.pending));
    assert!(matches!(&events[3], SinkEvent::Error(msg) if msg.contains("missing field 'Translation'")));
    assert_eq!(events[4], SinkEvent::End);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_worker() {
    let harness = Harness::ready(ScriptedModel::new(&[]), false).await;

    harness.handle.shutdown();
    let joined = tokio::time::timeout(Duration::from_secs(1), harness.join).await;
    assert!(joined.is_ok());
}
