//! End-to-end dispatcher tests.
//!
//! Wiremock stands in for both the translation provider and the Telegram
//! API; the database is a throwaway SQLite file. Each test drives
//! `Dispatcher::handle_message` the same way the polling loop does and then
//! inspects what the bot sent and what it persisted.

use std::sync::Arc;
use tempfile::TempDir;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use translation_bot::{
    catalog::LanguageCatalog, db::Database, dispatcher::Dispatcher, telegram::BotClient,
    translator::TranslatorClient,
};

const CATALOG_JSON: &str = r#"{
    "translation": {
        "en": { "name": "English", "nativeName": "English", "dir": "ltr" },
        "es": { "name": "Spanish", "nativeName": "Español", "dir": "ltr" },
        "fr": { "name": "French", "nativeName": "Français", "dir": "ltr" },
        "de": { "name": "German", "nativeName": "Deutsch", "dir": "ltr" }
    }
}"#;

struct TestBot {
    dispatcher: Dispatcher,
    provider: MockServer,
    telegram: MockServer,
    db: Database,
    _dir: TempDir,
}

/// Assemble a dispatcher against mock servers and a temp database. The
/// Telegram mock accepts any sendMessage so tests can inspect what was sent.
async fn setup() -> TestBot {
    let provider = MockServer::start().await;
    let telegram = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bottest-token/sendMessage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "result": { "message_id": 1 }
        })))
        .mount(&telegram)
        .await;

    let dir = TempDir::new().expect("temp dir");
    let db_path = dir.path().join("bot.db");
    let db = Database::open(db_path.to_str().unwrap()).expect("open db");

    let catalog = LanguageCatalog::from_json(CATALOG_JSON).expect("catalog");
    let translator = TranslatorClient::new(provider.uri(), "test-key");
    let bot = Arc::new(BotClient::new(telegram.uri(), "test-token"));

    TestBot {
        dispatcher: Dispatcher::new(catalog, translator, db.clone(), bot),
        provider,
        telegram,
        db,
        _dir: dir,
    }
}

/// Texts of all messages the bot sent, in order.
async fn sent_texts(telegram: &MockServer) -> Vec<String> {
    telegram
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path().ends_with("/sendMessage"))
        .map(|r| {
            let body: serde_json::Value = serde_json::from_slice(&r.body).expect("JSON body");
            body["text"].as_str().expect("text field").to_string()
        })
        .collect()
}

fn detect_response(language: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_json(serde_json::json!([{ "language": language, "score": 1.0 }]))
}

fn translate_response(translated: &str, to: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!([
        { "translations": [{ "text": translated, "to": to }] }
    ]))
}

// ==================== /translate ====================

#[tokio::test]
async fn test_translate_end_to_end() {
    let t = setup().await;

    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(detect_response("fr"))
        .mount(&t.provider)
        .await;
    Mock::given(method("POST"))
        .and(path("/translate"))
        .and(query_param("to", "en"))
        .and(query_param("from", "fr"))
        .respond_with(translate_response("Hello world", "en"))
        .mount(&t.provider)
        .await;

    t.dispatcher
        .handle_message(42, Some("alice"), "/translate Bonjour le monde")
        .await
        .expect("handler");

    let sent = sent_texts(&t.telegram).await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("Hello world"));
    assert!(sent[0].contains("Bonjour le monde"));
    assert!(sent[0].contains("`fr`"));
    assert!(sent[0].contains("`en`"));

    let stats = t.db.load_stats().expect("load").expect("stats written");
    assert_eq!(stats.total_translations, 1);
    assert_eq!(stats.language_counts.get("fr"), Some(&1));
    assert_eq!(stats.language_counts.get("en"), Some(&1));
}

#[tokio::test]
async fn test_translate_counts_accumulate() {
    let t = setup().await;

    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(detect_response("es"))
        .mount(&t.provider)
        .await;
    Mock::given(method("POST"))
        .and(path("/translate"))
        .respond_with(translate_response("hello", "en"))
        .mount(&t.provider)
        .await;

    for _ in 0..3 {
        t.dispatcher
            .handle_message(42, None, "/translate hola")
            .await
            .expect("handler");
    }

    let stats = t.db.load_stats().expect("load").expect("stats");
    assert_eq!(stats.total_translations, 3);
    assert_eq!(stats.language_counts.get("es"), Some(&3));
    assert_eq!(stats.language_counts.get("en"), Some(&3));
}

#[tokio::test]
async fn test_translate_provider_failure_sends_generic_retry() {
    let t = setup().await;

    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal provider details"))
        .mount(&t.provider)
        .await;

    t.dispatcher
        .handle_message(42, None, "/translate hola")
        .await
        .expect("handler recovers");

    let sent = sent_texts(&t.telegram).await;
    assert_eq!(
        sent,
        vec!["Error processing your request. Please try again later.".to_string()]
    );
    // Provider internals never leak, and nothing is recorded.
    assert!(!sent[0].contains("internal provider details"));
    assert_eq!(t.db.load_stats().expect("load"), None);
}

// ==================== /translate_to ====================

#[tokio::test]
async fn test_translate_to_end_to_end() {
    let t = setup().await;

    Mock::given(method("POST"))
        .and(path("/translate"))
        .and(query_param("to", "es"))
        .and(query_param("from", "en"))
        .respond_with(translate_response("Hola, ¿cómo estás?", "es"))
        .mount(&t.provider)
        .await;

    t.dispatcher
        .handle_message(42, None, "/translate_to es Hello, how are you?")
        .await
        .expect("handler");

    let sent = sent_texts(&t.telegram).await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("Hola"));
    assert!(sent[0].contains("`en` -> `es`"));

    let stats = t.db.load_stats().expect("load").expect("stats");
    assert_eq!(stats.total_translations, 1);
    assert_eq!(stats.language_counts.get("en"), Some(&1));
    assert_eq!(stats.language_counts.get("es"), Some(&1));
}

#[tokio::test]
async fn test_translate_to_invalid_code_no_network_no_stats() {
    let t = setup().await;

    t.dispatcher
        .handle_message(42, None, "/translate_to xx hello")
        .await
        .expect("handler");

    let sent = sent_texts(&t.telegram).await;
    assert_eq!(
        sent,
        vec!["Invalid language code. Please use a valid language code.".to_string()]
    );

    // No provider call was made and no stats were touched.
    let provider_requests = t.provider.received_requests().await.unwrap_or_default();
    assert!(provider_requests.is_empty());
    assert_eq!(t.db.load_stats().expect("load"), None);
}

#[tokio::test]
async fn test_translate_to_provider_failure_sends_generic_retry() {
    let t = setup().await;

    Mock::given(method("POST"))
        .and(path("/translate"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&t.provider)
        .await;

    t.dispatcher
        .handle_message(42, None, "/translate_to es hello")
        .await
        .expect("handler recovers");

    let sent = sent_texts(&t.telegram).await;
    assert_eq!(
        sent,
        vec!["Error processing your request. Please try again later.".to_string()]
    );
    assert_eq!(t.db.load_stats().expect("load"), None);
}

// ==================== /help and unknown commands ====================

#[tokio::test]
async fn test_help_lists_commands() {
    let t = setup().await;

    t.dispatcher
        .handle_message(42, None, "/help")
        .await
        .expect("handler");

    let sent = sent_texts(&t.telegram).await;
    assert_eq!(sent.len(), 1);
    for cmd in ["/translate", "/translate_to", "/stats", "/languages", "/feedback", "/top_languages"] {
        assert!(sent[0].contains(cmd), "help should mention {}", cmd);
    }
}

#[tokio::test]
async fn test_unknown_command_replies_generic() {
    let t = setup().await;

    t.dispatcher
        .handle_message(42, None, "/foo")
        .await
        .expect("handler");

    let sent = sent_texts(&t.telegram).await;
    assert_eq!(
        sent,
        vec!["Invalid command. Use /help to see the list of available commands.".to_string()]
    );
}

// ==================== /languages ====================

#[tokio::test]
async fn test_languages_lists_every_code_once_in_file_order() {
    let t = setup().await;

    t.dispatcher
        .handle_message(42, None, "/languages")
        .await
        .expect("handler");

    let sent = sent_texts(&t.telegram).await;
    assert_eq!(sent.len(), 1);

    for code in ["en", "es", "fr", "de"] {
        let needle = format!("`{}`", code);
        assert_eq!(
            sent[0].matches(&needle).count(),
            1,
            "{} should appear exactly once",
            code
        );
    }

    // File order
    let en = sent[0].find("`en`").unwrap();
    let es = sent[0].find("`es`").unwrap();
    let fr = sent[0].find("`fr`").unwrap();
    let de = sent[0].find("`de`").unwrap();
    assert!(en < es && es < fr && fr < de);
}

// ==================== /stats ====================

#[tokio::test]
async fn test_stats_with_no_data_reports_zero() {
    let t = setup().await;

    t.dispatcher
        .handle_message(42, None, "/stats")
        .await
        .expect("handler");

    let sent = sent_texts(&t.telegram).await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("Total Translations: 0"));
    assert!(sent[0].contains("*System Statistics*"));
    assert!(sent[0].contains("CPU Load"));
}

#[tokio::test]
async fn test_stats_reports_recorded_counts() {
    let t = setup().await;

    t.db.record_translation("fr", "en").expect("record");
    t.db.record_translation("es", "en").expect("record");

    t.dispatcher
        .handle_message(42, None, "/stats")
        .await
        .expect("handler");

    let sent = sent_texts(&t.telegram).await;
    assert!(sent[0].contains("Total Translations: 2"));
    assert!(sent[0].contains("`en`: 2 translations"));
    assert!(sent[0].contains("`fr`: 1 translations"));
    assert!(sent[0].contains("`es`: 1 translations"));
}

// ==================== /feedback ====================

#[tokio::test]
async fn test_feedback_persists_and_acknowledges() {
    let t = setup().await;

    t.dispatcher
        .handle_message(42, Some("alice"), "/feedback really useful bot")
        .await
        .expect("handler");

    let sent = sent_texts(&t.telegram).await;
    assert_eq!(sent, vec!["Thank you for your feedback!".to_string()]);

    let entries = t.db.list_feedback().expect("list");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].username.as_deref(), Some("alice"));
    assert_eq!(entries[0].message, "really useful bot");
}

#[tokio::test]
async fn test_feedback_without_username() {
    let t = setup().await;

    t.dispatcher
        .handle_message(42, None, "/feedback anonymous note")
        .await
        .expect("handler");

    let entries = t.db.list_feedback().expect("list");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].username, None);
}

// ==================== /top_languages ====================

#[tokio::test]
async fn test_top_languages_no_data() {
    let t = setup().await;

    t.dispatcher
        .handle_message(42, None, "/top_languages")
        .await
        .expect("handler");

    let sent = sent_texts(&t.telegram).await;
    assert_eq!(sent, vec!["No translation data available.".to_string()]);
}

#[tokio::test]
async fn test_top_languages_ordered_by_count() {
    let t = setup().await;

    let mut stats = translation_bot::db::Stats::default();
    stats.total_translations = 16;
    for (code, count) in [("es", 5), ("fr", 3), ("en", 8)] {
        stats.language_counts.insert(code.to_string(), count);
    }
    t.db.save_stats(&stats).expect("save");

    t.dispatcher
        .handle_message(42, None, "/top_languages")
        .await
        .expect("handler");

    let sent = sent_texts(&t.telegram).await;
    assert_eq!(sent.len(), 1);

    let en = sent[0].find("`en`: 8").expect("en line");
    let es = sent[0].find("`es`: 5").expect("es line");
    let fr = sent[0].find("`fr`: 3").expect("fr line");
    assert!(en < es && es < fr, "expected descending order: {}", sent[0]);
}

#[tokio::test]
async fn test_top_languages_caps_at_five() {
    let t = setup().await;

    let mut stats = translation_bot::db::Stats::default();
    stats.total_translations = 21;
    for (i, code) in ["en", "es", "fr", "de", "it", "pt"].iter().enumerate() {
        stats
            .language_counts
            .insert(code.to_string(), (10 - i) as i64);
    }
    t.db.save_stats(&stats).expect("save");

    t.dispatcher
        .handle_message(42, None, "/top_languages")
        .await
        .expect("handler");

    let sent = sent_texts(&t.telegram).await;
    assert!(sent[0].contains("`en`: 10"));
    assert!(sent[0].contains("`it`: 6"));
    assert!(!sent[0].contains("`pt`: 5"), "sixth language must be cut");
}

// ==================== non-command text ====================

#[tokio::test]
async fn test_plain_text_is_invalid_command() {
    let t = setup().await;

    t.dispatcher
        .handle_message(42, None, "just chatting")
        .await
        .expect("handler");

    let sent = sent_texts(&t.telegram).await;
    assert_eq!(
        sent,
        vec!["Invalid command. Use /help to see the list of available commands.".to_string()]
    );
}
