//! Integration tests for conversational turns.
//!
//! These tests drive the public API against the sample catalog shipped in
//! `flows/`:
//! 1. The four reference scenarios (greeting, blocked profile, profile after
//!    a context update, unusable business unit)
//! 2. Replay and concurrency guarantees
//! 3. Reset, repair and persistence across restarts

use futures::future::join_all;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use huntred_flow::adapters::{
    CatalogFlowRepository, FileConversationStore, InMemoryConversationStore, YamlFlowSource,
};
use huntred_flow::application::{FlowManager, FlowPolicy, ProcessMessageCommand};
use huntred_flow::domain::conversation::{ConversationState, ResponseDescriptor};
use huntred_flow::domain::flow::{BusinessUnitSettings, FlowCatalog};
use huntred_flow::domain::foundation::{BusinessUnitId, ConversationKey, PersonId};
use huntred_flow::ports::ConversationStore;

// =============================================================================
// Test Infrastructure
// =============================================================================

fn catalog_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("flows")
}

async fn sample_flows() -> Arc<CatalogFlowRepository> {
    let source = YamlFlowSource::new(catalog_path());
    Arc::new(
        CatalogFlowRepository::from_source(&source)
            .await
            .expect("sample catalog should load"),
    )
}

async fn engine_with(store: Arc<dyn ConversationStore>) -> Arc<FlowManager> {
    Arc::new(FlowManager::new(store, sample_flows().await, FlowPolicy::default()))
}

async fn engine() -> (Arc<FlowManager>, Arc<InMemoryConversationStore>) {
    let store = Arc::new(InMemoryConversationStore::new());
    let manager = engine_with(store.clone()).await;
    (manager, store)
}

fn key(business_unit: &str, person: &str) -> ConversationKey {
    ConversationKey::new(
        PersonId::new(person).unwrap(),
        BusinessUnitId::new(business_unit).unwrap(),
    )
}

async fn say(manager: &FlowManager, key: &ConversationKey, text: &str) -> ResponseDescriptor {
    manager
        .process_message(ProcessMessageCommand::new(
            key.person_id.clone(),
            key.business_unit.clone(),
            text,
        ))
        .await
        .expect("turn should not hit storage errors")
}

async fn stored(manager: &FlowManager, key: &ConversationKey) -> ConversationState {
    manager
        .conversation(key)
        .await
        .unwrap()
        .expect("conversation should be stored")
}

fn updates(pairs: &[(&str, serde_json::Value)]) -> BTreeMap<String, serde_json::Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

// =============================================================================
// Reference scenarios
// =============================================================================

#[tokio::test]
async fn greeting_moves_initial_conversation_to_greeting() {
    let (manager, _) = engine().await;
    let k = key("huntred", "5215512345678");

    let d = say(&manager, &k, "Hola").await;

    assert!(d.success);
    assert_eq!(d.current_state, "greeting");
    assert_eq!(d.intent.as_deref(), Some("greeting"));
    assert_eq!(
        d.response_text.as_deref(),
        Some("¡Hola! Soy el asistente de huntred.")
    );
    assert_eq!(stored(&manager, &k).await.current_state, "greeting");
}

#[tokio::test]
async fn profile_without_required_context_is_blocked() {
    let (manager, _) = engine().await;
    let k = key("huntred", "5215512345678");
    say(&manager, &k, "hola").await;

    let d = say(&manager, &k, "mi perfil").await;

    assert!(!d.success);
    assert_eq!(d.error.as_deref(), Some("required_context"));
    assert_eq!(d.current_state, "greeting");
    assert_eq!(
        d.response_text.as_deref(),
        Some("Antes de continuar necesitamos completar tu perfil.")
    );
    assert_eq!(stored(&manager, &k).await.current_state, "greeting");
}

#[tokio::test]
async fn profile_succeeds_after_context_update() {
    let (manager, _) = engine().await;
    let k = key("huntred", "5215512345678");
    say(&manager, &k, "hola").await;
    say(&manager, &k, "mi perfil").await;

    manager
        .update_context(&k, updates(&[("has_profile", json!(true))]))
        .await
        .unwrap();
    let d = say(&manager, &k, "mi perfil").await;

    assert!(d.success);
    assert_eq!(d.current_state, "profile");
    assert_eq!(d.response_text.as_deref(), Some("Este es tu perfil, candidato."));
}

#[tokio::test]
async fn unusable_business_units_answer_unrecognized_intent() {
    let (manager, store) = engine().await;
    let ghost = key("ghost", "p-1");

    for text in ["hola", "mi perfil", ""] {
        let d = say(&manager, &ghost, text).await;
        assert!(!d.success);
        assert_eq!(d.error.as_deref(), Some("unrecognized_intent"));
        assert_eq!(d.current_state, "initial");
    }
    assert!(store.is_empty().await);

    let mut catalog = FlowCatalog::default();
    catalog
        .business_units
        .push(BusinessUnitSettings::new(BusinessUnitId::new("empty").unwrap()));
    let flows = Arc::new(CatalogFlowRepository::from_catalog(&catalog).unwrap());
    let manager = FlowManager::new(
        Arc::new(InMemoryConversationStore::new()),
        flows,
        FlowPolicy::default(),
    );
    let d = say(&manager, &key("empty", "p-1"), "hola").await;
    assert_eq!(d.error.as_deref(), Some("unrecognized_intent"));
}

// =============================================================================
// Replay and concurrency
// =============================================================================

#[tokio::test]
async fn unrecognized_input_changes_nothing() {
    let (manager, _) = engine().await;
    let k = key("huntred", "p-2");
    say(&manager, &k, "hola").await;
    let before = stored(&manager, &k).await;

    let d = say(&manager, &k, "asdfgh").await;

    assert!(!d.success);
    assert_eq!(d.error.as_deref(), Some("unrecognized_intent"));
    assert_eq!(
        d.response_text.as_deref(),
        Some("No te entendí. Escribe 'opciones' para ver lo que puedo hacer.")
    );
    assert_eq!(stored(&manager, &k).await, before);
}

#[tokio::test]
async fn replaying_a_message_does_not_advance_twice() {
    let (manager, _) = engine().await;
    let k = key("huntred", "p-3");

    let first = say(&manager, &k, "hola").await;
    let after_first = stored(&manager, &k).await;
    let replay = say(&manager, &k, "hola").await;

    assert!(first.success);
    assert!(!replay.success);
    assert_eq!(replay.current_state, "greeting");
    let after_replay = stored(&manager, &k).await;
    assert_eq!(after_replay.version, after_first.version);
    assert_eq!(after_replay.current_state, "greeting");
}

#[tokio::test]
async fn concurrent_context_updates_are_not_lost() {
    let (manager, _) = engine().await;
    let k = key("amigro", "p-4");

    let tasks = (0..20).map(|i| {
        let manager = manager.clone();
        let k = k.clone();
        tokio::spawn(async move {
            manager
                .update_context(&k, updates(&[(&format!("answer_{}", i), json!(i))]))
                .await
        })
    });
    for result in join_all(tasks).await {
        result.unwrap().unwrap();
    }

    let context = manager.get_context(&k).await.unwrap();
    assert_eq!(context.len(), 20);
    assert_eq!(context.get("answer_7"), Some(&json!(7)));
    assert_eq!(stored(&manager, &k).await.version, 20);
}

#[tokio::test]
async fn concurrent_turns_are_serialized_per_conversation() {
    let (manager, _) = engine().await;
    let k = key("huntred", "p-5");

    let tasks = (0..10).map(|_| {
        let manager = manager.clone();
        let k = k.clone();
        tokio::spawn(async move { say(&manager, &k, "hola").await })
    });
    let results: Vec<ResponseDescriptor> = join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|d| d.success).count(), 1);
    let state = stored(&manager, &k).await;
    assert_eq!(state.current_state, "greeting");
    assert_eq!(state.version, 1);
    assert_eq!(state.turn_count, 1);
}

#[tokio::test]
async fn conversations_are_isolated_per_business_unit() {
    let (manager, _) = engine().await;
    let in_huntred = key("huntred", "same-person");
    let in_amigro = key("amigro", "same-person");

    say(&manager, &in_huntred, "hola").await;

    assert_eq!(stored(&manager, &in_huntred).await.current_state, "greeting");
    assert!(manager.conversation(&in_amigro).await.unwrap().is_none());
}

// =============================================================================
// Menus, resets and repair
// =============================================================================

#[tokio::test]
async fn menu_navigation_tracks_pages_and_options() {
    let (manager, _) = engine().await;
    let k = key("huntred", "p-6");
    manager
        .update_context(&k, updates(&[("has_profile", json!(true))]))
        .await
        .unwrap();
    say(&manager, &k, "hola").await;

    let menu = say(&manager, &k, "ver menu por favor").await;
    assert_eq!(menu.current_state, "main_menu");
    assert_eq!(menu.options, vec!["Vacantes", "Mi perfil", "Buscar"]);

    say(&manager, &k, "vacantes").await;
    let page = say(&manager, &k, "siguiente").await;
    assert_eq!(page.current_state, "vacancies");

    let state = stored(&manager, &k).await;
    assert_eq!(state.last_menu.as_deref(), Some("main"));
    assert_eq!(state.last_submenu.as_deref(), Some("vacancies"));
    assert_eq!(state.menu_page, 1);
}

#[tokio::test]
async fn reset_command_returns_to_initial_and_keeps_facts() {
    let (manager, _) = engine().await;
    let k = key("amigro", "p-7");
    say(&manager, &k, "hola").await;
    manager
        .update_context(&k, updates(&[("country", json!("MX"))]))
        .await
        .unwrap();

    let d = say(&manager, &k, "  Inicio ").await;

    assert!(d.success);
    assert_eq!(d.intent.as_deref(), Some("reset"));
    assert_eq!(d.current_state, "initial");
    assert_eq!(
        d.response_text.as_deref(),
        Some("Empecemos de nuevo. ¿En qué te puedo ayudar?")
    );
    let context = manager.get_context(&k).await.unwrap();
    assert_eq!(context.get("country"), Some(&json!("MX")));
    assert_eq!(context.get("last_intent"), Some(&json!("reset")));
}

#[tokio::test]
async fn comparison_and_membership_conditions_gate_transitions() {
    let (manager, _) = engine().await;
    let k = key("amigro", "p-8");
    say(&manager, &k, "hola").await;
    let menu = say(&manager, &k, "ayuda").await;
    assert_eq!(menu.options.len(), 5);

    manager
        .update_context(&k, updates(&[("age", json!(17)), ("country", json!("MX"))]))
        .await
        .unwrap();
    let blocked = say(&manager, &k, "necesito revisar mi visa").await;
    assert_eq!(blocked.error.as_deref(), Some("required_context"));
    assert_eq!(
        blocked.response_text.as_deref(),
        Some("Necesitamos tu país de origen y tu edad para continuar.")
    );

    manager
        .update_context(&k, updates(&[("age", json!(30))]))
        .await
        .unwrap();
    let d = say(&manager, &k, "necesito revisar mi visa").await;
    assert!(d.success);
    assert_eq!(d.current_state, "migration_status");
    assert_eq!(
        d.response_text.as_deref(),
        Some("Revisaremos tu estatus migratorio desde MX.")
    );
    let context = manager.get_context(&k).await.unwrap();
    assert_eq!(context.get("asked_migration_status"), Some(&json!(true)));
}

#[tokio::test]
async fn unknown_stored_state_is_repaired_before_matching() {
    let (manager, store) = engine().await;
    let k = key("huntred", "p-9");
    let mut legacy = ConversationState::new(k.clone());
    legacy.current_state = "retired_state".to_string();
    legacy.version = 1;
    store.save(&legacy).await.unwrap();

    let d = say(&manager, &k, "hola").await;

    assert!(d.success);
    assert_eq!(d.current_state, "greeting");
}

#[tokio::test]
async fn file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let k = key("huntred", "p-10");

    {
        let manager = engine_with(Arc::new(FileConversationStore::new(dir.path()))).await;
        say(&manager, &k, "hola").await;
        manager
            .update_context(&k, updates(&[("name", json!("Ana"))]))
            .await
            .unwrap();
    }

    let manager = engine_with(Arc::new(FileConversationStore::new(dir.path()))).await;
    let state = stored(&manager, &k).await;
    assert_eq!(state.current_state, "greeting");
    assert_eq!(state.context.get("name"), Some(&json!("Ana")));

    let d = say(&manager, &k, "ver menu").await;
    assert_eq!(d.current_state, "main_menu");
}
