use almond::ast::{FunctionDef, FunctionType, Invocation, Statement, Type, Value};
use almond::dialogue::{ConfirmStatus, DialogueAct, DialogueHistoryItem, DialogueState};
use almond::entity::{EntityRecord, StaticEntityLookup};
use almond::executor::{
    AppOutput, DialogueHistoryResultItem, DialogueHistoryResultList, ExecutionError, ReplayAppFactory,
    StatementExecutor,
};
use almond::policy::{
    DialoguePolicy, InteractionState, NullPolicy, PolicyKind, PolicyRegistry, TransactionPolicy, TurnContext,
    ValueCategory,
};
use almond::schema::MemorySchemaRetriever;
use almond::AgentError;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

const ARTIST: &str = "com.spotify:artist";

fn tweet(status: Value) -> Statement {
    Statement::action(
        Invocation::new("com.twitter", "post", FunctionType::Action).with_param("status", status),
    )
}

fn restaurants() -> Statement {
    Statement::query(Invocation::new("com.yelp", "restaurant", FunctionType::Query))
}

fn songs_by(artist: Value) -> Statement {
    Statement::query(
        Invocation::new("com.spotify", "songs_by_artist", FunctionType::Query).with_param("artist", artist),
    )
}

fn unresolved_artist(display: &str) -> Value {
    Value::Entity {
        value: None,
        kind: ARTIST.into(),
        display: Some(display.into()),
    }
}

fn state(act: DialogueAct, param: Option<Vec<String>>, history: Vec<DialogueHistoryItem>) -> DialogueState {
    DialogueState::new(PolicyKind::Transaction, act, param, history)
}

fn executor(apps: ReplayAppFactory) -> StatementExecutor {
    let schemas = MemorySchemaRetriever::new()
        .with(FunctionDef::new("com.yelp", "restaurant", FunctionType::Query).with_arg("name", Type::String))
        .with(FunctionDef::new("com.twitter", "post", FunctionType::Action).with_arg("status", Type::String))
        .with(
            FunctionDef::new("com.spotify", "songs_by_artist", FunctionType::Query)
                .with_arg("artist", Type::Entity(ARTIST.into()))
                .with_arg("song", Type::String),
        );
    StatementExecutor::new(Arc::new(apps), Arc::new(schemas))
}

fn ctx<'a>(state: &'a DialogueState, executor: &'a StatementExecutor) -> TurnContext<'a> {
    TurnContext {
        state,
        executor,
        entities: None,
        confident: true,
    }
}

#[tokio::test]
async fn test_null_policy_is_terminal_and_cannot_act() {
    let policy = NullPolicy;
    let current = state(DialogueAct::SysGeneric, None, vec![]);
    let executor = executor(ReplayAppFactory::new());

    assert_eq!(policy.get_interaction_state(&current), InteractionState::terminal());
    assert_eq!(policy.handle_answer(&current, &Value::Boolean(true)).await.unwrap(), None);

    let err = policy.choose_action(&ctx(&current, &executor)).await.unwrap_err();
    assert!(matches!(err, AgentError::NullPolicyAction));
}

#[tokio::test]
async fn test_confirm_accepted() {
    let current = state(
        DialogueAct::SysConfirmAction,
        None,
        vec![DialogueHistoryItem::new(tweet(Value::String("hi".into())), ConfirmStatus::Accepted)],
    );

    let next = TransactionPolicy
        .handle_answer(&current, &Value::Boolean(true))
        .await
        .unwrap()
        .expect("yes fits a confirmation");
    assert_eq!(next.dialogue_act(), DialogueAct::Execute);
    assert_eq!(next.dialogue_act_param(), None);
    assert_eq!(next.next().unwrap().confirm, ConfirmStatus::Confirmed);
}

#[tokio::test]
async fn test_confirm_rejected() {
    let current = state(
        DialogueAct::SysConfirmAction,
        None,
        vec![DialogueHistoryItem::new(tweet(Value::String("hi".into())), ConfirmStatus::Accepted)],
    );

    let next = TransactionPolicy
        .handle_answer(&current, &Value::Boolean(false))
        .await
        .unwrap()
        .expect("no fits a confirmation");
    assert_eq!(next.dialogue_act(), DialogueAct::Cancel);
    assert_eq!(next.next().unwrap().confirm, ConfirmStatus::Proposed);
}

#[tokio::test]
async fn test_answers_that_do_not_fit_are_rejected() {
    let confirming = state(
        DialogueAct::SysConfirmAction,
        None,
        vec![DialogueHistoryItem::new(tweet(Value::String("hi".into())), ConfirmStatus::Accepted)],
    );
    let answer = Value::String("maybe".into());
    assert_eq!(TransactionPolicy.handle_answer(&confirming, &answer).await.unwrap(), None);

    let displaying = state(DialogueAct::SysDisplayResult, None, vec![]);
    assert_eq!(
        TransactionPolicy
            .handle_answer(&displaying, &Value::Boolean(true))
            .await
            .unwrap(),
        None
    );
}

#[tokio::test]
async fn test_slot_fill_answer_fills_parameter() {
    let current = state(
        DialogueAct::SysSlotFill,
        Some(vec!["status".into()]),
        vec![DialogueHistoryItem::new(tweet(Value::Undefined), ConfirmStatus::Accepted)],
    );

    let next = TransactionPolicy
        .handle_answer(&current, &Value::String("good morning".into()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(next.dialogue_act(), DialogueAct::Execute);
    let filled = next.next().unwrap().stmt.last_invocation().unwrap().param("status").cloned();
    assert_eq!(filled, Some(Value::String("good morning".into())));
}

#[tokio::test]
async fn test_slot_fill_text_answer_becomes_entity_reference() {
    let current = state(
        DialogueAct::SysSlotFill,
        Some(vec!["artist".into()]),
        vec![DialogueHistoryItem::new(songs_by(unresolved_artist("zzz")), ConfirmStatus::Accepted)],
    );

    let next = TransactionPolicy
        .handle_answer(&current, &Value::String("drake".into()))
        .await
        .unwrap()
        .unwrap();
    let filled = next.next().unwrap().stmt.last_invocation().unwrap().param("artist").cloned();
    assert_eq!(filled, Some(unresolved_artist("drake")));
}

#[tokio::test]
async fn test_interaction_states() {
    let policy = TransactionPolicy;

    let confirming = state(DialogueAct::SysConfirmAction, None, vec![]);
    assert_eq!(
        policy.get_interaction_state(&confirming),
        InteractionState::expecting(Some(ValueCategory::YesNo))
    );

    let displaying = state(DialogueAct::SysDisplayResult, None, vec![]);
    assert_eq!(
        policy.get_interaction_state(&displaying).expect,
        Some(ValueCategory::Command)
    );

    for act in [
        DialogueAct::Cancel,
        DialogueAct::SysActionSuccess,
        DialogueAct::SysActionError,
        DialogueAct::SysGeneric,
    ] {
        assert!(policy.get_interaction_state(&state(act, None, vec![])).is_terminal);
    }

    let schema = FunctionDef::new("org.thermostat", "set_target", FunctionType::Action)
        .with_arg("value", Type::Measure("C".into()));
    let stmt = Statement::action(
        Invocation::new("org.thermostat", "set_target", FunctionType::Action)
            .with_param("value", Value::Undefined)
            .with_schema(schema),
    );
    let filling = state(
        DialogueAct::SysSlotFill,
        Some(vec!["value".into()]),
        vec![DialogueHistoryItem::new(stmt, ConfirmStatus::Accepted)],
    );
    assert_eq!(
        policy.get_interaction_state(&filling).expect,
        Some(ValueCategory::Measure("C".into()))
    );
}

#[tokio::test]
async fn test_confirmed_query_displays_results() {
    let apps = ReplayAppFactory::new().with(
        "com.yelp:restaurant",
        vec![
            AppOutput::result(Some("com.yelp:restaurant"), json!({ "name": "Zola" })),
            AppOutput::result(Some("com.yelp:restaurant"), json!({ "name": "Evvia" })),
        ],
    );
    let executor = executor(apps);
    let current = state(
        DialogueAct::Execute,
        None,
        vec![DialogueHistoryItem::new(restaurants(), ConfirmStatus::Confirmed)],
    );

    let next = TransactionPolicy.choose_action(&ctx(&current, &executor)).await.unwrap();
    assert_eq!(next.dialogue_act(), DialogueAct::SysDisplayResult);
    assert_eq!(next.history()[0].results.as_ref().unwrap().count, 2);
}

#[tokio::test]
async fn test_confirmed_query_without_results_is_empty_search() {
    let executor = executor(ReplayAppFactory::new().with("com.yelp:restaurant", vec![]));
    let current = state(
        DialogueAct::Execute,
        None,
        vec![DialogueHistoryItem::new(restaurants(), ConfirmStatus::Confirmed)],
    );

    let next = TransactionPolicy.choose_action(&ctx(&current, &executor)).await.unwrap();
    assert_eq!(next.dialogue_act(), DialogueAct::SysEmptySearch);
}

#[tokio::test]
async fn test_confirmed_action_reports_success_or_error() {
    let ok = executor(ReplayAppFactory::new().with("com.twitter:post", vec![]));
    let failing = executor(ReplayAppFactory::new().with(
        "com.twitter:post",
        vec![AppOutput::Error(ExecutionError::new(Some("rate_limited"), "slow down"))],
    ));
    let current = state(
        DialogueAct::Execute,
        None,
        vec![DialogueHistoryItem::new(tweet(Value::String("hi".into())), ConfirmStatus::Confirmed)],
    );

    let next = TransactionPolicy.choose_action(&ctx(&current, &ok)).await.unwrap();
    assert_eq!(next.dialogue_act(), DialogueAct::SysActionSuccess);

    let next = TransactionPolicy.choose_action(&ctx(&current, &failing)).await.unwrap();
    assert_eq!(next.dialogue_act(), DialogueAct::SysActionError);
    assert_eq!(
        next.history()[0].results.as_ref().unwrap().error,
        Some(Value::Enum("rate_limited".into()))
    );
}

#[tokio::test]
async fn test_accepted_action_asks_for_confirmation() {
    let executor = executor(ReplayAppFactory::new().with("com.twitter:post", vec![]));
    let current = state(
        DialogueAct::Execute,
        None,
        vec![DialogueHistoryItem::new(tweet(Value::String("hi".into())), ConfirmStatus::Accepted)],
    );

    let next = TransactionPolicy.choose_action(&ctx(&current, &executor)).await.unwrap();
    assert_eq!(next.dialogue_act(), DialogueAct::SysConfirmAction);
    assert!(next.history()[0].results.is_none());
}

#[tokio::test]
async fn test_missing_parameter_asks_for_it() {
    let executor = executor(ReplayAppFactory::new());
    let current = state(
        DialogueAct::Execute,
        None,
        vec![DialogueHistoryItem::new(tweet(Value::Undefined), ConfirmStatus::Accepted)],
    );

    let next = TransactionPolicy.choose_action(&ctx(&current, &executor)).await.unwrap();
    assert_eq!(next.dialogue_act(), DialogueAct::SysSlotFill);
    assert_eq!(next.dialogue_act_param(), Some(&["status".to_string()][..]));
}

#[tokio::test]
async fn test_cancel_executes_nothing() {
    let executor = executor(ReplayAppFactory::new().with("com.twitter:post", vec![]));
    let current = state(
        DialogueAct::Cancel,
        None,
        vec![DialogueHistoryItem::new(tweet(Value::String("hi".into())), ConfirmStatus::Proposed)],
    );

    let next = TransactionPolicy.choose_action(&ctx(&current, &executor)).await.unwrap();
    assert_eq!(next.dialogue_act(), DialogueAct::Cancel);
    assert!(next.history()[0].results.is_none());
}

#[tokio::test]
async fn test_nothing_to_do_is_generic() {
    let executor = executor(ReplayAppFactory::new());
    let current = state(DialogueAct::Execute, None, vec![]);

    let next = TransactionPolicy.choose_action(&ctx(&current, &executor)).await.unwrap();
    assert_eq!(next.dialogue_act(), DialogueAct::SysGeneric);
}

#[tokio::test]
async fn test_unresolved_entity_is_looked_up_then_executed() {
    let apps = ReplayAppFactory::new().with(
        "com.spotify:songs_by_artist",
        vec![AppOutput::result(Some("com.spotify:songs_by_artist"), json!({ "song": "Pink Moon" }))],
    );
    let executor = executor(apps);
    let lookup = StaticEntityLookup::new()
        .with(EntityRecord::new(ARTIST, "drakeo", "Drakeo the Ruler"))
        .with(EntityRecord::new(ARTIST, "nick-drake", "Nick Drake"));
    let current = state(
        DialogueAct::Execute,
        None,
        vec![DialogueHistoryItem::new(songs_by(unresolved_artist("drake")), ConfirmStatus::Accepted)],
    );

    let turn = TurnContext {
        state: &current,
        executor: &executor,
        entities: Some(&lookup),
        confident: true,
    };
    let next = TransactionPolicy.choose_action(&turn).await.unwrap();

    assert_eq!(next.dialogue_act(), DialogueAct::SysDisplayResult);
    let artist = next.history()[0].stmt.last_invocation().unwrap().param("artist").cloned();
    assert_eq!(
        artist,
        Some(Value::Entity {
            value: Some("nick-drake".into()),
            kind: ARTIST.into(),
            display: Some("Nick Drake".into()),
        })
    );
}

#[tokio::test]
async fn test_user_casing_does_not_affect_resolution() {
    let executor = executor(ReplayAppFactory::new().with("com.spotify:songs_by_artist", vec![]));
    // "que" and "queen" sit at the same distance from "QUEEN"
    let lookup = StaticEntityLookup::new()
        .with(EntityRecord::new(ARTIST, "que", "Que"))
        .with(EntityRecord::new(ARTIST, "queen", "Queen"));
    let current = state(
        DialogueAct::Execute,
        None,
        vec![DialogueHistoryItem::new(songs_by(unresolved_artist("QUEEN")), ConfirmStatus::Accepted)],
    );
    let turn = TurnContext {
        state: &current,
        executor: &executor,
        entities: Some(&lookup),
        confident: true,
    };

    let next = TransactionPolicy.choose_action(&turn).await.unwrap();
    let artist = next.history()[0].stmt.last_invocation().unwrap().param("artist").cloned();
    assert!(matches!(artist, Some(Value::Entity { value: Some(id), .. }) if id == "queen"));
}

#[tokio::test]
async fn test_entities_already_shown_are_preferred() {
    let apps = ReplayAppFactory::new().with("com.spotify:songs_by_artist", vec![]);
    let executor = executor(apps);
    let lookup = StaticEntityLookup::new().with(EntityRecord::new(ARTIST, "from-lookup", "Drake"));

    let mut row = BTreeMap::new();
    row.insert(
        "artist".to_string(),
        Value::Entity {
            value: Some("from-results".into()),
            kind: ARTIST.into(),
            display: Some("Drake".into()),
        },
    );
    let mut shown = DialogueHistoryItem::new(restaurants(), ConfirmStatus::Confirmed);
    shown.results = Some(DialogueHistoryResultList::new(
        vec![DialogueHistoryResultItem::new(row)],
        false,
        None,
    ));

    let current = state(
        DialogueAct::Execute,
        None,
        vec![
            shown,
            DialogueHistoryItem::new(songs_by(unresolved_artist("drake")), ConfirmStatus::Accepted),
        ],
    );
    let turn = TurnContext {
        state: &current,
        executor: &executor,
        entities: Some(&lookup),
        confident: true,
    };
    let next = TransactionPolicy.choose_action(&turn).await.unwrap();

    let artist = next.history()[1].stmt.last_invocation().unwrap().param("artist").cloned();
    assert!(matches!(artist, Some(Value::Entity { value: Some(id), .. }) if id == "from-results"));
}

#[tokio::test]
async fn test_low_confidence_resolution_still_confirms() {
    let executor = executor(ReplayAppFactory::new().with("com.spotify:songs_by_artist", vec![]));
    let lookup = StaticEntityLookup::new().with(EntityRecord::new(ARTIST, "nick-drake", "Nick Drake"));
    let current = state(
        DialogueAct::Execute,
        None,
        vec![DialogueHistoryItem::new(songs_by(unresolved_artist("drake")), ConfirmStatus::Accepted)],
    );
    let turn = TurnContext {
        state: &current,
        executor: &executor,
        entities: Some(&lookup),
        confident: false,
    };

    let next = TransactionPolicy.choose_action(&turn).await.unwrap();
    assert_eq!(next.dialogue_act(), DialogueAct::SysConfirmAction);
}

#[test]
fn test_policy_names() {
    assert_eq!(
        "org.thingpedia.dialogue.transaction".parse::<PolicyKind>().unwrap(),
        PolicyKind::Transaction
    );
    assert_eq!(PolicyKind::Null.name(), "org.thingpedia.dialogue.null");
    assert!(matches!(
        "org.thingpedia.dialogue.chitchat".parse::<PolicyKind>(),
        Err(AgentError::UnknownPolicy(_))
    ));

    let mut registry = PolicyRegistry::new();
    assert_eq!(registry.get(PolicyKind::Null).kind(), PolicyKind::Null);
    assert_eq!(registry.get(PolicyKind::Transaction).kind(), PolicyKind::Transaction);
}
