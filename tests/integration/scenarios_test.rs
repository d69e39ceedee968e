//! Worked end-to-end scenarios

use std::sync::Arc;

use assert_matches::assert_matches;
use phasebot::commands::START_PHASE;
use phasebot::state::PhaseState;
use phasebot::{
    CommandDefinition, CommandRegistry, InboundMessage, OutboundMessage, PhaseBotError,
    PhaseDefinition, Routing, Scope, StepOutcome,
};

use crate::helpers::*;

fn collect_command(counters: Arc<PhaseCounters>, scope: Scope) -> CommandDefinition {
    CommandDefinition::builder("/x")
        .help("Collect a number")
        .scope(scope)
        .phase(
            START_PHASE,
            PhaseDefinition::new(ProbePhase::new(counters.clone())).next("collect"),
        )
        .phase(
            "collect",
            PhaseDefinition::new(ProbePhase::new(counters).accept(numeric))
                .start_message(OutboundMessage::text("Send me a number"))
                .error_message(OutboundMessage::text("Numbers only, please")),
        )
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_start_replies_with_header_only() {
    let mut registry = CommandRegistry::new();
    registry.register(collect_command(Arc::default(), Scope::All));
    let (engine, messenger) = engine_with(registry);

    let routed = engine.handle_message(InboundMessage::private(7, "/start")).await.unwrap();

    assert_eq!(routed, Routing::Help);
    let sent = messenger.deliveries();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].chat_id, 7);
    assert_eq!(messenger.texts(), vec![help_header()]);
    assert!(engine.store().snapshot(7).is_none());
}

#[tokio::test]
async fn test_help_without_commands_lists_nothing() {
    let (engine, messenger) = engine_with(CommandRegistry::new());

    let routed = engine.handle_message(InboundMessage::private(7, "/help")).await.unwrap();

    assert_eq!(routed, Routing::Help);
    assert_eq!(messenger.texts(), vec![format!("{}\n\n", help_header())]);
}

#[tokio::test]
async fn test_help_lists_public_commands_in_order() {
    let mut registry = CommandRegistry::new();
    registry.register(collect_command(Arc::default(), Scope::All));
    registry.register(
        CommandDefinition::builder("/reset")
            .help("Wipe everything")
            .admin()
            .phase(START_PHASE, PhaseDefinition::new(EndingPhase))
            .build()
            .unwrap(),
    );
    registry.register(
        CommandDefinition::builder("/about")
            .help("Who am I")
            .phase(START_PHASE, PhaseDefinition::new(EndingPhase))
            .build()
            .unwrap(),
    );
    let (engine, messenger) = engine_with(registry);

    engine.handle_message(InboundMessage::group(7, -100, "/help")).await.unwrap();

    let sent = messenger.deliveries();
    assert_eq!(sent[0].chat_id, 7);
    assert_eq!(
        messenger.texts(),
        vec![format!("{}\n\n/x - Collect a number\n/about - Who am I", help_header())]
    );
}

#[tokio::test]
async fn test_collect_flow_runs_to_the_end() {
    let counters = Arc::new(PhaseCounters::default());
    let mut registry = CommandRegistry::new();
    registry.register(collect_command(counters.clone(), Scope::Private));
    let (engine, messenger) = engine_with(registry);

    let routed = engine.handle_message(InboundMessage::private(7, "/x")).await.unwrap();
    assert_eq!(routed, Routing::Command(StepOutcome::Initialized));
    assert_eq!(counters.init(), 1);
    assert_eq!(counters.handled(), 0);
    assert_eq!(engine.store().snapshot(7).unwrap().phase, PhaseState::Active(START_PHASE.into()));

    let routed = engine.handle_message(InboundMessage::private(7, "ready")).await.unwrap();
    assert_eq!(routed, Routing::Continued(StepOutcome::Advanced { to: "collect".into() }));
    assert_eq!(messenger.texts(), vec!["Send me a number".to_string()]);
    assert_eq!(engine.store().snapshot(7).unwrap().phase, PhaseState::Active("collect".into()));

    let routed = engine.handle_message(InboundMessage::private(7, "42")).await.unwrap();
    assert_eq!(routed, Routing::Continued(StepOutcome::Ended));

    let summary = engine.store().snapshot(7).unwrap();
    assert_eq!(summary.phase, PhaseState::Ended);
    assert!(summary.variables.is_empty());
    assert_eq!(messenger.count(), 1);
    assert_eq!(counters.init(), 1);
}

#[tokio::test]
async fn test_rejected_input_reprompts_and_stays() {
    let counters = Arc::new(PhaseCounters::default());
    let mut registry = CommandRegistry::new();
    registry.register(collect_command(counters.clone(), Scope::Private));
    let (engine, messenger) = engine_with(registry);

    engine.handle_message(InboundMessage::private(7, "/x")).await.unwrap();
    engine.handle_message(InboundMessage::private(7, "ready")).await.unwrap();
    messenger.clear();

    let routed = engine.handle_message(InboundMessage::private(7, "lots")).await.unwrap();

    assert_eq!(routed, Routing::Continued(StepOutcome::Rejected));
    assert_eq!(messenger.texts(), vec!["Numbers only, please".to_string()]);
    let summary = engine.store().snapshot(7).unwrap();
    assert_eq!(summary.phase, PhaseState::Active("collect".into()));
    assert_eq!(summary.variables.get("last"), Some(&serde_json::json!("ready")));
}

#[tokio::test]
async fn test_private_command_from_group_is_refused() {
    let counters = Arc::new(PhaseCounters::default());
    let mut registry = CommandRegistry::new();
    registry.register(collect_command(counters.clone(), Scope::Private));
    let (engine, messenger) = engine_with(registry);

    let result = engine.handle_message(InboundMessage::group(7, -100, "/x")).await;

    assert_matches!(result, Err(PhaseBotError::ScopeViolation { command }) if command == "/x");
    assert!(engine.store().snapshot(7).is_none());
    assert_eq!(counters.init(), 0);
    assert_eq!(messenger.count(), 0);
}
