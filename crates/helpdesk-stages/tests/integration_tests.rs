//! End-to-end ticket runs through the standard pipeline.
//!
//! The scoring oracle is pinned in every test so the branch taken is known.

use helpdesk_core::providers::{ATLAS, COMMON};
use helpdesk_core::{
    CapabilityError, ClarificationInbox, Decision, EngineConfig, FixedAnswer, HelpdeskError,
    Priority, RetryPolicy, StageError, TicketFields,
};
use helpdesk_mcp::{sample_scenarios, ProviderRegistry};
use helpdesk_stages::{TicketDesk, STAGE_NAMES};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn john_doe() -> TicketFields {
    TicketFields {
        customer_name: "John Doe".to_string(),
        email: "john.doe@example.com".to_string(),
        query: "My order hasn't arrived yet and it's been over 10 days. I need urgent help!"
            .to_string(),
        priority: "high".to_string(),
        ticket_id: "TKT-2024-1001".to_string(),
    }
}

fn desk(registry: ProviderRegistry) -> TicketDesk {
    desk_with(registry, EngineConfig::default())
}

fn desk_with(registry: ProviderRegistry, config: EngineConfig) -> TicketDesk {
    TicketDesk::new(Arc::new(registry), Arc::new(FixedAnswer::reference()), config)
}

// =============================================================================
// Reference scenarios
// =============================================================================

#[tokio::test]
async fn test_high_score_auto_resolves_with_twelve_calls() {
    let summary = desk(ProviderRegistry::reference().with_score(95))
        .submit_ticket(john_doe())
        .await
        .unwrap();

    assert_eq!(summary.decision, Decision::AutoResolve);
    assert_eq!(summary.solution_score, 95);
    assert_eq!(summary.mcp_calls_made, 12);
    assert_eq!(summary.ticket_id, "TKT-2024-1001");
    assert_eq!(summary.customer, "John Doe");
    assert_eq!(summary.priority, Priority::High);
    assert_eq!(summary.status, "processing_complete");
    assert_eq!(
        summary.response["message"],
        serde_json::json!("We're addressing your concern")
    );
}

#[tokio::test]
async fn test_low_score_escalates_with_thirteen_calls() {
    let summary = desk(ProviderRegistry::reference().with_score(50))
        .submit_ticket(john_doe())
        .await
        .unwrap();

    assert_eq!(summary.decision, Decision::Escalated);
    assert_eq!(summary.solution_score, 50);
    assert_eq!(summary.mcp_calls_made, 13);
}

#[tokio::test]
async fn test_missing_parser_fails_in_understand() {
    let registry = ProviderRegistry::reference()
        .with_score(95)
        .without(COMMON, "parse_request_text");

    let err = desk(registry).submit_ticket(john_doe()).await.unwrap_err();

    match err {
        HelpdeskError::StageFailure { stage, cause } => {
            assert_eq!(stage, "Understand");
            assert!(matches!(
                cause,
                StageError::Capability(CapabilityError::NotFound { ref ability, .. })
                    if ability == "parse_request_text"
            ));
        }
        other => panic!("expected StageFailure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_summary_wire_format() {
    let summary = desk(ProviderRegistry::reference().with_score(50))
        .submit_ticket(john_doe())
        .await
        .unwrap();
    let wire = serde_json::to_value(&summary).unwrap();

    assert_eq!(wire["decision"], "escalated");
    assert_eq!(wire["priority"], "high");
    assert_eq!(wire["mcp_calls_made"], 13);
    assert_eq!(wire["status"], "processing_complete");
}

// =============================================================================
// Decision gate
// =============================================================================

#[tokio::test]
async fn test_threshold_boundaries_end_to_end() {
    for (score, expected, calls) in [
        (89, Decision::Escalated, 13),
        (90, Decision::AutoResolve, 12),
        (91, Decision::AutoResolve, 12),
    ] {
        let summary = desk(ProviderRegistry::reference().with_score(score))
            .submit_ticket(john_doe())
            .await
            .unwrap();
        assert_eq!(summary.decision, expected, "score {}", score);
        assert_eq!(summary.mcp_calls_made, calls, "score {}", score);
    }
}

#[tokio::test]
async fn test_configured_threshold_end_to_end() {
    let config = EngineConfig::default().with_threshold(40);
    let summary = desk_with(ProviderRegistry::reference().with_score(50), config)
        .submit_ticket(john_doe())
        .await
        .unwrap();
    assert_eq!(summary.decision, Decision::AutoResolve);
    assert_eq!(summary.mcp_calls_made, 12);
}

#[tokio::test]
async fn test_random_oracle_still_yields_one_decision() {
    let desk = desk(ProviderRegistry::reference());
    for _ in 0..20 {
        let summary = desk.submit_ticket(john_doe()).await.unwrap();
        match summary.decision {
            Decision::AutoResolve => {
                assert!(summary.solution_score >= 90);
                assert_eq!(summary.mcp_calls_made, 12);
            }
            Decision::Escalated => {
                assert!(summary.solution_score < 90);
                assert_eq!(summary.mcp_calls_made, 13);
            }
        }
    }
}

// =============================================================================
// Call log and traces
// =============================================================================

#[tokio::test]
async fn test_call_log_matches_path_taken() {
    let run = desk(ProviderRegistry::reference().with_score(50))
        .run_ticket(john_doe(), CancellationToken::new())
        .await
        .unwrap();

    let log = run.ticket.call_log();
    assert_eq!(log.len(), 13);
    assert!(log.iter().enumerate().all(|(i, c)| c.seq == i && c.is_ok()));

    let per_stage = |stage: &str| log.iter().filter(|c| c.stage == stage).count();
    assert_eq!(per_stage("Understand"), 2);
    assert_eq!(per_stage("Prepare"), 3);
    assert_eq!(per_stage("Ask"), 1);
    assert_eq!(per_stage("Wait"), 1);
    assert_eq!(per_stage("Retrieve"), 1);
    assert_eq!(per_stage("Decide"), 2);
    assert_eq!(per_stage("Update"), 1);
    assert_eq!(per_stage("Create"), 1);
    assert_eq!(per_stage("Do"), 2);

    let update = log.iter().find(|c| c.stage == "Update").unwrap();
    assert_eq!(update.ability, "update_ticket");

    // stages are sequential, so one stage's entries never interleave with another's
    let stages: Vec<_> = log.iter().map(|c| c.stage.as_str()).collect();
    let mut deduped = stages.clone();
    deduped.dedup();
    assert_eq!(deduped, &STAGE_NAMES[1..10]);
}

#[tokio::test]
async fn test_traces_cover_every_stage() {
    let run = desk(ProviderRegistry::reference().with_score(95))
        .run_ticket(john_doe(), CancellationToken::new())
        .await
        .unwrap();

    let names: Vec<_> = run.traces.iter().map(|t| t.stage.as_str()).collect();
    assert_eq!(names, STAGE_NAMES.to_vec());
    assert_eq!(run.traces.iter().map(|t| t.calls).sum::<usize>(), 12);

    let intake = &run.traces[0];
    assert_eq!(intake.in_hash, intake.out_hash);
    let decide = run.traces.iter().find(|t| t.stage == "Decide").unwrap();
    assert_ne!(decide.in_hash, decide.out_hash);
    assert!(!decide.deterministic);

    let update = run.ticket.call_log().iter().find(|c| c.stage == "Update").unwrap();
    assert_eq!(update.ability, "close_ticket");
}

#[tokio::test]
async fn test_final_context_fields() {
    let run = desk(ProviderRegistry::reference().with_score(95))
        .run_ticket(john_doe(), CancellationToken::new())
        .await
        .unwrap();
    let t = &run.ticket;

    let entities = t.extracted_entities().unwrap();
    for key in ["parsed", "entities", "normalized", "enriched", "flags"] {
        assert!(entities.contains_key(key), "missing {}", key);
    }
    assert_eq!(t.clarification_question(), Some("Please provide order number"));
    assert!(t.clarification_answer().unwrap().contains("purchase_date"));
    assert_eq!(t.kb_data().unwrap()["article"], "DEL-442");
    assert_eq!(t.solution_score(), Some(95));
    assert_eq!(t.decision(), Some(Decision::AutoResolve));
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_invalid_ticket_never_reaches_engine() {
    let mut fields = john_doe();
    fields.priority = "critical".to_string();

    let err = desk(ProviderRegistry::reference()).submit_ticket(fields).await.unwrap_err();
    assert!(matches!(err, HelpdeskError::InvalidTicket { field: "priority", .. }));
    assert!(err.stage().is_none());
}

#[tokio::test]
async fn test_failure_after_gate_has_no_summary() {
    let registry = ProviderRegistry::reference()
        .with_score(95)
        .without(ATLAS, "close_ticket");

    let err = desk(registry).submit_ticket(john_doe()).await.unwrap_err();
    assert_eq!(err.stage(), Some("Update"));
}

#[tokio::test(start_paused = true)]
async fn test_transient_outage_recovers_within_retry_budget() {
    use async_trait::async_trait;
    use helpdesk_core::{CapabilityClient, Payload};
    use serde_json::Value;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Drops the first knowledge base search.
    struct FlakyKb {
        inner: ProviderRegistry,
        kb_calls: AtomicU32,
    }

    #[async_trait]
    impl CapabilityClient for FlakyKb {
        async fn invoke(&self, provider: &str, ability: &str, input: &Value) -> Result<Payload, CapabilityError> {
            if ability == "knowledge_base_search" && self.kb_calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(CapabilityError::Unavailable {
                    provider: provider.to_string(),
                    reason: "index warming".to_string(),
                });
            }
            self.inner.invoke(provider, ability, input).await
        }
    }

    let client = FlakyKb {
        inner: ProviderRegistry::reference().with_score(95),
        kb_calls: AtomicU32::new(0),
    };
    let desk = TicketDesk::new(
        Arc::new(client),
        Arc::new(FixedAnswer::reference()),
        EngineConfig::default(),
    );

    let run = desk.run_ticket(john_doe(), CancellationToken::new()).await.unwrap();
    assert_eq!(run.summary.mcp_calls_made, 12);
    let kb = run.ticket.call_log().iter().find(|c| c.stage == "Retrieve").unwrap();
    assert_eq!(kb.attempts, 2);
}

#[tokio::test(start_paused = true)]
async fn test_persistent_outage_becomes_stage_failure() {
    let outage = CapabilityError::Unavailable {
        provider: ATLAS.to_string(),
        reason: "down".to_string(),
    };
    let registry = ProviderRegistry::reference()
        .with_score(95)
        .failing(ATLAS, "knowledge_base_search", outage);
    let config = EngineConfig::default().with_retry(RetryPolicy {
        max_retries: 3,
        ..RetryPolicy::default()
    });

    let err = desk_with(registry, config).submit_ticket(john_doe()).await.unwrap_err();
    match err {
        HelpdeskError::StageFailure { stage, cause } => {
            assert_eq!(stage, "Retrieve");
            assert!(matches!(cause, StageError::Capability(CapabilityError::Unavailable { .. })));
        }
        other => panic!("unexpected {:?}", other),
    }
}

// =============================================================================
// Human clarification
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_unanswered_clarification_fails_run() {
    let config = EngineConfig::default().with_clarification_timeout(Duration::from_secs(60));
    let desk = TicketDesk::new(
        Arc::new(ProviderRegistry::reference().with_score(95)),
        Arc::new(ClarificationInbox::new()),
        config,
    );

    let err = desk.submit_ticket(john_doe()).await.unwrap_err();
    match err {
        HelpdeskError::StageFailure { stage, cause } => {
            assert_eq!(stage, "Ask");
            assert!(matches!(cause, StageError::ClarificationTimeout { waited_ms: 60_000 }));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_inbox_answer_resumes_run() {
    let inbox = Arc::new(ClarificationInbox::new());
    let desk = Arc::new(TicketDesk::new(
        Arc::new(ProviderRegistry::reference().with_score(50)),
        inbox.clone(),
        EngineConfig::default(),
    ));

    let run = {
        let desk = desk.clone();
        tokio::spawn(async move { desk.run_ticket(john_doe(), CancellationToken::new()).await })
    };

    while !inbox.is_waiting("TKT-2024-1001") {
        tokio::task::yield_now().await;
    }
    assert_eq!(inbox.pending()[0].1, "Please provide order number");
    inbox.answer("TKT-2024-1001", "order 98765, bought 2024-02-01").unwrap();

    let run = run.await.unwrap().unwrap();
    assert_eq!(run.ticket.clarification_answer(), Some("order 98765, bought 2024-02-01"));
    assert_eq!(run.summary.decision, Decision::Escalated);
    assert_eq!(run.summary.mcp_calls_made, 13);
}

#[tokio::test]
async fn test_cancel_while_waiting_for_human() {
    let inbox = Arc::new(ClarificationInbox::new());
    let desk = Arc::new(TicketDesk::new(
        Arc::new(ProviderRegistry::reference().with_score(95)),
        inbox.clone(),
        EngineConfig::default(),
    ));
    let cancel = CancellationToken::new();

    let run = {
        let desk = desk.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { desk.submit_with_cancel(john_doe(), cancel).await })
    };

    while !inbox.is_waiting("TKT-2024-1001") {
        tokio::task::yield_now().await;
    }
    cancel.cancel();

    let err = run.await.unwrap().unwrap_err();
    assert!(matches!(err, HelpdeskError::Cancelled { ref stage } if stage == "Ask"));
    assert!(!inbox.is_waiting("TKT-2024-1001"));
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_runs_are_independent() {
    let desk = Arc::new(desk(
        ProviderRegistry::reference()
            .with_score(50)
            .with_latency(Duration::from_millis(5)),
    ));

    let handles: Vec<_> = sample_scenarios()
        .into_iter()
        .map(|scenario| {
            let desk = desk.clone();
            tokio::spawn(async move { desk.submit_ticket(scenario.fields).await })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        let summary = handle.await.unwrap().unwrap();
        assert_eq!(summary.mcp_calls_made, 13);
        ids.push(summary.ticket_id);
    }
    ids.sort();
    assert_eq!(ids, vec!["TKT-2024-1001", "TKT-2024-1002", "TKT-2024-1003"]);
}
