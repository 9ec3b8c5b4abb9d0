mod common;

use std::sync::{Arc, Mutex};

use common::{CollectorSink, MockTransport};
use roomcall::audio::{ChunkerConfig, DeniedCapture, ScriptedCapture};
use roomcall::call::{CallRole, CallSession, SessionNotice, SessionState, TransportEvent};
use roomcall::signaling::SignalingEnvelope;

fn initiator(
    transport: MockTransport,
    sink: Arc<CollectorSink>,
) -> CallSession {
    CallSession::new(
        CallRole::Initiator,
        "room-7".to_string(),
        "alice".to_string(),
        None,
        1,
        Box::new(transport),
        Box::new(ScriptedCapture::new(8)),
        ChunkerConfig::default(),
        sink,
    )
}

fn responder(
    transport: MockTransport,
    sink: Arc<CollectorSink>,
) -> CallSession {
    CallSession::new(
        CallRole::Responder,
        "room-7".to_string(),
        "bob".to_string(),
        None,
        1,
        Box::new(transport),
        Box::new(ScriptedCapture::new(8)),
        ChunkerConfig::default(),
        sink,
    )
}

#[tokio::test]
async fn test_initiator_happy_path() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = CollectorSink::new();
    let mut session = initiator(MockTransport::new(Arc::clone(&log)), Arc::clone(&sink));

    session.start().await.unwrap();
    assert_eq!(session.state(), SessionState::Negotiating);
    assert_eq!(
        sink.sent_envelopes(),
        vec![SignalingEnvelope::Offer {
            sdp: "sdp-offer".to_string()
        }]
    );

    let notice = session
        .handle_envelope(
            "bob",
            SignalingEnvelope::Answer {
                sdp: "sdp-b".to_string(),
            },
        )
        .await;
    assert_eq!(notice, None);
    assert_eq!(session.remote_participant(), Some("bob"));

    let notice = session.handle_transport_event(TransportEvent::Connected).await;
    assert_eq!(notice, Some(SessionNotice::Connected));
    assert_eq!(session.state(), SessionState::Connected);
}

#[tokio::test]
async fn test_candidates_apply_in_receipt_order_across_the_race() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = CollectorSink::new();
    let mut session = initiator(MockTransport::new(Arc::clone(&log)), sink);

    session.start().await.unwrap();

    // Two candidates outrun the answer: they must queue, not error
    for c in ["x", "y"] {
        session
            .handle_envelope(
                "bob",
                SignalingEnvelope::Candidate {
                    candidate: c.to_string(),
                },
            )
            .await;
    }
    assert_eq!(session.pending_candidates(), 2);

    session
        .handle_envelope(
            "bob",
            SignalingEnvelope::Answer {
                sdp: "sdp-b".to_string(),
            },
        )
        .await;
    assert_eq!(session.pending_candidates(), 0);

    // A late candidate applies immediately
    session
        .handle_envelope(
            "bob",
            SignalingEnvelope::Candidate {
                candidate: "z".to_string(),
            },
        )
        .await;

    let log = log.lock().unwrap();
    let applied: Vec<&String> = log.iter().filter(|e| e.starts_with("candidate:")).collect();
    assert_eq!(applied, ["candidate:x", "candidate:y", "candidate:z"]);
}

#[tokio::test]
async fn test_responder_accept_offer_answers_and_drains_queue() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = CollectorSink::new();
    let mut session = responder(MockTransport::new(Arc::clone(&log)), Arc::clone(&sink));

    session.accept_offer("alice", "sdp-a").await.unwrap();

    assert_eq!(session.state(), SessionState::Negotiating);
    assert_eq!(session.remote_participant(), Some("alice"));
    assert_eq!(
        sink.sent_envelopes(),
        vec![SignalingEnvelope::Answer {
            sdp: "sdp-answer".to_string()
        }]
    );

    let log = log.lock().unwrap();
    assert_eq!(*log, vec!["remote:sdp-a", "create_answer"]);
}

#[tokio::test]
async fn test_remote_hangup_closes_without_echo() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = CollectorSink::new();
    let mut session = initiator(MockTransport::new(log), Arc::clone(&sink));

    session.start().await.unwrap();
    session.handle_transport_event(TransportEvent::Connected).await;

    let notice = session.handle_envelope("bob", SignalingEnvelope::Hangup).await;
    assert_eq!(notice, Some(SessionNotice::RemoteEnded));
    assert_eq!(session.state(), SessionState::Closed);

    // Only one side's intent propagates: the offer is the only thing we sent
    let envelopes = sink.sent_envelopes();
    assert_eq!(envelopes.len(), 1);
    assert!(matches!(envelopes[0], SignalingEnvelope::Offer { .. }));

    // Terminal session is inert and never re-notifies
    let notice = session.handle_envelope("bob", SignalingEnvelope::Hangup).await;
    assert_eq!(notice, None);
}

#[tokio::test]
async fn test_terminal_session_ignores_envelopes() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = CollectorSink::new();
    let mut session = initiator(MockTransport::new(log), sink);

    session.start().await.unwrap();
    session.hang_up().await;
    assert_eq!(session.state(), SessionState::Closed);

    session
        .handle_envelope(
            "bob",
            SignalingEnvelope::Answer {
                sdp: "late".to_string(),
            },
        )
        .await;
    session
        .handle_envelope(
            "bob",
            SignalingEnvelope::Candidate {
                candidate: "late".to_string(),
            },
        )
        .await;
    session.handle_transport_event(TransportEvent::Connected).await;

    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(session.pending_candidates(), 0);
}

#[tokio::test]
async fn test_local_hangup_emits_single_hangup() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = CollectorSink::new();
    let mut session = initiator(MockTransport::new(log), Arc::clone(&sink));

    session.start().await.unwrap();
    session.hang_up().await;
    // A second hangup on a closed session is a no-op
    session.hang_up().await;

    let hangups = sink
        .sent_envelopes()
        .into_iter()
        .filter(|e| matches!(e, SignalingEnvelope::Hangup))
        .count();
    assert_eq!(hangups, 1);
}

#[tokio::test]
async fn test_capture_denial_aborts_before_any_envelope() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = CollectorSink::new();

    let mut session = CallSession::new(
        CallRole::Initiator,
        "room-7".to_string(),
        "alice".to_string(),
        None,
        1,
        Box::new(MockTransport::new(log)),
        Box::new(DeniedCapture),
        ChunkerConfig::default(),
        Arc::clone(&sink) as Arc<dyn roomcall::signaling::SignalSink>,
    );

    let err = session.start().await.unwrap_err();
    assert!(matches!(err, roomcall::CallError::Capture(_)));
    assert_ne!(session.state(), SessionState::Negotiating);
    assert!(sink.sent_envelopes().is_empty());
}

#[tokio::test]
async fn test_connectivity_failure_allows_one_restart() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = CollectorSink::new();
    let mut session = initiator(MockTransport::with_restart(Arc::clone(&log)), sink);

    session.start().await.unwrap();

    // First failure: restart is attempted and the session keeps negotiating
    let notice = session.handle_transport_event(TransportEvent::Failed).await;
    assert_eq!(notice, None);
    assert_eq!(session.state(), SessionState::Negotiating);
    assert!(log.lock().unwrap().contains(&"restart".to_string()));

    // Second failure is terminal, with exactly one notification
    let notice = session.handle_transport_event(TransportEvent::Failed).await;
    assert!(matches!(notice, Some(SessionNotice::Failed(_))));
    assert_eq!(session.state(), SessionState::Failed);

    let notice = session.handle_transport_event(TransportEvent::Failed).await;
    assert_eq!(notice, None);
}

#[tokio::test]
async fn test_unsupported_restart_fails_immediately() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = CollectorSink::new();
    let mut session = initiator(MockTransport::new(log), sink);

    session.start().await.unwrap();

    let notice = session.handle_transport_event(TransportEvent::Failed).await;
    assert!(matches!(notice, Some(SessionNotice::Failed(_))));
    assert_eq!(session.state(), SessionState::Failed);
}

#[tokio::test]
async fn test_out_of_sequence_answer_is_ignored() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = CollectorSink::new();
    let mut session = responder(MockTransport::new(Arc::clone(&log)), sink);

    session.accept_offer("alice", "sdp-a").await.unwrap();

    // A responder never expects an answer; the session must not crash or
    // transition
    let notice = session
        .handle_envelope(
            "alice",
            SignalingEnvelope::Answer {
                sdp: "bogus".to_string(),
            },
        )
        .await;
    assert_eq!(notice, None);
    assert_eq!(session.state(), SessionState::Negotiating);
}
