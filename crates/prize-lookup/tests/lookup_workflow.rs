use prize_lookup::workflows::lookup::{
    GatewayError, Identifier, LookupGateway, LookupResult, LookupService, LookupWorkflow,
    PrizeAmount, ProfileGenerator, RejectionReason, SimulatedGateway, ValidationError,
    WorkflowError, WorkflowEvent, WorkflowHandle, WorkflowSettings, WorkflowState,
    STATUS_MESSAGES,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

const LATENCY: Duration = Duration::from_millis(3000);
const STATUS_INTERVAL: Duration = Duration::from_millis(800);

fn settings() -> WorkflowSettings {
    WorkflowSettings {
        status_interval: STATUS_INTERVAL,
    }
}

fn simulated() -> SimulatedGateway {
    SimulatedGateway::new(LATENCY, ProfileGenerator::standard())
}

fn session() -> WorkflowHandle {
    LookupWorkflow::spawn(Arc::new(simulated()), settings())
}

async fn events_until_settled(
    events: &mut broadcast::Receiver<WorkflowEvent>,
) -> Vec<WorkflowEvent> {
    let mut seen = Vec::new();
    loop {
        let event = events.recv().await.expect("workflow still running");
        let settled =
            matches!(&event, WorkflowEvent::StateChanged { state } if state.is_terminal());
        seen.push(event);
        if settled {
            return seen;
        }
    }
}

fn state_labels(events: &[WorkflowEvent]) -> Vec<&'static str> {
    events
        .iter()
        .filter_map(|event| match event {
            WorkflowEvent::StateChanged { state } => Some(state.label()),
            _ => None,
        })
        .collect()
}

async fn wait_for_simulating(events: &mut broadcast::Receiver<WorkflowEvent>) {
    loop {
        if let WorkflowEvent::StateChanged {
            state: WorkflowState::Simulating { .. },
        } = events.recv().await.expect("workflow running")
        {
            return;
        }
    }
}

fn drain(events: &mut broadcast::Receiver<WorkflowEvent>) -> Vec<WorkflowEvent> {
    let mut rest = Vec::new();
    while let Ok(event) = events.try_recv() {
        rest.push(event);
    }
    rest
}

#[tokio::test(start_paused = true)]
async fn prize_scenario_resolves_with_formula_values() {
    let handle = session();
    let mut events = handle.subscribe();

    handle.submit("123.456.789-09").await.expect("submit accepted");
    let seen = events_until_settled(&mut events).await;

    assert_eq!(
        state_labels(&seen),
        [
            "awaiting_validation",
            "validating",
            "simulating",
            "resolved"
        ]
    );

    let WorkflowState::Resolved(result) = handle.state() else {
        panic!("expected resolved state, got {:?}", handle.state());
    };
    let digit_sum: u64 = "12345678909"
        .bytes()
        .map(|byte| u64::from(byte - b'0'))
        .sum();
    let prize = result.prize.expect("last digit 9 carries a prize");
    assert_eq!(
        prize.amount,
        PrizeAmount::from_reais(500 + (digit_sum * 47) % 4500)
    );
    assert_eq!(prize.protocol_code, format!("TSN-2025-{:06}", digit_sum * 123));
    assert_eq!(result.profile.formatted_identifier, "123.456.789-09");
}

#[tokio::test(start_paused = true)]
async fn no_prize_scenario_resolves_without_record() {
    let handle = session();
    let state = handle.lookup("100.000.009-57").await.expect("lookup runs");

    match state {
        WorkflowState::Resolved(result) => {
            assert!(result.prize.is_none());
            assert_eq!(result.profile.full_name, "Fernando Rocha");
        }
        other => panic!("expected resolved state, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn repeated_digits_are_rejected() {
    let handle = session();
    let state = handle.lookup("11111111111").await.expect("lookup runs");
    assert_eq!(
        state,
        WorkflowState::Rejected(RejectionReason::Invalid(
            ValidationError::AllDigitsIdentical
        ))
    );
}

#[tokio::test(start_paused = true)]
async fn short_input_is_rejected_without_simulating() {
    let handle = session();
    let mut events = handle.subscribe();

    handle.submit("123.456.789-0").await.expect("submit accepted");
    let seen = events_until_settled(&mut events).await;

    assert_eq!(
        state_labels(&seen),
        ["awaiting_validation", "validating", "rejected"]
    );
    assert_eq!(
        handle.state(),
        WorkflowState::Rejected(RejectionReason::Invalid(ValidationError::WrongLength))
    );
    assert!(!seen
        .iter()
        .any(|event| matches!(event, WorkflowEvent::StatusMessage { .. })));
}

#[tokio::test(start_paused = true)]
async fn submission_during_simulation_is_ignored() {
    let handle = session();
    let mut events = handle.subscribe();

    handle.submit("123.456.789-09").await.expect("first submit");
    handle.submit("100.000.009-57").await.expect("second submit");

    let seen = events_until_settled(&mut events).await;
    assert!(seen
        .iter()
        .any(|event| matches!(event, WorkflowEvent::SubmissionIgnored { state: "simulating" })));

    tokio::time::sleep(LATENCY * 3).await;
    let later = drain(&mut events);
    assert!(
        state_labels(&later).is_empty(),
        "ignored submission must not start a second run: {later:?}"
    );

    match handle.state() {
        WorkflowState::Resolved(result) => {
            assert_eq!(result.profile.formatted_identifier, "123.456.789-09")
        }
        other => panic!("expected first lookup to resolve, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn status_rotation_stops_when_simulation_ends() {
    let handle = session();
    let mut events = handle.subscribe();

    handle.submit("123.456.789-09").await.expect("submit accepted");
    let seen = events_until_settled(&mut events).await;

    let messages: Vec<&str> = seen
        .iter()
        .filter_map(|event| match event {
            WorkflowEvent::StatusMessage { message } => Some(message.as_str()),
            _ => None,
        })
        .collect();
    // Shown on entry, then rotated at 800, 1600 and 2400 ms before the 3000 ms reply.
    assert_eq!(messages, STATUS_MESSAGES);

    tokio::time::sleep(STATUS_INTERVAL * 5).await;
    assert!(drain(&mut events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancel_aborts_simulation_and_returns_to_idle() {
    let handle = session();
    let mut events = handle.subscribe();

    handle.submit("123.456.789-09").await.expect("submit accepted");
    wait_for_simulating(&mut events).await;

    handle.cancel().await.expect("cancel delivered");
    loop {
        match events.recv().await.expect("workflow running") {
            WorkflowEvent::StateChanged { state } => {
                assert_eq!(state, WorkflowState::Idle);
                break;
            }
            _ => continue,
        }
    }

    tokio::time::sleep(LATENCY * 2).await;
    assert!(drain(&mut events).is_empty());
    assert_eq!(handle.state(), WorkflowState::Idle);

    let state = handle.lookup("100.000.009-57").await.expect("lookup runs");
    assert!(matches!(state, WorkflowState::Resolved(_)));
}

#[tokio::test(start_paused = true)]
async fn dismiss_clears_the_result() {
    let handle = session();
    handle.lookup("123.456.789-09").await.expect("lookup runs");

    let mut events = handle.subscribe();
    handle.dismiss().await.expect("dismiss delivered");
    match events.recv().await.expect("workflow running") {
        WorkflowEvent::StateChanged { state } => assert_eq!(state, WorkflowState::Idle),
        other => panic!("expected state change, got {other:?}"),
    }

    handle.dismiss().await.expect("dismiss delivered");
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(drain(&mut events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn rejected_session_accepts_resubmission() {
    let handle = session();
    let first = handle.lookup("123.456.789-08").await.expect("lookup runs");
    assert_eq!(
        first,
        WorkflowState::Rejected(RejectionReason::Invalid(
            ValidationError::SecondCheckDigitMismatch
        ))
    );

    let second = handle.lookup("123.456.789-09").await.expect("lookup runs");
    assert!(matches!(second, WorkflowState::Resolved(_)));
}

struct FlakyGateway {
    failures_left: AtomicUsize,
    inner: SimulatedGateway,
}

impl LookupGateway for FlakyGateway {
    async fn consult(&self, identifier: Identifier) -> Result<LookupResult, GatewayError> {
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(GatewayError::Unavailable("registry offline".to_string()));
        }
        self.inner.consult(identifier).await
    }
}

#[tokio::test(start_paused = true)]
async fn backend_failure_is_transient_and_retryable() {
    let gateway = FlakyGateway {
        failures_left: AtomicUsize::new(1),
        inner: simulated(),
    };
    let handle = LookupWorkflow::spawn(Arc::new(gateway), settings());

    let first = handle.lookup("123.456.789-09").await.expect("lookup runs");
    assert_eq!(
        first,
        WorkflowState::Rejected(RejectionReason::TransientFailure)
    );

    let retry = handle.lookup("123.456.789-09").await.expect("lookup runs");
    assert!(matches!(retry, WorkflowState::Resolved(_)));
}

struct PanickingGateway;

impl LookupGateway for PanickingGateway {
    async fn consult(&self, _identifier: Identifier) -> Result<LookupResult, GatewayError> {
        panic!("profile generation fault");
    }
}

#[tokio::test(start_paused = true)]
async fn generation_fault_degrades_to_transient_failure() {
    let handle = LookupWorkflow::spawn(Arc::new(PanickingGateway), settings());
    let state = handle.lookup("123.456.789-09").await.expect("lookup runs");
    assert_eq!(
        state,
        WorkflowState::Rejected(RejectionReason::TransientFailure)
    );

    let again = handle.lookup("1").await.expect("session still usable");
    assert_eq!(
        again,
        WorkflowState::Rejected(RejectionReason::Invalid(ValidationError::WrongLength))
    );
}

#[tokio::test(start_paused = true)]
async fn sessions_from_one_service_run_independently() {
    let service = LookupService::new(Arc::new(simulated()), settings());
    let first = service.session();
    let second = service.session();

    let (a, b) = tokio::join!(
        first.lookup("123.456.789-09"),
        second.lookup("100.000.009-57")
    );

    assert!(matches!(a.expect("first runs"), WorkflowState::Resolved(r) if r.has_prize()));
    assert!(matches!(b.expect("second runs"), WorkflowState::Resolved(r) if !r.has_prize()));
}

#[tokio::test(start_paused = true)]
async fn wait_until_settled_returns_current_terminal_state() {
    let handle = session();
    handle.submit("123.456.789-09").await.expect("submit accepted");
    let settled = handle.wait_until_settled().await.expect("settles");
    assert!(matches!(settled, WorkflowState::Resolved(_)));
    assert_eq!(handle.wait_until_settled().await.expect("settled"), settled);
}

#[tokio::test(start_paused = true)]
async fn cancel_from_another_handle_ends_a_pending_lookup() {
    let handle = session();
    let controller = handle.clone();
    let mut events = controller.subscribe();

    let pending = tokio::spawn(async move { handle.lookup("123.456.789-09").await });
    wait_for_simulating(&mut events).await;
    controller.cancel().await.expect("cancel delivered");

    let outcome = tokio::time::timeout(LATENCY * 2, pending)
        .await
        .expect("lookup returns after cancel")
        .expect("lookup task completes");
    assert_eq!(outcome, Err(WorkflowError::Cancelled));
    assert_eq!(controller.state(), WorkflowState::Idle);
}

#[tokio::test(start_paused = true)]
async fn lookup_on_a_busy_session_does_not_borrow_another_result() {
    let first = session();
    let second = first.clone();
    let mut events = first.subscribe();

    first.submit("123.456.789-09").await.expect("submit accepted");
    wait_for_simulating(&mut events).await;

    let outcome = second.lookup("100.000.009-57").await;
    assert_eq!(outcome, Err(WorkflowError::Busy));

    match first.wait_until_settled().await.expect("settles") {
        WorkflowState::Resolved(result) => {
            assert_eq!(result.profile.formatted_identifier, "123.456.789-09")
        }
        other => panic!("expected first lookup to resolve, got {other:?}"),
    }

    let retry = second.lookup("100.000.009-57").await.expect("lookup runs");
    match retry {
        WorkflowState::Resolved(result) => {
            assert_eq!(result.profile.formatted_identifier, "100.000.009-57")
        }
        other => panic!("expected second lookup to resolve, got {other:?}"),
    }
}
