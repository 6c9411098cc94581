//! Payment verification flow state machine
//!
//! The flow is modelled as a pure transition function `step(state, event) ->
//! (state, effects)`. The driver task in `application::services::flow` owns
//! every timer and interprets effects; this module never performs I/O or
//! reads a clock, so every transition is unit-testable in isolation.
//!
//! Lifecycle: `idle -> generating_qr -> awaiting_payment -> {verifying ->
//! (awaiting_payment | success | expired | error)}`. Terminal states absorb
//! all further events; a poll callback that fires after success is a no-op.

use serde::Serialize;

/// Outcome of one payment-status poll, decoded from the provider's
/// `responseCode`: 0 = paid, 1 = not yet found, anything else = hard failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Paid,
    NotFound,
    Declined(i64),
    TransportError,
}

impl PollOutcome {
    pub fn from_response_code(code: i64) -> Self {
        match code {
            0 => PollOutcome::Paid,
            1 => PollOutcome::NotFound,
            other => PollOutcome::Declined(other),
        }
    }
}

/// Flow states
#[derive(Debug, Clone, PartialEq)]
pub enum FlowState {
    Idle,
    GeneratingQr,
    AwaitingPayment { attempts: u32 },
    Verifying { attempts: u32 },
    Success,
    Expired,
    Failed { message: String },
}

impl FlowState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FlowState::Success | FlowState::Expired | FlowState::Failed { .. }
        )
    }

    /// Externally visible status label
    pub fn status(&self) -> FlowStatus {
        match self {
            FlowState::Idle => FlowStatus::Pending,
            FlowState::GeneratingQr => FlowStatus::Pending,
            FlowState::AwaitingPayment { .. } => FlowStatus::AwaitingPayment,
            FlowState::Verifying { .. } => FlowStatus::Verifying,
            FlowState::Success => FlowStatus::Success,
            FlowState::Expired => FlowStatus::Expired,
            FlowState::Failed { .. } => FlowStatus::Error,
        }
    }
}

/// Status label reported to API clients
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FlowStatus {
    Pending,
    AwaitingPayment,
    Verifying,
    Success,
    Expired,
    Error,
}

/// Events fed to the state machine by the driver
#[derive(Debug, Clone, PartialEq)]
pub enum FlowEvent {
    Start,
    QrReady,
    QrFailed(String),
    PollDue,
    PollSettled(PollOutcome),
    ConfirmSettled(PollOutcome),
    VerificationTimeout,
    QrExpired,
}

/// Effects the driver must interpret after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    GenerateQr,
    ScheduleFirstPoll,
    ScheduleNextPoll,
    Poll,
    ConfirmPoll,
    Notify,
    CancelTimers,
}

pub const VERIFICATION_TIMEOUT_MESSAGE: &str =
    "Payment verification timeout. Please try again or contact support if payment was made.";
pub const VERIFICATION_FAILED_MESSAGE: &str =
    "Payment verification failed. Please try again or contact support.";
pub const QR_EXPIRED_MESSAGE: &str = "QR code has expired. Please try again.";

/// Pure transition function.
///
/// `max_attempts` bounds the verification poll sequence; the wall-clock
/// timeouts arrive as events from the driver. Unknown state/event pairs are
/// absorbed without effects, which is what makes late timer callbacks safe.
pub fn step(state: FlowState, event: FlowEvent, max_attempts: u32) -> (FlowState, Vec<Effect>) {
    if state.is_terminal() {
        // One exception: the confirmatory poll settles after success and
        // gates the notification.
        if let (FlowState::Success, FlowEvent::ConfirmSettled(outcome)) = (&state, &event) {
            let effects = if *outcome == PollOutcome::Paid {
                vec![Effect::Notify]
            } else {
                vec![]
            };
            return (state, effects);
        }
        return (state, vec![]);
    }

    match (state, event) {
        (FlowState::Idle, FlowEvent::Start) => (FlowState::GeneratingQr, vec![Effect::GenerateQr]),

        (FlowState::GeneratingQr, FlowEvent::QrReady) => (
            FlowState::AwaitingPayment { attempts: 0 },
            vec![Effect::ScheduleFirstPoll],
        ),
        (FlowState::GeneratingQr, FlowEvent::QrFailed(message)) => {
            (FlowState::Failed { message }, vec![Effect::CancelTimers])
        }

        (FlowState::AwaitingPayment { attempts }, FlowEvent::PollDue) => {
            if attempts >= max_attempts {
                (
                    FlowState::Failed {
                        message: VERIFICATION_TIMEOUT_MESSAGE.to_string(),
                    },
                    vec![Effect::CancelTimers],
                )
            } else {
                (
                    FlowState::Verifying {
                        attempts: attempts + 1,
                    },
                    vec![Effect::Poll],
                )
            }
        }

        (FlowState::Verifying { .. }, FlowEvent::PollSettled(PollOutcome::Paid)) => (
            FlowState::Success,
            vec![Effect::CancelTimers, Effect::ConfirmPoll],
        ),
        (FlowState::Verifying { attempts }, FlowEvent::PollSettled(PollOutcome::NotFound)) => (
            FlowState::AwaitingPayment { attempts },
            vec![Effect::ScheduleNextPoll],
        ),
        (FlowState::Verifying { .. }, FlowEvent::PollSettled(_)) => (
            FlowState::Failed {
                message: VERIFICATION_FAILED_MESSAGE.to_string(),
            },
            vec![Effect::CancelTimers],
        ),

        (_, FlowEvent::VerificationTimeout) => (
            FlowState::Failed {
                message: VERIFICATION_TIMEOUT_MESSAGE.to_string(),
            },
            vec![Effect::CancelTimers],
        ),
        (_, FlowEvent::QrExpired) => (FlowState::Expired, vec![Effect::CancelTimers]),

        // Stray events carry no meaning in the current state
        (state, _) => (state, vec![]),
    }
}
