use super::ChatErrorKind;

/// Lifecycle of a single outbound turn.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    Sending,
    Retrying { attempt: u32 },
    Delivered,
    FailedTerminal,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    Ignored,
    Throttled { wait_secs: u64 },
    Delivered,
    Failed(ChatErrorKind),
}
