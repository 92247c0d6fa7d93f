// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use crate::llm::provider::{CompletionOutcome, FailureReason, GENERIC_FAILURE_REPLY};

/// Map a reqwest failure that happened before a response was read.
pub(crate) fn transport_failure(err: &reqwest::Error) -> CompletionOutcome {
    let reason = if err.is_timeout() {
        FailureReason::Timeout
    } else {
        FailureReason::Transport(err.to_string())
    };
    CompletionOutcome::failed(GENERIC_FAILURE_REPLY, reason)
}
