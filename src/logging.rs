// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Tracing setup for binaries embedding the chat session

use tracing_subscriber::EnvFilter;

/// Build the filter used by [`init_tracing`].
///
/// Defaults to `warn`; any verbosity raises this crate's targets to `debug`.
/// `RUST_LOG` directives still apply.
pub fn env_filter(verbose: u8) -> EnvFilter {
    let mut filter = EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into());

    if verbose > 0 {
        if let Ok(directive) = "persona_chat=debug".parse() {
            filter = filter.add_directive(directive);
        }
    }

    filter
}

/// Install a global fmt subscriber. Returns false if one was already set.
pub fn init_tracing(verbose: u8) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .try_init()
        .is_ok()
}
