//! Connection parameter negotiation policy.
//!
//! After a central connects, the peripheral waits `first_update_delay`,
//! then checks the parameters the central chose against our preferred
//! ones. If they don't match it asks for an update, up to
//! `max_update_attempts` times spaced `next_update_delay` apart, and
//! finally either drops the link or accepts what it got.
//!
//! This module only decides; `ble::negotiation` owns the timers and the
//! SoftDevice calls.

use crate::ble::identity::ConnParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NegotiationConfig {
    pub first_update_delay_ms: u64,
    pub next_update_delay_ms: u64,
    pub max_update_attempts: u8,
    pub disconnect_on_failure: bool,
}

/// What to do after looking at the current connection parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NegotiationStep {
    /// Current parameters are fine; negotiation is over.
    Accept,
    /// Ask the central for the preferred parameters, then wait
    /// `next_update_delay_ms` and evaluate again.
    Request(ConnParams),
    /// Attempts exhausted; drop the link.
    Disconnect,
    /// Attempts exhausted; keep the link as it is.
    GiveUp,
}

/// Per-connection negotiation state.
#[derive(Debug, Clone)]
pub struct Negotiator {
    config: NegotiationConfig,
    preferred: ConnParams,
    attempts: u8,
}

impl Negotiator {
    pub fn new(config: NegotiationConfig, preferred: ConnParams) -> Self {
        Self {
            config,
            preferred,
            attempts: 0,
        }
    }

    pub fn first_update_delay_ms(&self) -> u64 {
        self.config.first_update_delay_ms
    }

    pub fn next_update_delay_ms(&self) -> u64 {
        self.config.next_update_delay_ms
    }

    /// Update requests sent so far.
    pub fn attempts(&self) -> u8 {
        self.attempts
    }

    pub fn evaluate(&mut self, current: &ConnParams) -> NegotiationStep {
        if self.preferred.accepts(current) {
            return NegotiationStep::Accept;
        }

        if self.attempts < self.config.max_update_attempts {
            self.attempts += 1;
            return NegotiationStep::Request(self.preferred);
        }

        if self.config.disconnect_on_failure {
            NegotiationStep::Disconnect
        } else {
            NegotiationStep::GiveUp
        }
    }
}
