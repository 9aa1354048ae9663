//! Conversation pairer: match inbound messages with the responder's reply.
//!
//! Pairs are emitted regardless of elapsed time; implausible pairs are
//! discarded later by [`crate::stats::PlausibilityFilter`].

use chrono::Duration;
use serde::Serialize;
use std::collections::HashMap;

use crate::normalize::Message;

/// How inbound messages are matched with replies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PairingStrategy {
    /// `messages[i]` inbound and `messages[i + 1]` a responder reply. No memory across rows.
    #[default]
    Adjacent,
    /// Each participant keeps one pending inbound (the latest); a responder reply settles it.
    /// Pending entries older than `timeout` when the reply arrives are abandoned.
    Session { timeout: Option<Duration> },
}

/// An inbound message and the reply matched to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponsePair {
    pub inbound: Message,
    pub outbound: Message,
}

impl ResponsePair {
    /// Wall-clock seconds from inbound to reply.
    pub fn raw_seconds(&self) -> f64 {
        crate::workhours::elapsed_raw_seconds(self.inbound.timestamp, self.outbound.timestamp)
    }
}

/// True when `m` is an outbound message from the responder.
/// With no responder configured every outbound message qualifies.
fn is_reply(m: &Message, responder: Option<&str>) -> bool {
    m.is_outbound() && responder.map_or(true, |r| m.participant == r)
}

/// Pair inbound messages with replies. `messages` must be in chronological order.
pub fn pair_responses(
    messages: &[Message],
    responder: Option<&str>,
    strategy: PairingStrategy,
) -> Vec<ResponsePair> {
    let pairs = match strategy {
        PairingStrategy::Adjacent => pair_adjacent(messages, responder),
        PairingStrategy::Session { timeout } => pair_sessions(messages, responder, timeout),
    };
    log::debug!("paired {} response(s) with {:?}", pairs.len(), strategy);
    pairs
}

fn pair_adjacent(messages: &[Message], responder: Option<&str>) -> Vec<ResponsePair> {
    messages
        .windows(2)
        .filter(|w| w[0].is_inbound() && is_reply(&w[1], responder))
        .map(|w| ResponsePair {
            inbound: w[0].clone(),
            outbound: w[1].clone(),
        })
        .collect()
}

fn pair_sessions(
    messages: &[Message],
    responder: Option<&str>,
    timeout: Option<Duration>,
) -> Vec<ResponsePair> {
    // participant -> (arrival order, pending inbound)
    let mut pending: HashMap<&str, (usize, &Message)> = HashMap::new();
    let mut pairs = Vec::new();

    for (seq, m) in messages.iter().enumerate() {
        if m.is_inbound() {
            pending.insert(m.participant.as_str(), (seq, m));
            continue;
        }
        if !is_reply(m, responder) {
            continue;
        }
        if let Some(limit) = timeout {
            pending.retain(|_, (_, inbound)| m.timestamp - inbound.timestamp <= limit);
        }
        // Reply rows naming the counterpart settle that counterpart; otherwise the latest pending.
        let key = if pending.contains_key(m.participant.as_str()) {
            Some(m.participant.as_str())
        } else {
            pending
                .iter()
                .max_by_key(|(_, (order, _))| *order)
                .map(|(k, _)| *k)
        };
        if let Some((_, inbound)) = key.and_then(|k| pending.remove(k)) {
            pairs.push(ResponsePair {
                inbound: inbound.clone(),
                outbound: m.clone(),
            });
        }
    }
    pairs
}
