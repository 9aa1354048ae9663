//! Headline counts over a message sequence.

use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::normalize::Message;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Overview {
    pub total: usize,
    pub inbound: usize,
    pub outbound: usize,
    pub unique_participants: usize,
    /// Message count per source label.
    pub per_source: BTreeMap<String, usize>,
    /// Message count per minute of activity, keyed by the minute's start.
    pub per_minute: BTreeMap<NaiveDateTime, usize>,
}

impl Overview {
    pub fn of(messages: &[Message]) -> Self {
        let mut participants = HashSet::new();
        let mut o = Overview {
            total: messages.len(),
            ..Default::default()
        };
        for m in messages {
            if m.is_inbound() {
                o.inbound += 1;
            } else {
                o.outbound += 1;
            }
            participants.insert(m.participant.as_str());
            *o.per_source.entry(m.source.clone()).or_default() += 1;
            *o.per_minute.entry(minute_of(m.timestamp)).or_default() += 1;
        }
        o.unique_participants = participants.len();
        o
    }
}

fn minute_of(t: NaiveDateTime) -> NaiveDateTime {
    t.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(t)
}
