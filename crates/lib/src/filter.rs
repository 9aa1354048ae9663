//! Narrow a message sequence by source, participant and date range.

use chrono::NaiveDate;

use crate::normalize::Message;

/// All criteria are optional; an empty filter keeps everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageFilter {
    pub source: Option<String>,
    /// Keep this participant's rows (plus replies from the responder, see [`MessageFilter::apply`]).
    pub participant: Option<String>,
    /// Inclusive first day.
    pub from: Option<NaiveDate>,
    /// Inclusive last day.
    pub to: Option<NaiveDate>,
}

impl MessageFilter {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Keep matching messages, preserving order. When a responder is given, its
    /// outbound rows survive the participant criterion so replies stay pairable.
    pub fn apply(&self, messages: &[Message], responder: Option<&str>) -> Vec<Message> {
        messages
            .iter()
            .filter(|m| self.matches(m, responder))
            .cloned()
            .collect()
    }

    fn matches(&self, m: &Message, responder: Option<&str>) -> bool {
        if let Some(ref s) = self.source {
            if &m.source != s {
                return false;
            }
        }
        if let Some(ref p) = self.participant {
            let responder_reply = m.is_outbound() && responder == Some(m.participant.as_str());
            if &m.participant != p && !responder_reply {
                return false;
            }
        }
        let day = m.timestamp.date();
        if self.from.is_some_and(|from| day < from) {
            return false;
        }
        if self.to.is_some_and(|to| day > to) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Direction;

    fn msg(who: &str, direction: Direction, day: u32, source: &str) -> Message {
        Message {
            id: format!("{}-{}", who, day),
            participant: who.to_string(),
            direction,
            timestamp: NaiveDate::from_ymd_opt(2024, 2, day)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            text: String::new(),
            source: source.to_string(),
        }
    }

    fn sample() -> Vec<Message> {
        vec![
            msg("A", Direction::Inbound, 1, "s1"),
            msg("bot", Direction::Outbound, 1, "s1"),
            msg("B", Direction::Inbound, 2, "s2"),
            msg("A", Direction::Outbound, 3, "s2"),
        ]
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let f = MessageFilter::default();
        assert!(f.is_empty());
        assert_eq!(f.apply(&sample(), None).len(), 4);
    }

    #[test]
    fn participant_filter_keeps_responder_replies() {
        let f = MessageFilter {
            participant: Some("A".to_string()),
            ..Default::default()
        };
        let ids: Vec<String> = f.apply(&sample(), Some("bot")).into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["A-1", "bot-1", "A-3"]);
        assert_eq!(f.apply(&sample(), None).len(), 2);
    }

    #[test]
    fn date_range_is_inclusive() {
        let f = MessageFilter {
            from: NaiveDate::from_ymd_opt(2024, 2, 2),
            to: NaiveDate::from_ymd_opt(2024, 2, 3),
            ..Default::default()
        };
        let ids: Vec<String> = f.apply(&sample(), None).into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["B-2", "A-3"]);
    }

    #[test]
    fn source_filter() {
        let f = MessageFilter {
            source: Some("s2".to_string()),
            ..Default::default()
        };
        assert_eq!(f.apply(&sample(), None).len(), 2);
    }
}
