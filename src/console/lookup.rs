//! Search-as-you-type username suggestions
//!
//! Keystrokes only schedule a lookup; the request is issued once the input
//! has been quiet for the debounce interval. Responses to superseded
//! requests are dropped.

use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    pub seq: u64,
    pub fragment: String,
}

#[derive(Debug, Clone)]
pub struct UsernameLookup {
    debounce: Duration,
    fragment: String,
    due: Option<Instant>,
    last_issued: u64,
    suggestions: Vec<String>,
}

impl UsernameLookup {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            fragment: String::new(),
            due: None,
            last_issued: 0,
            suggestions: Vec::new(),
        }
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    /// When the pending lookup becomes due, if any
    pub fn next_due(&self) -> Option<Instant> {
        self.due
    }

    /// Record the current input value
    pub fn input(&mut self, fragment: &str, now: Instant) {
        self.fragment = fragment.trim().to_string();
        if self.fragment.is_empty() {
            self.due = None;
            self.suggestions.clear();
            // anything still in flight is now stale
            self.last_issued += 1;
        } else {
            self.due = Some(now + self.debounce);
        }
    }

    /// Issue the pending lookup once its quiet period has elapsed
    pub fn poll(&mut self, now: Instant) -> Option<LookupRequest> {
        match self.due {
            Some(due) if due <= now => {
                self.due = None;
                self.last_issued += 1;
                debug!("Issuing username lookup #{} for '{}'", self.last_issued, self.fragment);
                Some(LookupRequest {
                    seq: self.last_issued,
                    fragment: self.fragment.clone(),
                })
            }
            _ => None,
        }
    }

    pub fn settled(&mut self, seq: u64, result: Result<Vec<String>, String>) {
        if seq != self.last_issued {
            debug!("Discarding stale username lookup #{}", seq);
            return;
        }
        match result {
            Ok(names) => self.suggestions = names,
            Err(message) => {
                warn!("Username lookup failed: {}", message);
                self.suggestions.clear();
            }
        }
    }

    /// Whether there is input, a pending request or suggestions to forget
    pub fn is_active(&self) -> bool {
        !self.fragment.is_empty() || self.due.is_some() || !self.suggestions.is_empty()
    }

    /// Forget input and suggestions, e.g. when the dialog closes
    pub fn reset(&mut self) {
        self.fragment.clear();
        self.due = None;
        self.suggestions.clear();
        self.last_issued += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keystrokes_are_debounced() {
        let start = Instant::now();
        let mut lookup = UsernameLookup::new(Duration::from_millis(200));

        lookup.input("a", start);
        lookup.input("al", start + Duration::from_millis(50));
        lookup.input("ali", start + Duration::from_millis(100));
        assert!(lookup.poll(start + Duration::from_millis(250)).is_none());

        let req = lookup.poll(start + Duration::from_millis(300)).unwrap();
        assert_eq!(req.fragment, "ali");
        assert!(lookup.poll(start + Duration::from_millis(400)).is_none());
    }

    #[test]
    fn test_stale_suggestions_dropped() {
        let start = Instant::now();
        let mut lookup = UsernameLookup::new(Duration::ZERO);

        lookup.input("a", start);
        let first = lookup.poll(start).unwrap();
        lookup.input("al", start);
        let second = lookup.poll(start).unwrap();

        lookup.settled(second.seq, Ok(vec!["alice".into()]));
        lookup.settled(first.seq, Ok(vec!["adam".into(), "alice".into()]));
        assert_eq!(lookup.suggestions(), ["alice".to_string()]);
    }

    #[test]
    fn test_empty_input_clears_without_request() {
        let start = Instant::now();
        let mut lookup = UsernameLookup::new(Duration::ZERO);
        lookup.input("bo", start);
        let req = lookup.poll(start).unwrap();

        lookup.input("  ", start);
        assert!(lookup.poll(start).is_none());
        lookup.settled(req.seq, Ok(vec!["bob".into()]));
        assert!(lookup.suggestions().is_empty());
    }
}
