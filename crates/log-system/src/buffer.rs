// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Size-bounded queue of records waiting to be flushed.
//!
//! Admission runs against the estimated footprint of the buffer seen as a
//! sequence (see [`crate::size`]):
//!
//! ```text
//!   record > limit            -> dropped, buffer untouched
//!   record + buffer > limit   -> buffer handed back for flushing, then record admitted
//!   otherwise                 -> appended
//! ```
//!
//! The check leaves out the index key the new record takes once appended, so
//! the running size can end up a few bytes over the limit (a 218-byte record
//! under a 218-byte limit occupies 220). The limit is a budget for admission
//! decisions, not a hard cap on the running size.
//!
//! The buffer itself never talks to the collector. An overflow returns the evicted
//! contents as [`Admission::Overflowed`] and the owner flushes them and resets the
//! flush timer.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::record::LogRecord;
use crate::size;

/// Outcome of [`LogBuffer::try_admit`].
#[derive(Debug, PartialEq, Eq)]
pub enum Admission {
    /// Record appended.
    Appended,
    /// Record admitted into an emptied buffer. Carries the previous contents,
    /// which must be flushed.
    Overflowed(Vec<LogRecord>),
    /// Record larger than the whole buffer; dropped.
    Rejected,
}

impl Admission {
    #[must_use]
    pub fn is_admitted(&self) -> bool {
        !matches!(self, Admission::Rejected)
    }
}

#[derive(Debug, Clone)]
pub struct LogBuffer {
    /// Insertion order is temporal order.
    records: VecDeque<LogRecord>,
    /// Estimated size of `records` as a sequence, index keys included.
    size: usize,
    limit: usize,
}

impl LogBuffer {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        LogBuffer {
            records: VecDeque::new(),
            size: 0,
            limit,
        }
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Applies a new limit to future admissions. Records already buffered stay.
    pub(crate) fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Estimated size of the buffered sequence.
    #[must_use]
    pub fn estimated_size(&self) -> usize {
        self.size
    }

    pub fn records(&self) -> impl Iterator<Item = &LogRecord> {
        self.records.iter()
    }

    pub fn try_admit(&mut self, record: LogRecord) -> Admission {
        let record_size = record.estimated_size();

        if record_size > self.limit {
            warn!(
                "Log record of {} bytes exceeds buffer limit of {} bytes, dropping it",
                record_size, self.limit
            );
            return Admission::Rejected;
        }

        if record_size.saturating_add(self.size) > self.limit {
            debug!(
                "Log buffer overflow ({} + {} > {}), flushing {} records",
                self.size,
                record_size,
                self.limit,
                self.records.len()
            );
            let evicted = self.take();
            self.push(record, record_size);
            return Admission::Overflowed(evicted);
        }

        self.push(record, record_size);
        Admission::Appended
    }

    /// Takes the buffered records, leaving the buffer empty.
    ///
    /// Returns `None` when there is nothing to flush.
    pub fn drain(&mut self) -> Option<Vec<LogRecord>> {
        if self.records.is_empty() {
            return None;
        }
        Some(self.take())
    }

    fn push(&mut self, record: LogRecord, record_size: usize) {
        self.size += size::index_key_size(self.records.len()) + record_size;
        self.records.push_back(record);
    }

    fn take(&mut self) -> Vec<LogRecord> {
        self.size = 0;
        std::mem::take(&mut self.records).into()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::level::LogLevel;
    use proptest::prelude::*;

    /// Record of estimated size 218 on its own, 220 as the first buffer element.
    fn record(message: &str) -> LogRecord {
        LogRecord {
            timestamp: 1_700_000_000_000,
            instance_guid: "1".to_string(),
            component_name: "testPlugin".to_string(),
            level: LogLevel::Fatal,
            message: message.to_string(),
            caller: String::new(),
            username: None,
            app_id: "dtcd".to_string(),
        }
    }

    const MESSAGE: &str = "test record test record test";

    #[test]
    fn test_append_under_limit() {
        let mut buffer = LogBuffer::new(15_000);

        assert_eq!(buffer.try_admit(record(MESSAGE)), Admission::Appended);
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.estimated_size(), 220);

        assert_eq!(buffer.try_admit(record(MESSAGE)), Admission::Appended);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.estimated_size(), 440);
    }

    #[test]
    fn test_running_size_matches_estimate_of_sequence() {
        let mut buffer = LogBuffer::new(100_000);
        for i in 0..12 {
            buffer.try_admit(record(&format!("message {i}")));
        }
        let as_value = serde_json::to_value(buffer.records().collect::<Vec<_>>()).unwrap();
        assert_eq!(buffer.estimated_size(), size::estimate_size(&as_value));
    }

    #[test]
    fn test_overflow_returns_previous_contents() {
        let mut buffer = LogBuffer::new(300);
        let first = record(MESSAGE);

        assert!(buffer.try_admit(first.clone()).is_admitted());
        assert_eq!(buffer.estimated_size(), 220);

        let second = record("another test record test rec");
        let admission = buffer.try_admit(second.clone());

        assert_eq!(admission, Admission::Overflowed(vec![first]));
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.records().next(), Some(&second));
        assert_eq!(buffer.estimated_size(), 220);
    }

    #[test]
    fn test_oversized_record_is_rejected() {
        let mut buffer = LogBuffer::new(150);

        assert_eq!(buffer.try_admit(record(MESSAGE)), Admission::Rejected);
        assert!(buffer.is_empty());
        assert_eq!(buffer.estimated_size(), 0);
    }

    #[test]
    fn test_oversized_record_leaves_contents_alone() {
        let mut buffer = LogBuffer::new(300);
        buffer.try_admit(record("short"));
        let before = buffer.len();

        assert_eq!(buffer.try_admit(record(&"x".repeat(200))), Admission::Rejected);
        assert_eq!(buffer.len(), before);
    }

    #[test]
    fn test_record_exactly_at_limit_is_admitted() {
        let mut buffer = LogBuffer::new(218);
        assert_eq!(buffer.try_admit(record(MESSAGE)), Admission::Appended);
        // index key of the first element comes on top
        assert_eq!(buffer.estimated_size(), 220);
    }

    #[test]
    fn test_drain() {
        let mut buffer = LogBuffer::new(15_000);
        assert_eq!(buffer.drain(), None);

        buffer.try_admit(record("one"));
        buffer.try_admit(record("two"));

        let drained = buffer.drain().unwrap();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].message, "one");
        assert_eq!(drained[1].message, "two");
        assert!(buffer.is_empty());
        assert_eq!(buffer.estimated_size(), 0);
        assert_eq!(buffer.drain(), None);
    }

    proptest! {
        #[test]
        fn prop_admission_respects_limit(
            limit in 150usize..2_000,
            messages in proptest::collection::vec("[a-z ]{1,120}", 1..30),
        ) {
            let mut buffer = LogBuffer::new(limit);
            for message in messages {
                let candidate = record(&message);
                let candidate_size = candidate.estimated_size();
                let before_len = buffer.len();
                let before_size = buffer.estimated_size();

                match buffer.try_admit(candidate) {
                    Admission::Rejected => {
                        prop_assert!(candidate_size > limit);
                        prop_assert_eq!(buffer.len(), before_len);
                    }
                    Admission::Appended => {
                        prop_assert!(before_size + candidate_size <= limit);
                        prop_assert_eq!(buffer.len(), before_len + 1);
                    }
                    Admission::Overflowed(evicted) => {
                        prop_assert!(before_size + candidate_size > limit);
                        prop_assert_eq!(evicted.len(), before_len);
                        prop_assert_eq!(buffer.len(), 1);
                    }
                }
            }
        }
    }
}
