// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::level::LogLevel;

/// Whether a record at `candidate` passes a `threshold`.
///
/// Passes when the threshold's priority is at least the candidate's: a `debug`
/// threshold lets everything through, a `fatal` one only `fatal`.
#[must_use]
pub fn is_admitted(threshold: LogLevel, candidate: LogLevel) -> bool {
    threshold.priority() >= candidate.priority()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_debug_admits_everything() {
        for level in LogLevel::ALL {
            assert!(is_admitted(LogLevel::Debug, level));
        }
    }

    #[test]
    fn test_fatal_admits_only_fatal() {
        assert!(is_admitted(LogLevel::Fatal, LogLevel::Fatal));
        for level in &LogLevel::ALL[1..] {
            assert!(!is_admitted(LogLevel::Fatal, *level));
        }
    }

    #[test]
    fn test_below_threshold_is_refused() {
        assert!(!is_admitted(LogLevel::Error, LogLevel::Warn));
        assert!(!is_admitted(LogLevel::Warn, LogLevel::Info));
        assert!(!is_admitted(LogLevel::Info, LogLevel::Debug));
        assert!(is_admitted(LogLevel::Warn, LogLevel::Error));
    }

    fn any_level() -> impl Strategy<Value = LogLevel> {
        proptest::sample::select(LogLevel::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_threshold_monotonic(a in any_level(), b in any_level(), candidate in any_level()) {
            if a.priority() < b.priority() && is_admitted(a, candidate) {
                prop_assert!(is_admitted(b, candidate));
            }
        }
    }
}
