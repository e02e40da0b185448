//! The per-turn loop guard.

use std::collections::HashMap;

use serde_json::Value;
use tracing::warn;

use crate::limits::GuardLimits;
use crate::termination::TerminationReason;

/// What the guard decided about one prospective tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardVerdict {
    /// Run the call.
    Allow,

    /// Run the call, but halt the turn once its result is in the
    /// transcript. Used for loop detection: the tripping call's result
    /// may be exactly what resolves the loop for the user.
    AllowThenHalt {
        reason: TerminationReason,
        message: String,
    },

    /// Do not run the call; halt the turn.
    Deny {
        reason: TerminationReason,
        message: String,
    },
}

/// Tracks tool-call volume and repetition across a session.
///
/// Counters only increase; they clear only through [`LoopGuard::reset`],
/// which the controller invokes on an explicit workflow or conversation
/// reset. Quota checks happen before counting, so a denied call never
/// consumes budget. Repetition is checked after recording, so the tripping
/// call still executes.
#[derive(Debug, Clone)]
pub struct LoopGuard {
    limits: GuardLimits,
    last_signature: Option<String>,
    consecutive_repeats: u32,
    per_tool: HashMap<String, u32>,
    total: u32,
}

impl LoopGuard {
    pub fn new(limits: GuardLimits) -> Self {
        Self {
            limits,
            last_signature: None,
            consecutive_repeats: 0,
            per_tool: HashMap::new(),
            total: 0,
        }
    }

    /// Judge a prospective call and, if allowed, record it.
    pub fn record_and_check(&mut self, tool_name: &str, arguments: &Value) -> GuardVerdict {
        let tool_count = self.per_tool.get(tool_name).copied().unwrap_or(0);
        if tool_count >= self.limits.max_per_tool {
            warn!(
                tool_name = %tool_name,
                count = tool_count,
                limit = self.limits.max_per_tool,
                "per-tool call limit reached"
            );
            return GuardVerdict::Deny {
                reason: TerminationReason::ToolCallLimitReached,
                message: format!(
                    "The tool '{tool_name}' has been called {tool_count} times this turn, \
                     which is the limit. Stopping here so the user can redirect."
                ),
            };
        }

        if self.total >= self.limits.max_total {
            warn!(
                total = self.total,
                limit = self.limits.max_total,
                "total tool call limit reached"
            );
            return GuardVerdict::Deny {
                reason: TerminationReason::ToolCallLimitReached,
                message: format!(
                    "{} tool calls have been made this turn, which is the limit. \
                     Stopping here so the user can redirect.",
                    self.total
                ),
            };
        }

        self.per_tool.insert(tool_name.to_string(), tool_count + 1);
        self.total += 1;

        let signature = canonical_signature(tool_name, arguments);
        if self.last_signature.as_deref() == Some(signature.as_str()) {
            self.consecutive_repeats += 1;
        } else {
            self.consecutive_repeats = 0;
            self.last_signature = Some(signature);
        }

        if self.consecutive_repeats >= self.limits.max_consecutive {
            warn!(
                tool_name = %tool_name,
                repeats = self.consecutive_repeats,
                "identical call repeated, treating as stuck loop"
            );
            return GuardVerdict::AllowThenHalt {
                reason: TerminationReason::InfiniteLoopDetected,
                message: format!(
                    "The tool '{tool_name}' was called with identical arguments \
                     {} times in a row. Halting after this call.",
                    self.consecutive_repeats + 1
                ),
            };
        }

        GuardVerdict::Allow
    }

    /// Clear all counters. Only called on an explicit reset, never between
    /// user messages.
    pub fn reset(&mut self) {
        self.last_signature = None;
        self.consecutive_repeats = 0;
        self.per_tool.clear();
        self.total = 0;
    }

    pub fn total_calls(&self) -> u32 {
        self.total
    }

    pub fn calls_for(&self, tool_name: &str) -> u32 {
        self.per_tool.get(tool_name).copied().unwrap_or(0)
    }

    pub fn limits(&self) -> &GuardLimits {
        &self.limits
    }
}

impl Default for LoopGuard {
    fn default() -> Self {
        Self::new(GuardLimits::default())
    }
}

/// Canonical call signature: tool name plus arguments with all object keys
/// recursively sorted, so `{"a":1,"b":2}` and `{"b":2,"a":1}` compare equal.
fn canonical_signature(tool_name: &str, arguments: &Value) -> String {
    format!("{tool_name}:{}", canonicalize(arguments))
}

fn canonicalize(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let inner: Vec<String> = keys
                .into_iter()
                .map(|k| {
                    format!(
                        "{}:{}",
                        serde_json::to_string(k).unwrap_or_default(),
                        canonicalize(&map[k])
                    )
                })
                .collect();
            format!("{{{}}}", inner.join(","))
        }
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(canonicalize).collect();
            format!("[{}]", inner.join(","))
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn allows_varied_calls() {
        let mut guard = LoopGuard::default();
        for i in 0..5 {
            let verdict = guard.record_and_check("add_component", &json!({"name": format!("R{i}")}));
            assert_eq!(verdict, GuardVerdict::Allow);
        }
        assert_eq!(guard.total_calls(), 5);
    }

    #[test]
    fn per_tool_limit_denies_without_counting() {
        let mut guard = LoopGuard::new(GuardLimits {
            max_per_tool: 2,
            max_total: 15,
            max_consecutive: 10,
        });
        guard.record_and_check("list_cells", &json!({"lib": "a"}));
        guard.record_and_check("list_cells", &json!({"lib": "b"}));

        let verdict = guard.record_and_check("list_cells", &json!({"lib": "c"}));
        assert!(matches!(
            verdict,
            GuardVerdict::Deny {
                reason: TerminationReason::ToolCallLimitReached,
                ..
            }
        ));
        // Denied call consumed no budget.
        assert_eq!(guard.calls_for("list_cells"), 2);
        assert_eq!(guard.total_calls(), 2);
    }

    #[test]
    fn total_limit_denies() {
        let mut guard = LoopGuard::new(GuardLimits {
            max_per_tool: 100,
            max_total: 3,
            max_consecutive: 100,
        });
        for i in 0..3 {
            assert_eq!(
                guard.record_and_check("t", &json!({"i": i})),
                GuardVerdict::Allow
            );
        }
        assert!(matches!(
            guard.record_and_check("t", &json!({"i": 99})),
            GuardVerdict::Deny {
                reason: TerminationReason::ToolCallLimitReached,
                ..
            }
        ));
    }

    #[test]
    fn fourth_identical_call_trips_loop_detection() {
        let mut guard = LoopGuard::default();
        let args = json!({"cell": "lna_v2"});

        assert_eq!(guard.record_and_check("check_cell_exists", &args), GuardVerdict::Allow);
        assert_eq!(guard.record_and_check("check_cell_exists", &args), GuardVerdict::Allow);
        assert_eq!(guard.record_and_check("check_cell_exists", &args), GuardVerdict::Allow);

        let verdict = guard.record_and_check("check_cell_exists", &args);
        assert!(matches!(
            verdict,
            GuardVerdict::AllowThenHalt {
                reason: TerminationReason::InfiniteLoopDetected,
                ..
            }
        ));
        // The tripping call was still counted.
        assert_eq!(guard.calls_for("check_cell_exists"), 4);
    }

    #[test]
    fn different_arguments_reset_repetition() {
        let mut guard = LoopGuard::default();
        let a = json!({"cell": "a"});
        let b = json!({"cell": "b"});

        guard.record_and_check("check_cell_exists", &a);
        guard.record_and_check("check_cell_exists", &a);
        guard.record_and_check("check_cell_exists", &b);
        // Back on `a`: the streak starts over.
        assert_eq!(guard.record_and_check("check_cell_exists", &a), GuardVerdict::Allow);
    }

    #[test]
    fn key_order_does_not_affect_signature() {
        let mut guard = LoopGuard::new(GuardLimits {
            max_per_tool: 100,
            max_total: 100,
            max_consecutive: 2,
        });
        let a = json!({"x": 1, "y": {"p": true, "q": [1, 2]}});
        let b = serde_json::from_str::<Value>(r#"{"y": {"q": [1, 2], "p": true}, "x": 1}"#).unwrap();

        guard.record_and_check("t", &a);
        guard.record_and_check("t", &b);
        let verdict = guard.record_and_check("t", &a);
        assert!(matches!(verdict, GuardVerdict::AllowThenHalt { .. }));
    }

    #[test]
    fn reset_clears_all_counters() {
        let mut guard = LoopGuard::default();
        let args = json!({"cell": "a"});
        for _ in 0..3 {
            guard.record_and_check("check_cell_exists", &args);
        }
        guard.reset();

        assert_eq!(guard.total_calls(), 0);
        assert_eq!(guard.record_and_check("check_cell_exists", &args), GuardVerdict::Allow);
    }
}
