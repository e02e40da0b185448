//! Bench instrument control tool (mock implementation).
//!
//! Simulates a programmable bench source: power on/off, set level, read
//! status. Kept as a mock so the agent surface can be exercised without
//! lab hardware attached.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

use benchpilot_core::{Tool, ToolError, ToolOutcome};

#[derive(Debug, Clone, Copy)]
struct InstrumentState {
    powered: bool,
    level_mw: f64,
}

pub struct InstrumentControlTool {
    state: Mutex<InstrumentState>,
    max_level_mw: f64,
}

impl InstrumentControlTool {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(InstrumentState {
                powered: false,
                level_mw: 0.0,
            }),
            max_level_mw: 100.0,
        }
    }
}

impl Default for InstrumentControlTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for InstrumentControlTool {
    fn name(&self) -> &str {
        "instrument_control"
    }

    fn description(&self) -> &str {
        "Control the bench source: power on/off, set output level, read status"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["power_on", "power_off", "set_level", "status"],
                    "description": "What to do"
                },
                "level_mw": {
                    "type": "number",
                    "description": "Output level in milliwatts, for set_level"
                }
            },
            "required": ["action"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolOutcome, ToolError> {
        let action = arguments
            .get("action")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ToolError::InvalidArguments("missing required argument 'action'".into())
            })?;

        let mut state = self.state.lock().unwrap();
        match action {
            "power_on" => {
                state.powered = true;
                info!("instrument powered on");
                Ok(ToolOutcome::success("instrument powered on"))
            }
            "power_off" => {
                state.powered = false;
                state.level_mw = 0.0;
                info!("instrument powered off");
                Ok(ToolOutcome::success("instrument powered off"))
            }
            "set_level" => {
                if !state.powered {
                    return Ok(ToolOutcome::failure(
                        "instrument is powered off; power it on first",
                    ));
                }
                let level = arguments
                    .get("level_mw")
                    .and_then(Value::as_f64)
                    .ok_or_else(|| {
                        ToolError::InvalidArguments("set_level requires 'level_mw'".into())
                    })?;
                if !(0.0..=self.max_level_mw).contains(&level) {
                    return Ok(ToolOutcome::failure(format!(
                        "level {level} mW is outside the safe range 0..={} mW",
                        self.max_level_mw
                    )));
                }
                state.level_mw = level;
                Ok(ToolOutcome::success(format!("output level set to {level} mW")))
            }
            "status" => Ok(ToolOutcome::success("instrument status").with_data(json!({
                "powered": state.powered,
                "level_mw": state.level_mw,
            }))),
            other => Err(ToolError::InvalidArguments(format!(
                "unknown action '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use benchpilot_core::ToolStatus;

    #[tokio::test]
    async fn level_requires_power() {
        let tool = InstrumentControlTool::new();
        let outcome = tool
            .execute(json!({"action": "set_level", "level_mw": 10.0}))
            .await
            .unwrap();
        assert_eq!(outcome.status, ToolStatus::Failure);
    }

    #[tokio::test]
    async fn out_of_range_level_is_refused() {
        let tool = InstrumentControlTool::new();
        tool.execute(json!({"action": "power_on"})).await.unwrap();
        let outcome = tool
            .execute(json!({"action": "set_level", "level_mw": 500.0}))
            .await
            .unwrap();
        assert_eq!(outcome.status, ToolStatus::Failure);
    }

    #[tokio::test]
    async fn power_cycle_resets_level() {
        let tool = InstrumentControlTool::new();
        tool.execute(json!({"action": "power_on"})).await.unwrap();
        tool.execute(json!({"action": "set_level", "level_mw": 20.0}))
            .await
            .unwrap();
        tool.execute(json!({"action": "power_off"})).await.unwrap();

        let status = tool.execute(json!({"action": "status"})).await.unwrap();
        let data = status.data.unwrap();
        assert_eq!(data["powered"], false);
        assert_eq!(data["level_mw"], 0.0);
    }
}
