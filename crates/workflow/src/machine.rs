//! The workflow machine: phase tracking, tool visibility, and guidance text.

use tracing::{info, warn};

use crate::context::{PlanData, WorkflowContext};
use crate::states::{GLOBAL_TOOLS, WorkflowState};

/// Drives one session's workflow context.
///
/// All methods are synchronous; callers hold the session lock while
/// mutating, so the machine itself needs no interior locking.
#[derive(Debug, Clone, Default)]
pub struct WorkflowMachine {
    context: WorkflowContext,
}

impl WorkflowMachine {
    pub fn new() -> Self {
        Self {
            context: WorkflowContext::new(),
        }
    }

    /// Rebuild a machine around a persisted context.
    pub fn from_context(context: WorkflowContext) -> Self {
        Self { context }
    }

    pub fn state(&self) -> WorkflowState {
        self.context.state
    }

    pub fn context(&self) -> &WorkflowContext {
        &self.context
    }

    /// Tool names visible in the current phase, phase set plus globals.
    pub fn allowed_tools(&self) -> Vec<String> {
        let mut tools: Vec<String> = self
            .context
            .state
            .phase_tools()
            .iter()
            .map(|s| s.to_string())
            .collect();
        if self.context.state != WorkflowState::Idle {
            for global in GLOBAL_TOOLS {
                if !tools.iter().any(|t| t == global) {
                    tools.push(global.to_string());
                }
            }
        }
        tools
    }

    /// Whether `tool_name` may run in the current phase.
    pub fn is_allowed(&self, tool_name: &str) -> bool {
        self.context.state.phase_tools().contains(&tool_name)
            || (self.context.state != WorkflowState::Idle
                && GLOBAL_TOOLS.contains(&tool_name))
    }

    /// Move to `next`. Off-graph transitions are logged and applied anyway;
    /// refusing them would wedge the session with no tool able to fire.
    pub fn transition_to(&mut self, next: WorkflowState) {
        let current = self.context.state;
        if current == next {
            return;
        }
        if current.can_transition_to(next) {
            info!(from = %current, to = %next, "workflow transition");
        } else {
            warn!(from = %current, to = %next, "off-graph workflow transition, applying anyway");
        }
        self.context.state = next;
        self.context.touch();
    }

    /// Return to idle, dropping all accumulated design context.
    pub fn reset(&mut self) {
        info!(from = %self.context.state, "workflow reset");
        self.context = WorkflowContext::new();
    }

    /// Record an accepted or proposed plan.
    pub fn set_plan(&mut self, plan_id: impl Into<String>, plan: Option<PlanData>) {
        self.context.plan_id = Some(plan_id.into());
        if let Some(plan) = plan {
            self.context.progress_total = Some(plan.components.len() as u32);
            self.context.plan_data = Some(plan);
        }
        self.context.progress_count = 0;
        self.context.last_error = None;
        self.context.touch();
    }

    /// Record the design artifact the session is now working on.
    pub fn set_target(
        &mut self,
        target_ref: impl Into<String>,
        library: Option<String>,
        cell: Option<String>,
    ) {
        self.context.target_ref = Some(target_ref.into());
        self.context.library_name = library;
        self.context.cell_name = cell;
        self.context.touch();
    }

    /// Drop the plan without touching the rest of the context. Used when
    /// the session pivots to an existing design.
    pub fn clear_plan(&mut self) {
        self.context.plan_id = None;
        self.context.plan_data = None;
        self.context.progress_total = None;
        self.context.progress_count = 0;
        self.context.touch();
    }

    /// Record `added` more placed components.
    pub fn record_progress(&mut self, added: u32) {
        self.context.progress_count = self.context.progress_count.saturating_add(added);
        self.context.last_error = None;
        self.context.touch();
    }

    pub fn record_error(&mut self, summary: impl Into<String>) {
        self.context.last_error = Some(summary.into());
        self.context.touch();
    }

    /// Guidance text injected into the system message each turn: what phase
    /// the session is in, what it has accumulated, and what to do next.
    pub fn state_prompt(&self) -> String {
        let guidance = match self.context.state {
            WorkflowState::Idle => {
                "No design task is in progress. Help the user explore the project, or \
                 call plan_circuit to start a new design, or open_existing_design to \
                 resume work on an existing one."
            }
            WorkflowState::Planning => {
                "A circuit plan has been proposed and needs the user's approval. Present \
                 the plan clearly and wait. If the user asks for changes, call \
                 plan_circuit again with the revised requirements. Do not add components \
                 or execute anything until the plan is accepted."
            }
            WorkflowState::ArtifactCreated => {
                "The plan was accepted and a design artifact exists. Call \
                 execute_circuit_plan to realize the plan as a schematic."
            }
            WorkflowState::AwaitingUser => {
                "The schematic was created. Ask the user to open it in the editor, then \
                 call confirm_design_open once they confirm. Do not add components before \
                 confirmation."
            }
            WorkflowState::Populating => {
                "The design is open. Add the planned components with add_component or \
                 add_components_from_plan, then save_current_design and finish_design \
                 when everything is placed."
            }
            WorkflowState::Completed => {
                "The design task is complete and saved. Summarize what was built. Start \
                 a new plan_circuit if the user has another task."
            }
        };

        let mut prompt = format!(
            "## Current workflow phase: {}\n{}",
            self.context.state, guidance
        );

        let mut facts: Vec<String> = Vec::new();
        if let Some(plan_id) = &self.context.plan_id {
            facts.push(format!("active plan: {plan_id}"));
        }
        if let Some(plan) = &self.context.plan_data {
            facts.push(format!(
                "plan \"{}\" with {} component(s)",
                plan.title,
                plan.components.len()
            ));
        }
        if let Some(target) = &self.context.target_ref {
            facts.push(format!("target design: {target}"));
        }
        if self.context.progress_count > 0 || self.context.progress_total.is_some() {
            facts.push(format!(
                "components placed: {}",
                self.context.progress_display()
            ));
        }
        if let Some(err) = &self.context.last_error {
            facts.push(format!("last tool failure: {err}"));
        }
        if !facts.is_empty() {
            prompt.push_str("\n\nSession context:\n");
            for fact in facts {
                prompt.push_str("- ");
                prompt.push_str(&fact);
                prompt.push('\n');
            }
        }
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PlannedComponent;

    fn plan() -> PlanData {
        PlanData {
            title: "RC low-pass filter".into(),
            components: vec![
                PlannedComponent {
                    kind: "resistor".into(),
                    name: "R1".into(),
                    value: Some("10k".into()),
                },
                PlannedComponent {
                    kind: "capacitor".into(),
                    name: "C1".into(),
                    value: Some("100n".into()),
                },
            ],
        }
    }

    #[test]
    fn globals_visible_outside_idle_only() {
        let mut machine = WorkflowMachine::new();
        assert!(!machine.is_allowed("reset_workflow"));
        assert!(machine.is_allowed("get_workflow_status"));

        machine.transition_to(WorkflowState::Planning);
        assert!(machine.is_allowed("reset_workflow"));
        assert!(machine.is_allowed("get_workflow_status"));
        assert!(machine.is_allowed("check_connection"));
    }

    #[test]
    fn phase_scoping_blocks_out_of_phase_tools() {
        let mut machine = WorkflowMachine::new();
        assert!(machine.is_allowed("plan_circuit"));
        assert!(!machine.is_allowed("add_component"));

        machine.transition_to(WorkflowState::Populating);
        assert!(machine.is_allowed("add_component"));
        assert!(!machine.is_allowed("plan_circuit"));
    }

    #[test]
    fn allowed_tools_has_no_duplicates() {
        let mut machine = WorkflowMachine::new();
        machine.transition_to(WorkflowState::Planning);
        let tools = machine.allowed_tools();
        let mut deduped = tools.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(tools.len(), deduped.len());
    }

    #[test]
    fn off_graph_transition_is_applied() {
        let mut machine = WorkflowMachine::new();
        machine.transition_to(WorkflowState::Completed);
        assert_eq!(machine.state(), WorkflowState::Completed);
    }

    #[test]
    fn set_plan_records_total_and_resets_progress() {
        let mut machine = WorkflowMachine::new();
        machine.record_progress(3);
        machine.set_plan("plan_001", Some(plan()));

        let ctx = machine.context();
        assert_eq!(ctx.plan_id.as_deref(), Some("plan_001"));
        assert_eq!(ctx.progress_total, Some(2));
        assert_eq!(ctx.progress_count, 0);
    }

    #[test]
    fn reset_drops_everything() {
        let mut machine = WorkflowMachine::new();
        machine.transition_to(WorkflowState::Populating);
        machine.set_plan("plan_001", Some(plan()));
        machine.set_target("rf_lib/lna_v2", Some("rf_lib".into()), Some("lna_v2".into()));
        machine.reset();

        assert_eq!(machine.state(), WorkflowState::Idle);
        assert!(machine.context().plan_id.is_none());
        assert!(machine.context().target_ref.is_none());
    }

    #[test]
    fn state_prompt_reflects_phase_and_context() {
        let mut machine = WorkflowMachine::new();
        machine.set_plan("plan_001", Some(plan()));
        machine.transition_to(WorkflowState::Populating);
        machine.record_progress(1);

        let prompt = machine.state_prompt();
        assert!(prompt.contains("populating"));
        assert!(prompt.contains("plan_001"));
        assert!(prompt.contains("1/2"));
    }

    #[test]
    fn record_progress_clears_last_error() {
        let mut machine = WorkflowMachine::new();
        machine.record_error("cell not found");
        assert!(machine.context().last_error.is_some());
        machine.record_progress(1);
        assert!(machine.context().last_error.is_none());
    }
}
