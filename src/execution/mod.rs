//! Execution engine for plan steps
//!
//! Steps run strictly in order. A failing, slow or unregistered capability
//! never aborts the run: it is recorded as a non-success outcome with no records.

use crate::error::OrchestrationError;
use crate::models::{Cycle, Observation, PlanStep, ToolOutcome};
use crate::tools::ToolRegistry;
use crate::Result;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Maximum steps allowed per plan
const MAX_STEPS_PER_PLAN: usize = 20;

pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(10);

/// Scheduling hook invoked after every executed step.
#[async_trait::async_trait]
pub trait StepPacer: Send + Sync {
    async fn pause(&self, step: &PlanStep);
}

/// Production pacer: no delay.
pub struct NoPacer;

#[async_trait::async_trait]
impl StepPacer for NoPacer {
    async fn pause(&self, _step: &PlanStep) {}
}

/// Sleeps a fixed duration after each step.
pub struct FixedDelay(pub Duration);

#[async_trait::async_trait]
impl StepPacer for FixedDelay {
    async fn pause(&self, _step: &PlanStep) {
        tokio::time::sleep(self.0).await;
    }
}

/// Executes plan steps against the tool registry
pub struct ExecutionEngine {
    tool_registry: ToolRegistry,
    tool_timeout: Duration,
    pacer: Box<dyn StepPacer>,
}

impl ExecutionEngine {
    pub fn new(tool_registry: ToolRegistry) -> Self {
        Self {
            tool_registry,
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
            pacer: Box::new(NoPacer),
        }
    }

    pub fn with_timeout(mut self, tool_timeout: Duration) -> Self {
        self.tool_timeout = tool_timeout;
        self
    }

    pub fn with_pacer(mut self, pacer: Box<dyn StepPacer>) -> Self {
        self.pacer = pacer;
        self
    }

    /// Execute all steps in order, one observation per step.
    pub async fn execute_steps(&self, steps: &[PlanStep], cycle: Cycle) -> Result<Vec<Observation>> {
        if steps.len() > MAX_STEPS_PER_PLAN {
            return Err(OrchestrationError::InvalidPlan(format!(
                "Plan exceeds maximum allowed steps ({})",
                MAX_STEPS_PER_PLAN
            )));
        }

        let mut observations = Vec::with_capacity(steps.len());

        for step in steps {
            debug!(tool = %step.tool, ?cycle, "Processing step");

            let start = Instant::now();
            let outcome = self.dispatch(step).await;
            let execution_time_ms = start.elapsed().as_millis() as u64;

            debug!(
                tool = %step.tool,
                success = outcome.is_success(),
                records = outcome.records().len(),
                execution_time_ms,
                "Step finished"
            );

            observations.push(Observation {
                tool: step.tool,
                cycle,
                args: step.args.clone(),
                outcome,
                execution_time_ms,
            });

            self.pacer.pause(step).await;
        }

        Ok(observations)
    }

    async fn dispatch(&self, step: &PlanStep) -> ToolOutcome {
        let Some(tool) = self.tool_registry.get(step.tool) else {
            warn!(tool = %step.tool, "Tool not registered");
            return ToolOutcome::Unavailable;
        };

        match tokio::time::timeout(self.tool_timeout, tool.execute(&step.args)).await {
            Ok(Ok(records)) => ToolOutcome::Completed { records },
            Ok(Err(e)) => {
                warn!(tool = %step.tool, error = %e, "Tool execution failed");
                ToolOutcome::Failed {
                    reason: e.to_string(),
                }
            }
            Err(_) => {
                warn!(
                    tool = %step.tool,
                    timeout_ms = self.tool_timeout.as_millis() as u64,
                    "Tool execution timed out"
                );
                ToolOutcome::TimedOut
            }
        }
    }
}
