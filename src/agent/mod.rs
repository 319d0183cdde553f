//! Main orchestrator - implements the control loop
//!
//! PLAN → ACT → REASON → REFLECT → (FALLBACK ACT → REASON → REFLECT)? → GENERATE
//!
//! The orchestrator holds only immutable collaborators. All per-query state
//! lives on a `RunSession` created for that query and dropped with it.

use crate::config::Settings;
use crate::error::OrchestrationError;
use crate::execution::ExecutionEngine;
use crate::gemini::GeminiClient;
use crate::models::{
    Answer, ConfidenceVerdict, Cycle, EvidenceSet, Observation, PlanStep, Query, RunPhase,
    RunReport,
};
use crate::normalizer;
use crate::planner::{HeuristicPlanner, Planner};
use crate::synthesis::{ResponseSynthesizer, Summarizer};
use crate::tools::create_default_registry;
use crate::verification::FreshnessEvaluator;
use crate::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

pub mod fallback;
pub use fallback::FallbackPolicy;

/// State owned by a single orchestration run
struct RunSession<'q> {
    run_id: Uuid,
    query: &'q Query,
    pending: Vec<PlanStep>,
    observations: Vec<Observation>,
    absorbed: usize,
    evidence: EvidenceSet,
    verdict: Option<ConfidenceVerdict>,
    phases: Vec<RunPhase>,
    fallback_ran: bool,
}

impl<'q> RunSession<'q> {
    fn new(query: &'q Query) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            query,
            pending: Vec::new(),
            observations: Vec::new(),
            absorbed: 0,
            evidence: EvidenceSet::new(),
            verdict: None,
            phases: Vec::new(),
            fallback_ran: false,
        }
    }

    fn enter(&mut self, phase: RunPhase) {
        debug!(phase = %phase, "Entering phase");
        self.phases.push(phase);
    }

    /// Normalize every observation not yet folded into the evidence.
    fn reason(&mut self) {
        for obs in &self.observations[self.absorbed..] {
            normalizer::absorb(&mut self.evidence, obs.outcome.records().to_vec());
        }
        self.absorbed = self.observations.len();
        debug!(evidence = self.evidence.len(), "Evidence updated");
    }
}

/// Main orchestrator that coordinates the control loop
pub struct Orchestrator {
    planner: Box<dyn Planner>,
    execution_engine: ExecutionEngine,
    evaluator: FreshnessEvaluator,
    synthesizer: ResponseSynthesizer,
    fallback: FallbackPolicy,
}

impl Orchestrator {
    pub fn new(
        planner: Box<dyn Planner>,
        execution_engine: ExecutionEngine,
        evaluator: FreshnessEvaluator,
        synthesizer: ResponseSynthesizer,
    ) -> Self {
        Self {
            planner,
            execution_engine,
            evaluator,
            synthesizer,
            fallback: FallbackPolicy,
        }
    }

    /// Wire the production collaborators from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let registry = create_default_registry(settings)?;
        let execution_engine = ExecutionEngine::new(registry).with_timeout(settings.tool_timeout);

        let summarizer: Option<Arc<dyn Summarizer>> = match &settings.gemini_api_key {
            Some(key) => Some(Arc::new(GeminiClient::new(key.clone())?) as Arc<dyn Summarizer>),
            None => None,
        };

        Ok(Self::new(
            Box::new(HeuristicPlanner::new(settings.search_limit)),
            execution_engine,
            FreshnessEvaluator::with_window_days(settings.freshness_window_days)?,
            ResponseSynthesizer::new(summarizer).with_summary_timeout(settings.summary_timeout),
        ))
    }

    /// Run the control loop and return only the answer
    pub async fn run(&self, query: &Query) -> Result<Answer> {
        Ok(self.run_report(query).await?.answer)
    }

    /// Run the control loop, returning the answer with the run's trace
    pub async fn run_report(&self, query: &Query) -> Result<RunReport> {
        let session = RunSession::new(query);
        let span = info_span!("run", run_id = %session.run_id);
        self.drive(session).instrument(span).await
    }

    async fn drive(&self, mut session: RunSession<'_>) -> Result<RunReport> {
        info!(
            query = %session.query.text,
            region = %session.query.region,
            "Orchestrator: starting run"
        );

        let mut phase = RunPhase::Planning;

        let answer = loop {
            session.enter(phase);

            phase = match phase {
                RunPhase::Planning => {
                    session.pending = self.planner.plan(session.query);
                    RunPhase::Acting
                }
                RunPhase::Acting => {
                    self.act(&mut session, Cycle::Initial).await?;
                    RunPhase::Reasoning
                }
                RunPhase::Reasoning => {
                    session.reason();
                    RunPhase::Reflecting
                }
                RunPhase::Reflecting => {
                    let verdict = self.reflect(&mut session);
                    if self.fallback.should_run(&verdict, session.fallback_ran) {
                        info!(
                            score = verdict.score,
                            "Not confident after initial retrieval, running fallback cycle"
                        );
                        RunPhase::FallbackActing
                    } else {
                        RunPhase::Generating
                    }
                }
                RunPhase::FallbackActing => {
                    session.fallback_ran = true;
                    session.pending = self.fallback.steps(session.query);
                    self.act(&mut session, Cycle::Fallback).await?;
                    RunPhase::FallbackReasoning
                }
                RunPhase::FallbackReasoning => {
                    session.reason();
                    RunPhase::FallbackReflecting
                }
                RunPhase::FallbackReflecting => {
                    self.reflect(&mut session);
                    RunPhase::Generating
                }
                RunPhase::Generating => {
                    let verdict = match session.verdict {
                        Some(v) => v,
                        None => self.reflect(&mut session),
                    };
                    break self
                        .synthesizer
                        .synthesize(session.query, &session.evidence, &verdict)
                        .await;
                }
                RunPhase::Done => {
                    return Err(OrchestrationError::InvalidState(
                        "run loop re-entered after completion".to_string(),
                    ));
                }
            };
        };

        session.enter(RunPhase::Done);

        info!(
            confidence = answer.confidence,
            candidates = answer.candidates.len(),
            fallback_ran = session.fallback_ran,
            "Orchestrator: run complete"
        );

        Ok(RunReport {
            run_id: session.run_id,
            answer,
            phases: session.phases,
            observations: session.observations,
            fallback_ran: session.fallback_ran,
        })
    }

    async fn act(&self, session: &mut RunSession<'_>, cycle: Cycle) -> Result<()> {
        let steps = std::mem::take(&mut session.pending);
        let observations = self.execution_engine.execute_steps(&steps, cycle).await?;
        session.observations.extend(observations);
        Ok(())
    }

    fn reflect(&self, session: &mut RunSession<'_>) -> ConfidenceVerdict {
        let verdict = self.evaluator.evaluate(&session.evidence, Utc::now());
        session.verdict = Some(verdict);
        verdict
    }
}
