//! Battle service orchestrating the resolver, the store and collaborators.
//!
//! Every submission follows the same optimistic cycle: load the latest
//! snapshot, resolve the action against it, and commit with the snapshot's
//! version as the expected token. A lost race re-runs the cycle on the
//! winner's state; nothing is merged. The clock is sampled once per attempt.

use std::sync::Arc;

use combat_core::{
    ActionRequest, ActionResolver, Battle, BattleAction, BattleHistory, BattleId, BattleStatus,
    Conclusion, ContentCatalogue, Controller, Timestamp, engine::ActionPlan,
};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::ai::{ActionPlanner, AiContext, FitnessPlanner};
use crate::api::{
    BattleSetup, BattleView, CombatStatus, InMemoryDirectory, OutcomeConsumer,
    ParticipantDirectory, RecordedOutcomes, Result, RuntimeError, Submitted,
};
use crate::clock::{Clock, SystemClock};
use crate::config::RuntimeConfig;
use crate::events::{BattleEvent, EventBus};
use crate::repository::{
    BattleStore, CommitRecord, InMemoryUsageStore, RepositoryError, RoundHistory, UsageQuery,
    UsageRepository, UsageSummary, group_by_round,
};
use crate::workers::{AggregationHandle, AggregationWorker};

/// Entry point for running battles.
///
/// Holds no battle state between calls; every operation reads the store.
pub struct BattleService {
    config: RuntimeConfig,
    store: Arc<dyn BattleStore>,
    catalogue: Arc<dyn ContentCatalogue>,
    clock: Arc<dyn Clock>,
    directory: Arc<dyn ParticipantDirectory>,
    outcomes: Arc<dyn OutcomeConsumer>,
    usage: Arc<dyn UsageRepository>,
    planner: Arc<dyn ActionPlanner>,
    events: EventBus,
    aggregation: AggregationHandle,
    aggregation_task: JoinHandle<()>,
}

impl BattleService {
    /// Create a new service builder
    pub fn builder() -> BattleServiceBuilder {
        BattleServiceBuilder::new()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Subscribe to committed, concluded and frozen battle events
    pub fn subscribe(&self) -> broadcast::Receiver<BattleEvent> {
        self.events.subscribe()
    }

    fn resolver(&self) -> ActionResolver<'_, dyn ContentCatalogue> {
        ActionResolver::new(self.catalogue.as_ref(), &self.config.engine)
    }

    // ========================================================================
    // Battle lifecycle
    // ========================================================================

    /// Seeds the entrants from the directory and stores a fresh battle at
    /// round 1, version 1.
    pub async fn start_battle(&self, setup: BattleSetup) -> Result<BattleView> {
        let mut participants = Vec::with_capacity(setup.entrants.len());
        for entrant in &setup.entrants {
            let mut participant = self
                .directory
                .seed(entrant.id)
                .await?
                .ok_or(RuntimeError::UnknownParticipant(entrant.id))?;
            participant.id = entrant.id;
            participant.team = entrant.team;
            participant.position = entrant.position;
            participant.action_points = self.config.engine.clock.max_action_points;
            participant.cooldowns.clear();
            participant.used_actions.clear();
            participant.fled = false;
            participants.push(participant);
        }

        let now = self.clock.now();
        let battle = Battle::new(
            setup.id,
            setup.battle_type,
            setup.battlefield,
            participants,
            now,
        )?
        .with_reward_scaling(setup.reward_scaling);
        self.store.create(&battle)?;

        for participant in &battle.users_state {
            if let Err(e) = self
                .directory
                .update_status(participant.id, CombatStatus::EnteredCombat, None)
                .await
            {
                warn!("Failed to mark {} as in combat: {}", participant.id, e);
            }
        }

        info!(
            battle = %battle.id,
            battle_type = %battle.battle_type,
            participants = battle.users_state.len(),
            "battle started"
        );
        let initiative = self.resolver().initiative(&battle, now, 0);
        Ok(BattleView {
            version: battle.version,
            battle,
            initiative,
        })
    }

    /// Latest snapshot with the clock evaluated at `now - offset_ms`, where
    /// `offset_ms` is the caller's measured clock skew.
    pub fn snapshot(&self, id: BattleId, offset_ms: i64) -> Result<BattleView> {
        let battle = self.load(id)?;
        let initiative = self.resolver().initiative(&battle, self.clock.now(), offset_ms);
        Ok(BattleView {
            version: battle.version,
            battle,
            initiative,
        })
    }

    /// Runs every check for `request` without committing anything.
    pub fn preview(&self, id: BattleId, request: &ActionRequest) -> Result<ActionPlan> {
        let battle = self.load(id)?;
        Ok(self.resolver().validate(&battle, request, self.clock.now())?)
    }

    /// Resolves and commits one action.
    ///
    /// Validation failures return immediately and never reach the store. A
    /// version conflict re-runs the whole cycle on fresh state, up to
    /// `max_commit_attempts` times, then surfaces
    /// [`RuntimeError::RefreshRequired`].
    pub async fn submit(&self, id: BattleId, request: ActionRequest) -> Result<Submitted> {
        let max_attempts = self.config.max_commit_attempts.max(1);

        for attempt in 1..=max_attempts {
            let battle = self.load(id)?;
            let expected_version = battle.version;
            let now = self.clock.now();
            let resolution = self.resolver().resolve(&battle, &request, now)?;

            let record = CommitRecord::new(resolution.action.clone())
                .with_knockouts(resolution.knockouts.clone());
            let written = if resolution.conclusion.is_some() {
                self.store
                    .archive(id, expected_version, resolution.battle.clone(), record)
            } else {
                self.store
                    .commit(id, expected_version, resolution.battle.clone(), record)
            };

            match written {
                Ok(version) => {
                    let mut battle = resolution.battle;
                    battle.version = version;
                    if resolution.conclusion.is_some() {
                        battle.status = BattleStatus::Concluded;
                    }
                    let mut action = resolution.action;
                    action.battle_id = id;
                    action.battle_version = version;

                    debug!(
                        "Committed {}[v{}] round {}: {}",
                        id, version, battle.round, action.description
                    );
                    self.events.publish(BattleEvent::Committed {
                        battle_id: id,
                        version,
                        round: battle.round,
                        action: action.clone(),
                    });
                    if let Some(conclusion) = &resolution.conclusion {
                        self.conclude(&battle, conclusion).await;
                    }

                    return Ok(Submitted {
                        battle,
                        action,
                        conclusion: resolution.conclusion,
                        attempts: attempt,
                    });
                }
                Err(RepositoryError::VersionConflict {
                    expected, actual, ..
                }) => {
                    warn!(
                        battle = %id,
                        attempt,
                        expected,
                        actual,
                        "version conflict, re-running on fresh state"
                    );
                }
                Err(RepositoryError::Corrupted { reason, .. }) => {
                    return Err(self.quarantine(id, reason));
                }
                Err(error) => return Err(error.into()),
            }
        }

        warn!(battle = %id, attempts = max_attempts, "commit retries exhausted");
        Err(RuntimeError::RefreshRequired {
            battle_id: id,
            attempts: max_attempts,
        })
    }

    /// Lets the AI act when it controls the participant holding initiative.
    ///
    /// Returns `Ok(None)` when a human holds the turn, nobody does, or the
    /// planner finds nothing legal. The chosen action is committed through
    /// [`BattleService::submit`] like any other.
    pub async fn act_for_ai(&self, id: BattleId) -> Result<Option<Submitted>> {
        let battle = self.load(id)?;
        let now = self.clock.now();
        let resolver = self.resolver();
        let initiative = resolver.initiative(&battle, now, 0);
        let Some(actor) = initiative
            .active
            .and_then(|active| battle.participant(active))
            .filter(|p| p.controller == Controller::Ai)
        else {
            return Ok(None);
        };

        let ctx = AiContext::new(&battle, actor, self.catalogue.as_ref(), &resolver, now);
        let Some(request) = self.planner.plan(&ctx) else {
            warn!(battle = %id, actor = %actor.id, "AI found no legal action");
            return Ok(None);
        };
        debug!("AI {} acts in {}: {}", actor.id, id, request.action);
        self.submit(id, request).await.map(Some)
    }

    /// Hands a terminal result to aggregation, rewards and the directory.
    ///
    /// The battle is already archived; failures here are logged, not returned.
    async fn conclude(&self, battle: &Battle, conclusion: &Conclusion) {
        self.aggregation.record(conclusion.usage.clone());

        if let Err(e) = self.outcomes.settle(battle, conclusion).await {
            error!("Failed to settle outcome of {}: {}", battle.id, e);
        }

        for participant in &battle.users_state {
            let status = match conclusion.outcome_of(participant.id) {
                _ if participant.is_knocked_out() => CombatStatus::Hospitalized,
                Some(outcome) => CombatStatus::LeftCombat { outcome },
                None => continue,
            };
            if let Err(e) = self
                .directory
                .update_status(participant.id, status, Some(participant.pools))
                .await
            {
                error!("Failed to write back {} after {}: {}", participant.id, battle.id, e);
            }
        }

        info!(
            battle = %battle.id,
            version = battle.version,
            winner = ?conclusion.winner,
            "battle concluded"
        );
        self.events.publish(BattleEvent::Concluded {
            battle_id: battle.id,
            version: battle.version,
            conclusion: conclusion.clone(),
        });
    }

    // ========================================================================
    // Read side
    // ========================================================================

    /// History rows after `after_version`, ascending, at most `limit`.
    pub fn history(
        &self,
        id: BattleId,
        after_version: u64,
        limit: usize,
    ) -> Result<Vec<BattleAction>> {
        self.guard(id, self.store.actions(id, after_version, limit))
    }

    /// Full history grouped by round for display.
    pub fn rounds(&self, id: BattleId) -> Result<Vec<RoundHistory>> {
        Ok(group_by_round(self.history(id, 0, usize::MAX)?))
    }

    pub fn pairings(&self, id: BattleId) -> Result<Vec<BattleHistory>> {
        self.guard(id, self.store.pairings(id))
    }

    /// Outcome totals for the counters matching `query`. Eventually
    /// consistent with concluded battles; see [`BattleService::flush_usage`].
    pub fn usage(&self, query: &UsageQuery) -> Result<UsageSummary> {
        Ok(self.usage.summary(query)?)
    }

    /// Waits until every queued usage counter has been applied.
    pub async fn flush_usage(&self) -> Result<()> {
        self.aggregation.flush().await
    }

    /// Stops the aggregation worker after it drains its queue.
    pub async fn shutdown(self) -> Result<()> {
        self.aggregation.shutdown().await?;
        if let Err(e) = self.aggregation_task.await {
            error!("Aggregation worker join failed: {}", e);
        }
        Ok(())
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Latest snapshot, refused when its content breaks the model's
    /// invariants even though it decoded cleanly.
    fn load(&self, id: BattleId) -> Result<Battle> {
        let battle = self
            .guard(id, self.store.get(id))?
            .ok_or(RuntimeError::BattleNotFound(id))?;
        if let Err(violation) = battle.check_integrity(&self.config.engine) {
            return Err(self.quarantine(id, violation.to_string()));
        }
        Ok(battle)
    }

    /// Maps store errors, freezing the battle on integrity failures.
    fn guard<T>(&self, id: BattleId, result: crate::repository::Result<T>) -> Result<T> {
        match result {
            Ok(value) => Ok(value),
            Err(RepositoryError::Corrupted { reason, .. }) => Err(self.quarantine(id, reason)),
            Err(RepositoryError::NotFound(id)) => Err(RuntimeError::BattleNotFound(id)),
            Err(error) => Err(error.into()),
        }
    }

    fn quarantine(&self, id: BattleId, reason: String) -> RuntimeError {
        error!(battle = %id, %reason, "integrity failure");
        if let Err(e) = self.store.freeze(id, &reason) {
            error!("Failed to freeze {}: {}", id, e);
        }
        self.events.publish(BattleEvent::Frozen {
            battle_id: id,
            reason: reason.clone(),
        });
        RuntimeError::IntegrityFailure {
            battle_id: id,
            reason,
        }
    }

    /// Current wall-clock instant as seen by the service.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }
}

/// Builder for [`BattleService`].
///
/// A store and a catalogue are required. Everything else falls back to
/// in-memory collaborators and the system clock.
#[derive(Default)]
pub struct BattleServiceBuilder {
    config: RuntimeConfig,
    store: Option<Arc<dyn BattleStore>>,
    catalogue: Option<Arc<dyn ContentCatalogue>>,
    clock: Option<Arc<dyn Clock>>,
    directory: Option<Arc<dyn ParticipantDirectory>>,
    outcomes: Option<Arc<dyn OutcomeConsumer>>,
    usage: Option<Arc<dyn UsageRepository>>,
    planner: Option<Arc<dyn ActionPlanner>>,
}

impl BattleServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(mut self, store: Arc<dyn BattleStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn catalogue(mut self, catalogue: Arc<dyn ContentCatalogue>) -> Self {
        self.catalogue = Some(catalogue);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn directory(mut self, directory: Arc<dyn ParticipantDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn outcomes(mut self, outcomes: Arc<dyn OutcomeConsumer>) -> Self {
        self.outcomes = Some(outcomes);
        self
    }

    pub fn usage_store(mut self, usage: Arc<dyn UsageRepository>) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Planner used by [`BattleService::act_for_ai`]. Defaults to
    /// [`FitnessPlanner`].
    pub fn planner(mut self, planner: Arc<dyn ActionPlanner>) -> Self {
        self.planner = Some(planner);
        self
    }

    /// Spawns the aggregation worker, so it must run inside a Tokio runtime.
    pub fn build(self) -> Result<BattleService> {
        let store = self.store.ok_or(RuntimeError::MissingComponent("battle store"))?;
        let catalogue = self
            .catalogue
            .ok_or(RuntimeError::MissingComponent("content catalogue"))?;
        let usage: Arc<dyn UsageRepository> = self
            .usage
            .unwrap_or_else(|| Arc::new(InMemoryUsageStore::new()));
        let (aggregation, aggregation_task) =
            AggregationWorker::spawn(usage.clone(), self.config.aggregation_buffer_size);

        Ok(BattleService {
            events: EventBus::with_capacity(self.config.event_buffer_size),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            directory: self
                .directory
                .unwrap_or_else(|| Arc::new(InMemoryDirectory::new())),
            outcomes: self
                .outcomes
                .unwrap_or_else(|| Arc::new(RecordedOutcomes::new())),
            planner: self.planner.unwrap_or_else(|| Arc::new(FitnessPlanner::new())),
            config: self.config,
            store,
            catalogue,
            usage,
            aggregation,
            aggregation_task,
        })
    }
}
