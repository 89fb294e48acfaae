/// The story pipeline: Form → Idea → Acts → Blocks → Variants.
///
/// `StoryEngine` owns the session policy, the gate, a clock and an audit
/// sink, and wires gate check → generation → atomic apply for every
/// block action.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::acts;
use crate::core::audit::{dispatch_best_effort, AuditRecord, AuditSink, GenerationMode, NullAuditSink, Stage};
use crate::core::blocks;
use crate::core::idea;
use crate::core::policy::{DetailPolicy, PolicyError};
use crate::core::session::{ActionKind, Clock, GateRejection, SessionGate, SystemClock};
use crate::core::template::TemplateError;
use crate::core::variants::{self, BlockRequest, VariantError};
use crate::schema::acts::ActsResult;
use crate::schema::blocks::{BlockOverviewVariant, BlocksDraft, ExpandPreset, VariantId};
use crate::schema::idea::{CompactedPayload, IdeaCandidate, IdeaForm, IdeaResult, IdeaState, RandomizeScope};
use crate::schema::options::{CatalogError, OptionCatalog};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("template error: {0}")]
    Template(#[from] TemplateError),
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("policy error: {0}")]
    Policy(#[from] PolicyError),
    #[error("generation mode '{}' is not supported", .0.as_str())]
    UnsupportedMode(GenerationMode),
    #[error("block {0} not found")]
    BlockNotFound(u8),
    #[error("block {0} has no selected overview")]
    OverviewNotFound(u8),
    #[error("variant not found: {0}")]
    VariantNotFound(#[from] VariantError),
}

/// Result of a gated block action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The new variant was appended and selected.
    Applied(VariantId),
    /// The gate turned the request away; nothing changed.
    Blocked(GateRejection),
}

impl ActionOutcome {
    pub fn applied(&self) -> Option<VariantId> {
        match self {
            Self::Applied(id) => Some(*id),
            Self::Blocked(_) => None,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked(_))
    }
}

/// The top-level story engine. Built via `StoryEngine::builder()`.
///
/// One engine is one session: the detail quota and cooldowns live as
/// long as it does.
pub struct StoryEngine {
    mode: GenerationMode,
    policy: DetailPolicy,
    catalog: OptionCatalog,
    gate: SessionGate,
    clock: Box<dyn Clock>,
    audit: Box<dyn AuditSink>,
}

/// Builder for constructing a `StoryEngine`.
pub struct StoryEngineBuilder {
    mode: GenerationMode,
    policy: Option<DetailPolicy>,
    policy_file: Option<PathBuf>,
    catalog: Option<OptionCatalog>,
    catalog_file: Option<PathBuf>,
    clock: Option<Box<dyn Clock>>,
    audit: Option<Box<dyn AuditSink>>,
}

impl StoryEngine {
    pub fn builder() -> StoryEngineBuilder {
        StoryEngineBuilder {
            mode: GenerationMode::Mock,
            policy: None,
            policy_file: None,
            catalog: None,
            catalog_file: None,
            clock: None,
            audit: None,
        }
    }

    pub fn mode(&self) -> GenerationMode {
        self.mode
    }

    pub fn policy(&self) -> &DetailPolicy {
        &self.policy
    }

    pub fn catalog(&self) -> &OptionCatalog {
        &self.catalog
    }

    pub fn gate(&self) -> &SessionGate {
        &self.gate
    }

    pub fn detail_gen_count(&self) -> u32 {
        self.gate.detail_gen_count()
    }

    pub fn can_generate_detail(&self) -> bool {
        self.gate.can_generate_detail(&self.policy)
    }

    pub fn is_cooling_down(&self, index: u8) -> bool {
        self.gate.is_cooling_down(index, self.clock.now_ms(), &self.policy)
    }

    // -- Idea stage ---------------------------------------------------------

    /// Fill part of a form from the catalog.
    pub fn randomize_form(&self, form: &IdeaForm, scope: RandomizeScope) -> IdeaForm {
        idea::randomize_form(form, &self.catalog, scope)
    }

    /// Generate two idea candidates.
    ///
    /// `payload` is the compacted form as a backend would receive it; it is
    /// recorded with the audit entry.
    pub fn generate_idea(
        &self,
        form: &IdeaForm,
        payload: &CompactedPayload,
        seed: Option<u32>,
    ) -> Result<IdeaResult, EngineError> {
        let started = self.clock.now_ms();
        let mut record = AuditRecord::new(Stage::Idea, self.mode, started);
        if let Ok(input) = ron::to_string(payload) {
            record = record.with_input(input);
        }

        let result = self
            .ensure_mock()
            .and_then(|()| Ok(idea::generate_idea(form, &self.catalog, seed)?));
        self.finish(record, started, &result, |r| {
            r.candidates
                .iter()
                .map(|c| c.logline.len() + c.synopsis.len())
                .sum()
        });
        result
    }

    // -- Acts stage ---------------------------------------------------------

    pub fn generate_acts(
        &self,
        logline: &str,
        synopsis: &str,
        state: &IdeaState,
    ) -> Result<ActsResult, EngineError> {
        let started = self.clock.now_ms();
        let record = AuditRecord::new(Stage::Acts, self.mode, started).with_seed(state.seed);
        let result = self
            .ensure_mock()
            .and_then(|()| Ok(acts::generate_acts(logline, synopsis, state)?));
        self.finish(record, started, &result, |r| {
            r.acts.iter().map(|a| a.summary.len()).sum()
        });
        result
    }

    // -- Blocks stage -------------------------------------------------------

    pub fn generate_blocks_overview(
        &self,
        candidate: &IdeaCandidate,
        state: &IdeaState,
        acts: Option<&ActsResult>,
    ) -> Result<BlocksDraft, EngineError> {
        let started = self.clock.now_ms();
        let record =
            AuditRecord::new(Stage::BlocksOverview, self.mode, started).with_seed(state.seed);
        let result = self.ensure_mock().and_then(|()| {
            Ok(blocks::generate_blocks_overview(candidate, state, acts, started)?)
        });
        self.finish(record, started, &result, |draft| {
            draft
                .blocks_by_index
                .values()
                .flat_map(|n| n.overview_variants.iter())
                .map(|v| v.headline.len())
                .sum()
        });
        result
    }

    // -- Block actions ------------------------------------------------------

    /// Replace the block's overview with a fresh draw.
    pub fn regenerate_overview(
        &mut self,
        draft: &mut BlocksDraft,
        state: &IdeaState,
        index: u8,
    ) -> Result<ActionOutcome, EngineError> {
        self.run_overview_action(draft, state, index, ActionKind::RegenerateOverview, |req, _current, nonce| {
            Ok(variants::regenerate_overview(req, nonce)?)
        })
    }

    /// Rework the block's selected overview through a preset.
    pub fn expand_overview(
        &mut self,
        draft: &mut BlocksDraft,
        state: &IdeaState,
        index: u8,
        preset: ExpandPreset,
    ) -> Result<ActionOutcome, EngineError> {
        self.run_overview_action(draft, state, index, ActionKind::ExpandOverview, |req, current, nonce| {
            Ok(variants::expand_overview(req, current, preset, nonce))
        })
    }

    /// Generate a detail beat from the block's selected overview.
    pub fn generate_detail(
        &mut self,
        draft: &mut BlocksDraft,
        state: &IdeaState,
        index: u8,
    ) -> Result<ActionOutcome, EngineError> {
        self.run_detail_action(draft, state, index, None)
    }

    /// Generate a detail beat expanded by a preset.
    pub fn expand_detail(
        &mut self,
        draft: &mut BlocksDraft,
        state: &IdeaState,
        index: u8,
        preset: ExpandPreset,
    ) -> Result<ActionOutcome, EngineError> {
        self.run_detail_action(draft, state, index, Some(preset))
    }

    /// Point the block at an existing overview. Not gated.
    pub fn select_overview(
        &self,
        draft: &mut BlocksDraft,
        index: u8,
        id: VariantId,
    ) -> Result<(), EngineError> {
        let node = draft.node_mut(index).ok_or(EngineError::BlockNotFound(index))?;
        node.select_overview(id)?;
        Ok(())
    }

    /// Point the block at an existing detail. Not gated.
    pub fn select_detail(
        &self,
        draft: &mut BlocksDraft,
        index: u8,
        id: VariantId,
    ) -> Result<(), EngineError> {
        let node = draft.node_mut(index).ok_or(EngineError::BlockNotFound(index))?;
        node.select_detail(id)?;
        Ok(())
    }

    fn run_overview_action<F>(
        &mut self,
        draft: &mut BlocksDraft,
        state: &IdeaState,
        index: u8,
        kind: ActionKind,
        generate: F,
    ) -> Result<ActionOutcome, EngineError>
    where
        F: FnOnce(&BlockRequest<'_>, &BlockOverviewVariant, u32) -> Result<BlockOverviewVariant, EngineError>,
    {
        let stage = match kind {
            ActionKind::ExpandOverview => Stage::ExpandOverview,
            _ => Stage::RegenerateOverview,
        };
        let now = self.clock.now_ms();
        let current = selected_overview(draft, index)?.clone();
        if let Err(rejection) = self.gate.admit(index, kind, now, &self.policy) {
            return Ok(ActionOutcome::Blocked(rejection));
        }

        let record = AuditRecord::new(stage, self.mode, now)
            .with_seed(state.seed)
            .with_block(index);
        let spec = draft.spec(index).ok_or(EngineError::BlockNotFound(index))?;
        let result = self.ensure_mock().and_then(|()| {
            let req = BlockRequest {
                index,
                spec,
                state,
                memory: &draft.memory,
                created_at: now,
            };
            // Nonce is the low 32 bits of the clock.
            generate(&req, &current, now as u32)
        });
        self.finish(record, now, &result, |v| v.headline.len());

        let variant = result?;
        let id = variant.id;
        let node = draft.node_mut(index).ok_or(EngineError::BlockNotFound(index))?;
        node.push_overview(variant);
        tracing::debug!(index, action = kind.as_str(), %id, "overview applied");
        Ok(ActionOutcome::Applied(id))
    }

    fn run_detail_action(
        &mut self,
        draft: &mut BlocksDraft,
        state: &IdeaState,
        index: u8,
        preset: Option<ExpandPreset>,
    ) -> Result<ActionOutcome, EngineError> {
        let (kind, stage, range) = match preset {
            Some(_) => (
                ActionKind::ExpandDetail,
                Stage::ExpandDetail,
                self.policy.expand_sentence_range,
            ),
            None => (
                ActionKind::GenerateDetail,
                Stage::BlockDetail,
                self.policy.detail_sentence_range,
            ),
        };
        let now = self.clock.now_ms();
        let overview = selected_overview(draft, index)?.clone();
        if let Err(rejection) = self.gate.admit(index, kind, now, &self.policy) {
            return Ok(ActionOutcome::Blocked(rejection));
        }

        let record = AuditRecord::new(stage, self.mode, now)
            .with_seed(state.seed)
            .with_block(index);
        let spec = draft.spec(index).ok_or(EngineError::BlockNotFound(index))?;
        let result = self.ensure_mock().and_then(|()| {
            let req = BlockRequest {
                index,
                spec,
                state,
                memory: &draft.memory,
                created_at: now,
            };
            Ok(variants::generate_block_detail(&req, &overview, preset, Some(range))?)
        });
        self.finish(record, now, &result, |v| v.beat.len());

        let variant = result?;
        let id = variant.id;
        let cap = self.policy.max_detail_variants_per_block;
        let node = draft.node_mut(index).ok_or(EngineError::BlockNotFound(index))?;
        node.push_detail(variant, cap);
        tracing::debug!(index, action = kind.as_str(), %id, "detail applied");
        Ok(ActionOutcome::Applied(id))
    }

    fn ensure_mock(&self) -> Result<(), EngineError> {
        match self.mode {
            GenerationMode::Mock => Ok(()),
            mode => Err(EngineError::UnsupportedMode(mode)),
        }
    }

    /// Complete an audit record from a stage result and dispatch it.
    fn finish<T>(
        &self,
        record: AuditRecord,
        started: u64,
        result: &Result<T, EngineError>,
        chars: impl FnOnce(&T) -> usize,
    ) {
        let record = record.with_latency(self.clock.now_ms().saturating_sub(started));
        let record = match result {
            Ok(value) => record.succeeded(chars(value)),
            Err(e) => record.failed(e),
        };
        dispatch_best_effort(self.audit.as_ref(), &record);
    }
}

fn selected_overview(draft: &BlocksDraft, index: u8) -> Result<&BlockOverviewVariant, EngineError> {
    let node = draft.node(index).ok_or(EngineError::BlockNotFound(index))?;
    node.selected_overview()
        .ok_or(EngineError::OverviewNotFound(index))
}

impl StoryEngineBuilder {
    pub fn mode(mut self, mode: GenerationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn policy(mut self, policy: DetailPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Load the policy from a RON file (overrides `policy`).
    pub fn policy_file(mut self, path: impl AsRef<Path>) -> Self {
        self.policy_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn catalog(mut self, catalog: OptionCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Load the option catalog from a RON file (overrides `catalog`).
    pub fn catalog_file(mut self, path: impl AsRef<Path>) -> Self {
        self.catalog_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    pub fn audit_sink(mut self, sink: impl AuditSink + 'static) -> Self {
        self.audit = Some(Box::new(sink));
        self
    }

    pub fn build(self) -> Result<StoryEngine, EngineError> {
        let policy = match self.policy_file {
            Some(ref path) => DetailPolicy::load_from_ron(path)?,
            None => {
                let policy = self.policy.unwrap_or_default();
                policy.validate()?;
                policy
            }
        };
        let catalog = match self.catalog_file {
            Some(ref path) => OptionCatalog::load_from_ron(path)?,
            None => {
                let catalog = self.catalog.unwrap_or_default();
                catalog.validate()?;
                catalog
            }
        };

        tracing::debug!(
            mode = self.mode.as_str(),
            cooldown_ms = policy.action_cooldown_ms,
            quota = policy.max_detail_generations_per_session,
            "story engine built"
        );

        Ok(StoryEngine {
            mode: self.mode,
            policy,
            catalog,
            gate: SessionGate::new(),
            clock: self.clock.unwrap_or_else(|| Box::new(SystemClock)),
            audit: self.audit.unwrap_or_else(|| Box::new(NullAuditSink)),
        })
    }
}
