//! WASM bindings for story-outline — drives the outline editor in the browser.
//!
//! Everything crosses the boundary as JSON. The browser has no system
//! clock for Rust to read, so every time-sensitive call takes the host's
//! `Date.now()`.

use std::sync::Arc;
use wasm_bindgen::prelude::*;

use story_outline::core::audit::MemoryAuditLog;
use story_outline::core::pipeline::{ActionOutcome, StoryEngine};
use story_outline::core::policy::DetailPolicy;
use story_outline::core::session::ManualClock;
use story_outline::schema::acts::ActsResult;
use story_outline::schema::blocks::{BlocksDraft, ExpandPreset, VariantId};
use story_outline::schema::idea::{IdeaForm, IdeaResult, RandomizeScope};

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------
fn js_err(context: &str, e: impl std::fmt::Display) -> JsError {
    JsError::new(&format!("{context}: {e}"))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| js_err("Serialization error", e))
}

fn parse_scope(s: &str) -> RandomizeScope {
    match s.to_lowercase().as_str() {
        "world" => RandomizeScope::World,
        "character" => RandomizeScope::Character,
        "plot" => RandomizeScope::Plot,
        "motifs" => RandomizeScope::Motifs,
        _ => RandomizeScope::All,
    }
}

fn parse_preset(s: &str) -> Result<ExpandPreset, JsError> {
    ExpandPreset::parse(s).ok_or_else(|| JsError::new(&format!("Unknown preset: {s}")))
}

fn parse_variant_id(s: &str) -> Result<VariantId, JsError> {
    s.parse::<VariantId>()
        .map_err(|e| js_err("Invalid variant id", e))
}

fn to_ms(now_ms: f64) -> u64 {
    if now_ms.is_finite() && now_ms > 0.0 {
        now_ms as u64
    } else {
        0
    }
}

// ---------------------------------------------------------------------------
// OutlineSession — the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct OutlineSession {
    engine: StoryEngine,
    clock: Arc<ManualClock>,
    audit: Arc<MemoryAuditLog>,
    idea: Option<IdeaResult>,
    chosen: usize,
    acts: Option<ActsResult>,
    draft: Option<BlocksDraft>,
}

#[wasm_bindgen]
impl OutlineSession {
    /// Start a session. `policy_ron` overrides the default policy.
    #[wasm_bindgen(constructor)]
    pub fn new(policy_ron: Option<String>) -> Result<OutlineSession, JsError> {
        let policy = match policy_ron {
            Some(src) => DetailPolicy::parse_ron(&src).map_err(|e| js_err("Policy error", e))?,
            None => DetailPolicy::default(),
        };
        let clock = Arc::new(ManualClock::new(0));
        let audit = Arc::new(MemoryAuditLog::default());
        let engine = StoryEngine::builder()
            .policy(policy)
            .clock(clock.clone())
            .audit_sink(audit.clone())
            .build()
            .map_err(|e| js_err("Engine build error", e))?;

        Ok(OutlineSession {
            engine,
            clock,
            audit,
            idea: None,
            chosen: 0,
            acts: None,
            draft: None,
        })
    }

    /// Return the option catalog as JSON.
    pub fn catalog(&self) -> Result<String, JsError> {
        to_json(self.engine.catalog())
    }

    /// Return the active policy as JSON.
    pub fn policy(&self) -> Result<String, JsError> {
        to_json(self.engine.policy())
    }

    /// Fill part of a form. `scope` is all/world/character/plot/motifs.
    pub fn randomize(&self, form_json: &str, scope: &str) -> Result<String, JsError> {
        let form: IdeaForm =
            serde_json::from_str(form_json).map_err(|e| js_err("Invalid form JSON", e))?;
        to_json(&self.engine.randomize_form(&form, parse_scope(scope)))
    }

    /// Generate two idea candidates from a form. Returns the `IdeaResult`.
    pub fn generate_idea(&mut self, form_json: &str, now_ms: f64) -> Result<String, JsError> {
        let form: IdeaForm =
            serde_json::from_str(form_json).map_err(|e| js_err("Invalid form JSON", e))?;
        self.clock.set(to_ms(now_ms));
        let result = self
            .engine
            .generate_idea(&form, &form.compact(), None)
            .map_err(|e| js_err("Generation error", e))?;
        let json = to_json(&result)?;
        self.idea = Some(result);
        self.acts = None;
        self.draft = None;
        Ok(json)
    }

    /// Build the five acts for candidate 0 or 1.
    pub fn generate_acts(&mut self, candidate: usize, now_ms: f64) -> Result<String, JsError> {
        let idea = self
            .idea
            .as_ref()
            .ok_or_else(|| JsError::new("No idea generated yet"))?;
        let chosen = idea
            .candidates
            .get(candidate)
            .ok_or_else(|| JsError::new(&format!("No candidate {candidate}")))?;
        self.clock.set(to_ms(now_ms));
        let acts = self
            .engine
            .generate_acts(&chosen.logline, &chosen.synopsis, &idea.state)
            .map_err(|e| js_err("Generation error", e))?;
        let json = to_json(&acts)?;
        self.chosen = candidate;
        self.acts = Some(acts);
        Ok(json)
    }

    /// Build the 24-block draft for the chosen candidate.
    pub fn generate_blocks(&mut self, now_ms: f64) -> Result<String, JsError> {
        let idea = self
            .idea
            .as_ref()
            .ok_or_else(|| JsError::new("No idea generated yet"))?;
        let candidate = &idea.candidates[self.chosen.min(1)];
        self.clock.set(to_ms(now_ms));
        let draft = self
            .engine
            .generate_blocks_overview(candidate, &idea.state, self.acts.as_ref())
            .map_err(|e| js_err("Generation error", e))?;
        let json = to_json(&draft)?;
        self.draft = Some(draft);
        Ok(json)
    }

    /// Regenerate a block's overview. Returns the `ActionOutcome` as JSON.
    pub fn regenerate_overview(&mut self, index: u8, now_ms: f64) -> Result<String, JsError> {
        self.block_action(now_ms, |engine, draft, state| {
            engine.regenerate_overview(draft, state, index)
        })
    }

    pub fn expand_overview(&mut self, index: u8, preset: &str, now_ms: f64) -> Result<String, JsError> {
        let preset = parse_preset(preset)?;
        self.block_action(now_ms, |engine, draft, state| {
            engine.expand_overview(draft, state, index, preset)
        })
    }

    pub fn generate_detail(&mut self, index: u8, now_ms: f64) -> Result<String, JsError> {
        self.block_action(now_ms, |engine, draft, state| {
            engine.generate_detail(draft, state, index)
        })
    }

    pub fn expand_detail(&mut self, index: u8, preset: &str, now_ms: f64) -> Result<String, JsError> {
        let preset = parse_preset(preset)?;
        self.block_action(now_ms, |engine, draft, state| {
            engine.expand_detail(draft, state, index, preset)
        })
    }

    pub fn select_overview(&mut self, index: u8, variant_id: &str) -> Result<(), JsError> {
        let id = parse_variant_id(variant_id)?;
        let draft = self
            .draft
            .as_mut()
            .ok_or_else(|| JsError::new("No blocks generated yet"))?;
        self.engine
            .select_overview(draft, index, id)
            .map_err(|e| js_err("Selection error", e))
    }

    pub fn select_detail(&mut self, index: u8, variant_id: &str) -> Result<(), JsError> {
        let id = parse_variant_id(variant_id)?;
        let draft = self
            .draft
            .as_mut()
            .ok_or_else(|| JsError::new("No blocks generated yet"))?;
        self.engine
            .select_detail(draft, index, id)
            .map_err(|e| js_err("Selection error", e))
    }

    /// Return the current block for `index` as JSON.
    pub fn block(&self, index: u8) -> Result<String, JsError> {
        let node = self
            .draft
            .as_ref()
            .and_then(|d| d.node(index))
            .ok_or_else(|| JsError::new(&format!("No block {index}")))?;
        to_json(node)
    }

    pub fn detail_gen_count(&self) -> u32 {
        self.engine.detail_gen_count()
    }

    pub fn can_generate_detail(&self) -> bool {
        self.engine.can_generate_detail()
    }

    pub fn is_cooling_down(&self, index: u8, now_ms: f64) -> bool {
        self.clock.set(to_ms(now_ms));
        self.engine.is_cooling_down(index)
    }

    /// Return the recent generation records as a JSON array.
    pub fn audit_log(&self) -> Result<String, JsError> {
        to_json(&self.audit.snapshot())
    }

    /// Return JSON array of expand preset names.
    pub fn presets() -> String {
        let names: Vec<&str> = ExpandPreset::ALL.iter().map(|p| p.as_str()).collect();
        serde_json::to_string(&names).unwrap_or_else(|_| "[]".to_string())
    }
}

// Private helpers
impl OutlineSession {
    fn block_action<F>(&mut self, now_ms: f64, action: F) -> Result<String, JsError>
    where
        F: FnOnce(
            &mut StoryEngine,
            &mut BlocksDraft,
            &story_outline::schema::idea::IdeaState,
        ) -> Result<ActionOutcome, story_outline::core::pipeline::EngineError>,
    {
        let state = &self
            .idea
            .as_ref()
            .ok_or_else(|| JsError::new("No idea generated yet"))?
            .state;
        let draft = self
            .draft
            .as_mut()
            .ok_or_else(|| JsError::new("No blocks generated yet"))?;
        self.clock.set(to_ms(now_ms));
        let outcome = action(&mut self.engine, draft, state).map_err(|e| js_err("Action error", e))?;
        to_json(&outcome)
    }
}
