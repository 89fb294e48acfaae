/// Block variant engine: regenerate/expand overviews, generate/expand
/// details, and the retention rules for a block's variant history.

use thiserror::Error;

use crate::core::acts::tone_slots;
use crate::core::blocks::{draw_headline, draw_hooks};
use crate::core::policy::SentenceRange;
use crate::core::rng::{pick, SeededRng};
use crate::core::template::{render, TemplateError};
use crate::schema::blocks::{
    BlockDetailVariant, BlockNode, BlockOverviewVariant, BlockSpec, BlocksMemory, ExpandPreset,
    VariantId, VariantSource,
};
use crate::schema::idea::IdeaState;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VariantError {
    #[error("block {index} has no variant {id}")]
    NotFound { index: u8, id: VariantId },
}

/// Everything a variant operation needs to know about its block.
#[derive(Debug, Clone, Copy)]
pub struct BlockRequest<'a> {
    pub index: u8,
    pub spec: &'a BlockSpec,
    pub state: &'a IdeaState,
    pub memory: &'a BlocksMemory,
    /// Timestamp stamped on the produced variant, in milliseconds.
    pub created_at: u64,
}

impl BlockRequest<'_> {
    /// `seed + index`, wrapping.
    fn block_seed(&self) -> u32 {
        self.state.seed.wrapping_add(u32::from(self.index))
    }
}

/// Anything with a variant id.
pub trait Identified {
    fn variant_id(&self) -> VariantId;
}

impl Identified for BlockOverviewVariant {
    fn variant_id(&self) -> VariantId {
        self.id
    }
}

impl Identified for BlockDetailVariant {
    fn variant_id(&self) -> VariantId {
        self.id
    }
}

// ---------------------------------------------------------------------------
// Overview operations
// ---------------------------------------------------------------------------

/// A fresh overview drawn with the initial-draft machinery, seeded by
/// `seed + index + nonce` so consecutive calls differ.
pub fn regenerate_overview(
    req: &BlockRequest<'_>,
    nonce: u32,
) -> Result<BlockOverviewVariant, TemplateError> {
    let mut rng = SeededRng::new(req.block_seed().wrapping_add(nonce));
    let headline = draw_headline(req.spec, req.state.tone, &mut rng)?;
    let hooks = draw_hooks(&mut rng);

    Ok(BlockOverviewVariant {
        id: VariantId::new(),
        created_at: req.created_at,
        source: VariantSource::Regenerate,
        headline,
        hooks,
        stakes: None,
        tags: None,
        note: None,
    })
}

/// Rework the current overview through a preset.
pub fn expand_overview(
    req: &BlockRequest<'_>,
    current: &BlockOverviewVariant,
    preset: ExpandPreset,
    nonce: u32,
) -> BlockOverviewVariant {
    let mut rng = SeededRng::new(req.block_seed().wrapping_add(nonce));
    let connectives = headline_connectives(preset);
    let connective = pick(connectives, &mut rng).copied().unwrap_or(connectives[0]);
    let suffix = hook_suffix(preset);

    BlockOverviewVariant {
        id: VariantId::new(),
        created_at: req.created_at,
        source: VariantSource::Expand,
        headline: format!("{}{}", connective, current.headline.to_lowercase()),
        hooks: current
            .hooks
            .iter()
            .map(|hook| format!("{}{}", hook, suffix))
            .collect(),
        stakes: current.stakes.clone(),
        tags: current.tags.clone(),
        note: Some(preset.description().to_string()),
    }
}

fn headline_connectives(preset: ExpandPreset) -> &'static [&'static str] {
    match preset {
        ExpandPreset::MoreSpecific => &[
            "With an exact time and place named, ",
            "With finer detail filled in, ",
        ],
        ExpandPreset::RaiseStakes => &["As the danger doubles, ", "As the clock starts running out, "],
        ExpandPreset::AddEmotion => &["As strong emotion erupts, ", "As the inner conflict deepens, "],
        ExpandPreset::AddTwist => &[
            "As an unexpected reversal strikes, ",
            "As a hidden truth is overturned, ",
        ],
        ExpandPreset::AddDialogue => &[
            "As crucial words are exchanged, ",
            "As a decisive line is spoken, ",
        ],
    }
}

fn hook_suffix(preset: ExpandPreset) -> &'static str {
    match preset {
        ExpandPreset::MoreSpecific => " (with concrete circumstances)",
        ExpandPreset::RaiseStakes => " (greater danger ahead)",
        ExpandPreset::AddEmotion => " (stronger emotional impact)",
        ExpandPreset::AddTwist => " (twist added)",
        ExpandPreset::AddDialogue => " (with dialogue)",
    }
}

// ---------------------------------------------------------------------------
// Detail operations
// ---------------------------------------------------------------------------

const BEATS: &[&str] = &[
    "{purpose} The protagonist is placed in a {conflict} situation. Relationships with those nearby shift and new information comes to light. Along the way {emotion} feelings cross. The protagonist's choice sets the direction of the next event.",
    "In this scene, {purpose_lower} A {emotion} mood dominates and the protagonist struggles inwardly. Outer events and inner change happen together, and the story moves to its next stage.",
    "A {conflict} event unfolds as {purpose_lower} The true faces of the protagonist and those around them come out. Tension rises and foreshadowing for the next block is laid.",
];

fn preset_sentences(preset: ExpandPreset) -> &'static [&'static str] {
    match preset {
        ExpandPreset::MoreSpecific => &[
            "Specifically, the conversation takes place by a third-floor window of an old brick building. It is 4:32 in the afternoon and the sunlight slants in.",
            "The exact place is an abandoned factory district on the edge of the city. Rusted iron gates and broken windows set the mood.",
        ],
        ExpandPreset::RaiseStakes => &[
            "But only 48 hours remain. Failure means losing everything.",
            "And the price of this choice is far greater than expected. Consequences that cannot be undone are waiting.",
        ],
        ExpandPreset::AddEmotion => &[
            "The protagonist's hands tremble. Anger, fear and hope tangle into one overwhelming feeling.",
            "The feeling rising from deep inside cannot be held back. Tears well up, but the protagonist holds them in.",
        ],
        ExpandPreset::AddTwist => &[
            "Then, in that instant, an unexpected fact comes out. The information they trusted was a lie.",
            "But the situation flips. The person they took for an enemy was an ally all along.",
        ],
        ExpandPreset::AddDialogue => &[
            "\"There is nowhere left to run.\" A low, firm voice rings out.",
            "\"Do you really think this is the best we can do?\" the protagonist asks. No answer comes.",
        ],
    }
}

/// Produce a detail beat for a block, optionally expanded by a preset.
///
/// Seeded by `seed + index`. `sentence_range` is a length hint for
/// backends that honour it; the template generator does not.
pub fn generate_block_detail(
    req: &BlockRequest<'_>,
    overview: &BlockOverviewVariant,
    preset: Option<ExpandPreset>,
    sentence_range: Option<SentenceRange>,
) -> Result<BlockDetailVariant, TemplateError> {
    let mut rng = SeededRng::new(req.block_seed());
    let slots = tone_slots(req.state.tone.modifiers())
        .with("purpose", req.spec.purpose)
        .with("purpose_lower", req.spec.purpose.to_lowercase());

    let template = pick(BEATS, &mut rng).copied().unwrap_or(BEATS[0]);
    let mut beat = render(template, &slots)?;
    if let Some(preset) = preset {
        let sentences = preset_sentences(preset);
        let addition = pick(sentences, &mut rng).copied().unwrap_or(sentences[0]);
        beat.push(' ');
        beat.push_str(addition);
    }

    let take = rng.index(2) + 1;
    let micro_hooks = overview.hooks.iter().take(take).cloned().collect();

    if let Some(range) = sentence_range {
        tracing::debug!(index = req.index, min = range.min, max = range.max, "detail length hint");
    }

    Ok(BlockDetailVariant {
        id: VariantId::new(),
        created_at: req.created_at,
        source: if preset.is_some() {
            VariantSource::Expand
        } else {
            VariantSource::Initial
        },
        beat,
        micro_hooks: Some(micro_hooks),
        preset,
    })
}

// ---------------------------------------------------------------------------
// Retention
// ---------------------------------------------------------------------------

/// Make room for one more variant under `cap`.
///
/// Returns the survivors. When `selected` names a variant in the list it
/// is never dropped (unless `cap` is 1 and nothing else can go): the
/// oldest unselected variants are evicted and the selected one moves to
/// the front, followed by the rest in their original order. Without a
/// selection the oldest variants go first. A list already below `cap` is
/// returned untouched.
pub fn evict<T: Identified>(mut variants: Vec<T>, selected: Option<VariantId>, cap: usize) -> Vec<T> {
    let room = cap.max(1) - 1;
    if variants.len() <= room {
        return variants;
    }

    let protected = selected.and_then(|id| variants.iter().position(|v| v.variant_id() == id));
    match protected {
        Some(pos) if room > 0 => {
            let keep = variants.remove(pos);
            let excess = variants.len() - (room - 1);
            variants.drain(..excess);
            let mut survivors = Vec::with_capacity(room);
            survivors.push(keep);
            survivors.extend(variants);
            survivors
        }
        Some(_) => Vec::new(),
        None => {
            let excess = variants.len() - room;
            variants.drain(..excess);
            variants
        }
    }
}

impl BlockNode {
    /// Append an overview and select it. Overviews are never evicted.
    pub fn push_overview(&mut self, variant: BlockOverviewVariant) {
        self.selected_overview_id = variant.id;
        self.overview_variants.push(variant);
    }

    /// Append a detail under `cap`, evicting per [`evict`], and select it.
    pub fn push_detail(&mut self, variant: BlockDetailVariant, cap: usize) {
        let existing = std::mem::take(&mut self.detail_variants);
        self.detail_variants = evict(existing, self.selected_detail_id, cap);
        self.selected_detail_id = Some(variant.id);
        self.detail_variants.push(variant);
    }

    pub fn select_overview(&mut self, id: VariantId) -> Result<(), VariantError> {
        if !self.overview_variants.iter().any(|v| v.id == id) {
            return Err(VariantError::NotFound { index: self.index, id });
        }
        self.selected_overview_id = id;
        Ok(())
    }

    pub fn select_detail(&mut self, id: VariantId) -> Result<(), VariantError> {
        if !self.detail_variants.iter().any(|v| v.id == id) {
            return Err(VariantError::NotFound { index: self.index, id });
        }
        self.selected_detail_id = Some(id);
        Ok(())
    }
}
