/// Initial 24-block draft: one overview per block, built in index order.

use std::collections::BTreeMap;

use crate::core::acts::tone_slots;
use crate::core::rng::{pick, SeededRng};
use crate::core::template::{render, TemplateError};
use crate::schema::acts::ActsResult;
use crate::schema::block_specs::BLOCK_SPECS;
use crate::schema::blocks::{
    BlockNode, BlockOverviewVariant, BlockSpec, BlocksDraft, BlocksMemory, VariantId, VariantSource,
};
use crate::schema::idea::{IdeaCandidate, IdeaState, Tone};

const ACT_ONE_HEADLINES: &[&str] = &[
    "{title}: The protagonist's everyday life is shaken by a {conflict} event.",
    "{title}: Signs of change appear in a {emotion} atmosphere.",
    "{title}: A crack opens in the ordinary world and the story begins.",
];

const ACT_TWO_HEADLINES: &[&str] = &[
    "{title}: The protagonist faces a {conflict} challenge.",
    "{title}: A new obstacle appears and the conflict deepens.",
    "{title}: In a {emotion} situation, the moment of choice draws near.",
];

const ACT_THREE_HEADLINES: &[&str] = &[
    "{title}: A {conflict} crisis reaches its peak.",
    "{title}: Just as everything seems to fall apart, the protagonist faces the truth.",
    "{title}: The confrontation escalates to a point of no return.",
];

const ACT_FOUR_HEADLINES: &[&str] = &[
    "{title}: The final showdown unfolds {ending}.",
    "{title}: Every conflict converges as the story heads for its ending.",
    "{title}: The story closes with a {emotion} afterglow.",
];

pub(crate) const HOOKS: &[&str] = &[
    "An unexpected character appears",
    "Part of a hidden truth comes out",
    "The seed of a new conflict is planted",
    "A relationship begins to crack",
    "The fallout of an important choice surfaces",
];

const GOAL_PLACEHOLDER: &str = "the journey toward the goal";
const CONFLICT_PLACEHOLDER: &str = "the central conflict and opposing forces";
const B_STORY_PLACEHOLDER: &str = "a growing relationship";

pub(crate) fn headline_templates(act: u8) -> &'static [&'static str] {
    match act {
        1 => ACT_ONE_HEADLINES,
        2 => ACT_TWO_HEADLINES,
        3 => ACT_THREE_HEADLINES,
        _ => ACT_FOUR_HEADLINES,
    }
}

/// One headline draw from the block's act bucket.
pub(crate) fn draw_headline(
    spec: &BlockSpec,
    tone: Tone,
    rng: &mut SeededRng,
) -> Result<String, TemplateError> {
    let pool = headline_templates(spec.act);
    let template = pick(pool, rng).copied().unwrap_or(pool[0]);
    let slots = tone_slots(tone.modifiers()).with("title", spec.title);
    render(template, &slots)
}

/// One or two hooks, each an independent draw from the hook pool.
pub(crate) fn draw_hooks(rng: &mut SeededRng) -> Vec<String> {
    let count = rng.index(2) + 1;
    (0..count)
        .filter_map(|_| pick(HOOKS, rng))
        .map(|hook| hook.to_string())
        .collect()
}

/// Build the initial draft for a chosen candidate.
///
/// Every block gets a single `initial` overview. Text is a function of
/// the inputs alone; `created_at` stamps each variant and ids are fresh.
pub fn generate_blocks_overview(
    candidate: &IdeaCandidate,
    state: &IdeaState,
    acts: Option<&ActsResult>,
    created_at: u64,
) -> Result<BlocksDraft, TemplateError> {
    let mut rng = SeededRng::new(state.seed);
    let mut memory = initial_memory(acts.is_some());
    let mut blocks_by_index = BTreeMap::new();

    for spec in BLOCK_SPECS.iter() {
        let headline = draw_headline(spec, state.tone, &mut rng)?;
        let hooks = draw_hooks(&mut rng);
        memory.last_hooks = hooks.clone();

        let overview = BlockOverviewVariant {
            id: VariantId::new(),
            created_at,
            source: VariantSource::Initial,
            headline,
            hooks,
            stakes: None,
            tags: None,
            note: None,
        };
        blocks_by_index.insert(spec.index, BlockNode::new(spec.index, overview));
    }

    tracing::debug!(
        seed = state.seed,
        logline = %candidate.logline,
        blocks = blocks_by_index.len(),
        "generated block overviews"
    );

    Ok(BlocksDraft {
        specs: &BLOCK_SPECS,
        blocks_by_index,
        memory,
    })
}

/// Goal and conflict are fixed phrases; extraction quality is not a goal,
/// only that both are filled.
fn initial_memory(has_acts: bool) -> BlocksMemory {
    BlocksMemory {
        protagonist_goal: GOAL_PLACEHOLDER.to_string(),
        central_conflict: CONFLICT_PLACEHOLDER.to_string(),
        b_story: has_acts.then(|| B_STORY_PLACEHOLDER.to_string()),
        progress_flags: Vec::new(),
        last_hooks: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::acts::generate_acts;
    use crate::core::template::Template;
    use crate::schema::block_specs::BLOCK_COUNT;

    fn candidate() -> IdeaCandidate {
        IdeaCandidate {
            logline: "A logline.".to_string(),
            synopsis: "A synopsis.".to_string(),
            tags: vec![],
        }
    }

    fn headlines(draft: &BlocksDraft) -> Vec<String> {
        draft
            .blocks_by_index
            .values()
            .map(|n| n.overview_variants[0].headline.clone())
            .collect()
    }

    #[test]
    fn headline_templates_use_known_slots() {
        for act in 1..=4 {
            for source in headline_templates(act) {
                let template = Template::parse(source).unwrap();
                for name in template.slot_names() {
                    assert!(["title", "conflict", "emotion", "ending"].contains(&name));
                }
            }
        }
    }

    #[test]
    fn all_blocks_have_one_initial_overview() {
        let state = IdeaState::new(12345, Tone::Hard);
        let draft = generate_blocks_overview(&candidate(), &state, None, 1_000).unwrap();
        let keys: Vec<u8> = draft.blocks_by_index.keys().copied().collect();
        assert_eq!(keys, (1..=BLOCK_COUNT as u8).collect::<Vec<_>>());
        for (index, node) in &draft.blocks_by_index {
            assert_eq!(node.index, *index);
            assert_eq!(node.overview_variants.len(), 1);
            let overview = &node.overview_variants[0];
            assert_eq!(node.selected_overview_id, overview.id);
            assert_eq!(overview.source, VariantSource::Initial);
            assert_eq!(overview.created_at, 1_000);
            assert!((1..=2).contains(&overview.hooks.len()));
            let title = draft.spec(*index).unwrap().title;
            assert!(overview.headline.starts_with(title));
            assert!(node.detail_variants.is_empty());
            assert!(node.selected_detail_id.is_none());
        }
        assert_eq!(draft.specs.len(), BLOCK_COUNT);
    }

    #[test]
    fn text_is_reproducible_ids_are_not() {
        let state = IdeaState::new(777, Tone::Light);
        let a = generate_blocks_overview(&candidate(), &state, None, 1).unwrap();
        let b = generate_blocks_overview(&candidate(), &state, None, 2).unwrap();
        assert_eq!(headlines(&a), headlines(&b));
        assert_ne!(
            a.blocks_by_index[&1].selected_overview_id,
            b.blocks_by_index[&1].selected_overview_id
        );
    }

    #[test]
    fn memory_tracks_last_block_hooks() {
        let state = IdeaState::new(9, Tone::Bleak);
        let draft = generate_blocks_overview(&candidate(), &state, None, 0).unwrap();
        assert_eq!(draft.memory.last_hooks, draft.blocks_by_index[&24].overview_variants[0].hooks);
        assert!(!draft.memory.protagonist_goal.is_empty());
        assert!(!draft.memory.central_conflict.is_empty());
        assert!(draft.memory.b_story.is_none());
    }

    #[test]
    fn b_story_only_with_acts() {
        let state = IdeaState::new(9, Tone::Bleak);
        let acts = generate_acts("l", "s", &state).unwrap();
        let draft = generate_blocks_overview(&candidate(), &state, Some(&acts), 0).unwrap();
        assert!(draft.memory.b_story.is_some());
    }
}
