/// Idea generation — two candidate loglines/synopses from a form and a seed.

use rustc_hash::FxHashSet;
use std::collections::BTreeMap;

use crate::core::rng::{generate_seed, pick, shuffle, weighted_random, SeededRng};
use crate::core::template::{render, Slots, TemplateError};
use crate::schema::idea::{IdeaCandidate, IdeaForm, IdeaResult, IdeaState, RandomizeScope, Tone};
use crate::schema::options::{GroupSection, OptionCatalog};

/// Maximum number of tags handed to each candidate.
pub const MAX_CANDIDATE_TAGS: usize = 8;
/// How many ranked motifs contribute their label to the tag pool.
const TAGGED_MOTIFS: usize = 3;
/// How many motifs a random fill ranks.
const RANDOM_MOTIFS: usize = 5;

/// Narrative focus of a candidate. The two candidates never share a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Goal,
    Relationship,
}

pub(crate) const GOAL_LOGLINES: &[&str] = &[
    "In a {world_setting} world, {protagonist} fights against {conflict} for the sake of {motif}.",
    "Against a {world_setting} backdrop the size of a {scale}, the pursuit of {motif} by {protagonist} sparks an unexpected clash of {conflict}.",
    "The moment {protagonist} faces the truth of {motif} in a {world_setting} world, {conflict} shakes everything.",
];

pub(crate) const RELATIONSHIP_LOGLINES: &[&str] = &[
    "Bound together as {relationship}, {protagonist} is drawn into a struggle of {conflict} over {motif} in a {world_setting} world.",
    "Across a {world_setting} {scale}, people who were once {relationship} confront {conflict} because of a secret surrounding {motif}.",
    "The rift between {protagonist} and their {relationship} tests the true meaning of {motif} against a {world_setting} backdrop.",
];

const SYNOPSIS_OPENING: &str = "In a {world_setting} world, {protagonist} lives an ordinary life.";
const SYNOPSIS_INCITING_GOAL: &str = "One day, an unforeseen event tied to {motif} upends everything.";
const SYNOPSIS_INCITING_RELATIONSHIP: &str =
    "A meeting with people who were once {relationship} exposes a secret surrounding {motif}.";
const SYNOPSIS_GOAL: &str =
    "Determined to uncover the truth of {motif}, {protagonist} sets out on a journey across the entire {scale}.";
const SYNOPSIS_CONFLICT: &str = "But {conflict} blocks the way and forces an unexpected choice.";
const SYNOPSIS_REVEAL: &str =
    "As a hidden truth surfaces, it becomes clear that {motif} means something entirely different than first believed.";
const SYNOPSIS_ESCALATION: &str =
    "Trust among {relationship} begins to crack, and {protagonist} faces the decisive moment alone.";
const SYNOPSIS_CLOSING_LIGHT: &str =
    "Holding on to hope, they prepare one last attempt with everything on the line.";
const SYNOPSIS_CLOSING_HARD: &str = "The price is steep, but {protagonist} reaches a point of no return.";
const SYNOPSIS_CLOSING_BLEAK: &str =
    "Having already made an irreversible choice, they stare down a fate racing toward ruin.";

/// Every template used by this module, for validation.
pub(crate) fn all_templates() -> Vec<&'static str> {
    let mut all: Vec<&'static str> = Vec::new();
    all.extend_from_slice(GOAL_LOGLINES);
    all.extend_from_slice(RELATIONSHIP_LOGLINES);
    all.extend_from_slice(&[
        SYNOPSIS_OPENING,
        SYNOPSIS_INCITING_GOAL,
        SYNOPSIS_INCITING_RELATIONSHIP,
        SYNOPSIS_GOAL,
        SYNOPSIS_CONFLICT,
        SYNOPSIS_REVEAL,
        SYNOPSIS_ESCALATION,
        SYNOPSIS_CLOSING_LIGHT,
        SYNOPSIS_CLOSING_HARD,
        SYNOPSIS_CLOSING_BLEAK,
    ]);
    all
}

/// Slot names every idea template may reference.
pub(crate) const IDEA_SLOTS: &[&str] = &[
    "world_setting",
    "protagonist",
    "conflict",
    "motif",
    "scale",
    "relationship",
];

/// Generate two idea candidates and the state carried forward.
///
/// The seed is `seed`, else `form.seed`, else a freshly generated one.
/// Identical input (seed included) always yields identical output.
pub fn generate_idea(
    form: &IdeaForm,
    catalog: &OptionCatalog,
    seed: Option<u32>,
) -> Result<IdeaResult, TemplateError> {
    let seed = seed.or(form.seed).unwrap_or_else(generate_seed);
    let mut rng = SeededRng::new(seed);

    let state = build_state(form, catalog, seed);
    let tags = build_tag_pool(form, catalog);
    let slots = build_slots(form, catalog);

    let first = generate_candidate(Focus::Goal, &slots, form.tone, &tags, &mut rng)?;
    let second = generate_candidate(Focus::Relationship, &slots, form.tone, &tags, &mut rng)?;

    tracing::debug!(seed, tone = form.tone.as_str(), tags = tags.len(), "generated idea candidates");

    Ok(IdeaResult {
        candidates: [first, second],
        state,
    })
}

fn generate_candidate(
    focus: Focus,
    slots: &Slots,
    tone: Tone,
    tags: &[String],
    rng: &mut SeededRng,
) -> Result<IdeaCandidate, TemplateError> {
    let logline = generate_logline(focus, slots, rng)?;
    let synopsis = generate_synopsis(focus, slots, tone, rng)?;
    let mut tags = shuffle(tags, rng);
    tags.truncate(MAX_CANDIDATE_TAGS);
    Ok(IdeaCandidate {
        logline,
        synopsis,
        tags,
    })
}

fn generate_logline(focus: Focus, slots: &Slots, rng: &mut SeededRng) -> Result<String, TemplateError> {
    let pool = match focus {
        Focus::Goal => GOAL_LOGLINES,
        Focus::Relationship => RELATIONSHIP_LOGLINES,
    };
    let template = pick(pool, rng).copied().unwrap_or(pool[0]);
    render(template, slots)
}

/// Six fixed sentence slots; only the reveal/escalation slot draws.
fn generate_synopsis(
    focus: Focus,
    slots: &Slots,
    tone: Tone,
    rng: &mut SeededRng,
) -> Result<String, TemplateError> {
    let inciting = match focus {
        Focus::Goal => SYNOPSIS_INCITING_GOAL,
        Focus::Relationship => SYNOPSIS_INCITING_RELATIONSHIP,
    };
    let turn = if rng.next_f64() > 0.5 {
        SYNOPSIS_REVEAL
    } else {
        SYNOPSIS_ESCALATION
    };
    let closing = match tone {
        Tone::Light => SYNOPSIS_CLOSING_LIGHT,
        Tone::Hard => SYNOPSIS_CLOSING_HARD,
        Tone::Bleak => SYNOPSIS_CLOSING_BLEAK,
    };

    let sentences = [
        SYNOPSIS_OPENING,
        inciting,
        SYNOPSIS_GOAL,
        SYNOPSIS_CONFLICT,
        turn,
        closing,
    ];
    let rendered = sentences
        .iter()
        .map(|s| render(s, slots))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rendered.join(" "))
}

fn build_state(form: &IdeaForm, catalog: &OptionCatalog, seed: u32) -> IdeaState {
    let mut world = BTreeMap::new();
    let mut character = BTreeMap::new();
    let mut plot = BTreeMap::new();

    for (section, group) in catalog.groups() {
        let Some(value) = form.selection(&group.id) else {
            continue;
        };
        let target = match section {
            GroupSection::World => &mut world,
            GroupSection::Character => &mut character,
            GroupSection::Plot => &mut plot,
        };
        target.insert(group.id.clone(), value.to_string());
    }

    let non_empty = |map: BTreeMap<String, String>| (!map.is_empty()).then_some(map);

    IdeaState {
        seed,
        tone: form.tone,
        realism: Some(form.realism),
        world: non_empty(world),
        character: non_empty(character),
        plot: non_empty(plot),
        motifs_ranked: (!form.motifs_ranked.is_empty()).then(|| form.motifs_ranked.clone()),
    }
}

/// Tone, every selected option's label and hint tags, then the labels of
/// the top ranked motifs. Deduplicated, first occurrence wins.
fn build_tag_pool(form: &IdeaForm, catalog: &OptionCatalog) -> Vec<String> {
    let mut raw: Vec<&str> = vec![form.tone.as_str()];

    for (_, group) in catalog.groups() {
        let Some(choice) = form.selection(&group.id).and_then(|key| group.find(key)) else {
            continue;
        };
        raw.push(&choice.label);
        raw.extend(choice.tags.iter().map(String::as_str));
    }

    for key in form.motifs_ranked.iter().take(TAGGED_MOTIFS) {
        if let Some(motif) = catalog.motif(key) {
            raw.push(&motif.label);
        }
    }

    let mut seen = FxHashSet::default();
    raw.into_iter()
        .filter(|tag| seen.insert(*tag))
        .map(str::to_string)
        .collect()
}

fn build_slots(form: &IdeaForm, catalog: &OptionCatalog) -> Slots {
    let label = |group_id: &str, fallback: &str| -> String {
        form.selection(group_id)
            .and_then(|key| catalog.choice(group_id, key))
            .map(|choice| choice.label.clone())
            .unwrap_or_else(|| fallback.to_string())
    };
    let motif = form
        .motifs_ranked
        .first()
        .and_then(|key| catalog.motif(key))
        .map(|m| m.label.clone())
        .unwrap_or_else(|| "identity".to_string());

    Slots::new()
        .with("world_setting", label("world_setting", "Modern"))
        .with("protagonist", label("character_protagonist", "an ordinary person"))
        .with("conflict", label("plot_conflict", "person versus self"))
        .with("motif", motif)
        .with("scale", label("world_scale", "city"))
        .with("relationship", label("character_relationship", "strangers"))
}

/// Fill part of a form from the catalog with a seeded weighted draw.
///
/// The seed is taken from the form or generated, and written back so the
/// same fill can be reproduced.
pub fn randomize_form(form: &IdeaForm, catalog: &OptionCatalog, scope: RandomizeScope) -> IdeaForm {
    let seed = form.seed.unwrap_or_else(generate_seed);
    let mut rng = SeededRng::new(seed);
    let mut next = form.clone();
    next.seed = Some(seed);

    for (section, group) in catalog.groups() {
        let in_scope = match (scope, section) {
            (RandomizeScope::All, _) => true,
            (RandomizeScope::World, GroupSection::World) => true,
            (RandomizeScope::Character, GroupSection::Character) => true,
            (RandomizeScope::Plot, GroupSection::Plot) => true,
            _ => false,
        };
        if !in_scope {
            continue;
        }
        if let Some(choice) = weighted_random(&group.options, &mut rng) {
            next.selections.insert(group.id.clone(), choice.key.clone());
        }
    }

    if matches!(scope, RandomizeScope::All | RandomizeScope::Motifs) {
        next.motifs_ranked = shuffle(&catalog.motifs.options, &mut rng)
            .into_iter()
            .take(RANDOM_MOTIFS)
            .map(|m| m.key)
            .collect();
    }

    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::template::Template;

    fn scifi_form() -> IdeaForm {
        IdeaForm::new(Tone::Hard)
            .with_seed(12345)
            .select("world_setting", "scifi")
    }

    #[test]
    fn templates_reference_known_slots() {
        for source in all_templates() {
            let template = Template::parse(source).unwrap();
            for name in template.slot_names() {
                assert!(IDEA_SLOTS.contains(&name), "unknown slot {} in {}", name, source);
            }
        }
    }

    #[test]
    fn logline_pools_are_disjoint() {
        for t in GOAL_LOGLINES {
            assert!(!RELATIONSHIP_LOGLINES.contains(t));
        }
    }

    #[test]
    fn generates_two_candidates() {
        let catalog = OptionCatalog::builtin();
        let result = generate_idea(&scifi_form(), &catalog, None).unwrap();
        assert_eq!(result.candidates.len(), 2);
        assert_eq!(result.state.seed, 12345);
        for candidate in &result.candidates {
            assert!(!candidate.logline.is_empty());
            assert!(candidate.tags.len() <= MAX_CANDIDATE_TAGS);
        }
    }

    #[test]
    fn explicit_seed_overrides_form_seed() {
        let catalog = OptionCatalog::builtin();
        let result = generate_idea(&scifi_form(), &catalog, Some(7)).unwrap();
        assert_eq!(result.state.seed, 7);
    }

    #[test]
    fn missing_seed_is_generated() {
        let catalog = OptionCatalog::builtin();
        let form = IdeaForm::new(Tone::Light);
        let result = generate_idea(&form, &catalog, None).unwrap();
        assert_eq!(result.candidates.len(), 2);
        assert!(result.state.seed < i32::MAX as u32);
    }

    #[test]
    fn candidates_use_their_own_pools() {
        let catalog = OptionCatalog::builtin();
        for seed in 0..20 {
            let result = generate_idea(&scifi_form(), &catalog, Some(seed)).unwrap();
            let slots = build_slots(&scifi_form(), &catalog);
            let goal: Vec<String> = GOAL_LOGLINES
                .iter()
                .map(|t| render(t, &slots).unwrap())
                .collect();
            let rel: Vec<String> = RELATIONSHIP_LOGLINES
                .iter()
                .map(|t| render(t, &slots).unwrap())
                .collect();
            assert!(goal.contains(&result.candidates[0].logline));
            assert!(rel.contains(&result.candidates[1].logline));
        }
    }

    #[test]
    fn state_splits_selections_by_section() {
        let catalog = OptionCatalog::builtin();
        let form = IdeaForm::new(Tone::Bleak)
            .with_seed(1)
            .select("world_setting", "fantasy")
            .select("character_relationship", "rivals")
            .with_motifs(&["revenge", "love"]);
        let state = generate_idea(&form, &catalog, None).unwrap().state;
        assert_eq!(state.world.unwrap()["world_setting"], "fantasy");
        assert_eq!(state.character.unwrap()["character_relationship"], "rivals");
        assert!(state.plot.is_none());
        assert_eq!(state.motifs_ranked.unwrap(), vec!["revenge", "love"]);
        assert_eq!(state.realism, Some(50));
    }

    #[test]
    fn tag_pool_is_deduplicated_in_order() {
        let catalog = OptionCatalog::builtin();
        let form = IdeaForm::new(Tone::Hard)
            .select("world_setting", "fantasy")
            .select("world_era", "medieval")
            .with_motifs(&["revenge", "love", "power", "survival"]);
        let pool = build_tag_pool(&form, &catalog);
        assert_eq!(pool[0], "hard");
        assert_eq!(pool.iter().filter(|t| *t == "Medieval").count(), 1);
        assert!(pool.contains(&"revenge".to_string()));
        assert!(pool.contains(&"power".to_string()));
        assert!(!pool.contains(&"survival".to_string()));
        let unique: FxHashSet<&String> = pool.iter().collect();
        assert_eq!(unique.len(), pool.len());
    }

    #[test]
    fn unselected_groups_fall_back() {
        let catalog = OptionCatalog::builtin();
        let slots = build_slots(&IdeaForm::default(), &catalog);
        assert_eq!(slots.get("world_setting"), Some("Modern"));
        assert_eq!(slots.get("motif"), Some("identity"));
        assert_eq!(slots.get("relationship"), Some("strangers"));
    }

    #[test]
    fn randomize_all_fills_every_group() {
        let catalog = OptionCatalog::builtin();
        let form = IdeaForm::new(Tone::Light).with_seed(99);
        let filled = randomize_form(&form, &catalog, RandomizeScope::All);
        assert_eq!(filled.seed, Some(99));
        assert_eq!(filled.selections.len(), 9);
        assert_eq!(filled.motifs_ranked.len(), 5);
        for (group_id, key) in &filled.selections {
            assert!(catalog.choice(group_id, key).is_some());
        }
        assert_eq!(filled, randomize_form(&form, &catalog, RandomizeScope::All));
    }

    #[test]
    fn randomize_scope_only_touches_its_section() {
        let catalog = OptionCatalog::builtin();
        let form = IdeaForm::new(Tone::Light).with_seed(5);
        let filled = randomize_form(&form, &catalog, RandomizeScope::Plot);
        assert_eq!(filled.selections.len(), 3);
        assert!(filled.selections.keys().all(|k| k.starts_with("plot_")));
        assert!(filled.motifs_ranked.is_empty());

        let motifs = randomize_form(&form, &catalog, RandomizeScope::Motifs);
        assert!(motifs.selections.is_empty());
        assert_eq!(motifs.motifs_ranked.len(), 5);
    }
}
