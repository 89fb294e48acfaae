/// Five-act structuring of a chosen idea.

use crate::core::rng::{pick, SeededRng};
use crate::core::template::{render, Slots, TemplateError};
use crate::schema::acts::{Act, ActKey, ActsResult};
use crate::schema::idea::{IdeaState, ToneModifiers};

const SETUP: &[&str] = &[
    "The story opens in an ordinary world. The protagonist lives a life of their own and has not yet met the event that will change it. The people around them are introduced and the basic rules of the world come into view. Everyday life carries on in a {emotion} mood, but signs of change are already gathering.",
    "The protagonist's daily life and world unfold. Their surroundings, relationships and inner state emerge naturally. The conflict has not surfaced yet, but a {conflict} atmosphere hangs in the air and something is about to shift. Through the characters' everyday moments the foundation of the story is laid.",
    "The protagonist's life is drawn against an ordinary routine. The traits of the world and the temperaments of those nearby are introduced, and the protagonist's inner struggle or outer circumstance is hinted at. A {emotion} feeling runs underneath, and the reader is slowly drawn into this world. The real event has not happened yet.",
];

const PROGRESS: &[&str] = &[
    "A small event finds the protagonist. Cracks appear in everyday life and the relationships between characters begin to shift. A {conflict} conflict takes root and the protagonist starts to weigh their choices. Along the way the true faces of those nearby come out, and the story moves toward its main course.",
    "An early event changes the protagonist's life. A quiet tension forms between the characters and {emotion} feelings cross paths. The protagonist tries to adapt to the new situation, but unexpected problems appear one after another. The dynamics between people grow tangled and the seed of conflict grows.",
    "The balance of everyday life begins to break. The protagonist faces a {conflict} situation and weighs what their choices will bring. New sides of the people around them are discovered and the narrative gains complexity. It is not yet the decisive moment, but the tension starts to climb.",
];

const CRISIS: &[&str] = &[
    "The conflict deepens in earnest. The protagonist is caught in a {conflict} crisis and cornered where avoidance is no longer possible. The opposition between characters sharpens and the moment of choice draws near. Tension peaks as fierce clashes break out both within the protagonist and around them. The story heads toward a point of no return.",
    "The main event erupts. A {emotion} feeling takes hold of the story as the protagonist meets the hardest trial yet. Relationships are pushed to the limit and a moment arrives when everything seems about to collapse. The protagonist confronts their own limits and agonizes before a decisive choice. The wave of events surges toward its crest.",
    "The crisis reaches its height. In a {conflict} situation the protagonist and those around them reveal who they really are. Trust collapses or new bonds form, and the story hits a sharp turning point. Ordinary solutions no longer work, and the protagonist considers an extreme choice.",
];

const CLIMAX: &[&str] = &[
    "The moment that decides everything arrives. The protagonist stands at a {emotion} crossroads of confrontation or choice and acts with everything on the line. Inner change and outer events erupt together and the core conflict of the story is resolved. The protagonist is changed at the root, and so is the world. The most dramatic moment unfolds.",
    "The moment of climax. A {conflict} confrontation reaches its peak and the protagonist finally makes a decision. Every tension and conflict converges on a single point and the story undergoes an explosive turn. Fundamental change takes place inside and outside the protagonist, and the result cannot be undone. This is where the true meaning of the story comes to light.",
    "The most intense event takes place. The protagonist meets a {emotion} moment and faces who they truly are. Every foreshadowing and conflict converges here and a dramatic change occurs. Relationships are redefined and the world accepts a new order. The protagonist is no longer who they used to be.",
];

const RESOLUTION: &[&str] = &[
    "The story closes {ending}. The protagonist greets a new daily life as a changed person. The aftermath of the conflict settles and each character finds their place. Along the way the message of the story comes through naturally. The reader feels something through the protagonist's journey, and the story quietly draws to a close.",
    "Every event is settled and a new balance arrives. Carrying what the journey taught them, the protagonist moves forward {ending}. Relationships are rebuilt and the world settles into a new shape. The core theme of the story lingers, and the reader shares the catharsis of the protagonist's change.",
    "The ending arrives. In a {emotion} mood the changed protagonist comes clearly into view. Those left behind move on in their own ways and the world accepts a new order. An answer to the question the story raised is hinted at, and the reader leaves with a lingering echo. The journey is over, but its meaning goes on.",
];

/// Summary templates for an act.
pub(crate) fn templates_for(key: ActKey) -> &'static [&'static str] {
    match key {
        ActKey::Setup => SETUP,
        ActKey::Progress => PROGRESS,
        ActKey::Crisis => CRISIS,
        ActKey::Climax => CLIMAX,
        ActKey::Resolution => RESOLUTION,
    }
}

pub(crate) fn tone_slots(modifiers: ToneModifiers) -> Slots {
    Slots::new()
        .with("conflict", modifiers.conflict)
        .with("emotion", modifiers.emotion)
        .with("ending", modifiers.ending)
}

/// Build the five acts for a chosen idea.
///
/// One RNG seeded with `state.seed` is threaded through the acts in key
/// order, one draw each.
pub fn generate_acts(
    logline: &str,
    synopsis: &str,
    state: &IdeaState,
) -> Result<ActsResult, TemplateError> {
    let mut rng = SeededRng::new(state.seed);
    let slots = tone_slots(state.tone.modifiers());

    let drafts = ActKey::ALL.map(|key| {
        let pool = templates_for(key);
        let template = pick(pool, &mut rng).copied().unwrap_or(pool[0]);
        render(template, &slots).map(|summary| Act {
            key,
            title: key.title().to_string(),
            summary,
        })
    });
    let [setup, progress, crisis, climax, resolution] = drafts;

    tracing::debug!(
        seed = state.seed,
        logline_len = logline.len(),
        synopsis_len = synopsis.len(),
        "generated acts"
    );

    Ok(ActsResult {
        acts: [setup?, progress?, crisis?, climax?, resolution?],
        state: state.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::template::Template;
    use crate::schema::idea::Tone;

    #[test]
    fn templates_use_tone_slots_only() {
        for key in ActKey::ALL {
            assert_eq!(templates_for(key).len(), 3);
            for source in templates_for(key) {
                let template = Template::parse(source).unwrap();
                for name in template.slot_names() {
                    assert!(["conflict", "emotion", "ending"].contains(&name));
                }
            }
        }
    }

    #[test]
    fn five_acts_in_key_order() {
        let state = IdeaState::new(12345, Tone::Hard);
        let result = generate_acts("logline", "synopsis", &state).unwrap();
        let keys: Vec<ActKey> = result.acts.iter().map(|a| a.key).collect();
        assert_eq!(keys, ActKey::ALL.to_vec());
        for act in &result.acts {
            assert!(!act.summary.is_empty());
            assert!(!act.summary.contains('{'));
            assert_eq!(act.title, act.key.title());
        }
        assert_eq!(result.state, state);
    }

    #[test]
    fn same_seed_same_summaries() {
        let state = IdeaState::new(42, Tone::Bleak);
        let a = generate_acts("l", "s", &state).unwrap();
        let b = generate_acts("l", "s", &state).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn tone_colours_the_prose() {
        let light = generate_acts("l", "s", &IdeaState::new(3, Tone::Light)).unwrap();
        let bleak = generate_acts("l", "s", &IdeaState::new(3, Tone::Bleak)).unwrap();
        let resolution_light = &light.acts[4].summary;
        let resolution_bleak = &bleak.acts[4].summary;
        assert_ne!(resolution_light, resolution_bleak);
        assert!(!resolution_light.contains("desolately"));
    }
}
