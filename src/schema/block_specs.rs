/// The fixed 24-block beat table: four acts of six blocks each.

use super::blocks::BlockSpec;

pub const BLOCK_COUNT: usize = 24;

pub static BLOCK_SPECS: [BlockSpec; BLOCK_COUNT] = [
    // Act 1: 1-6
    spec(1, 1, "Opening Event", "Opens with an event that sets the first impression and pulls the reader in."),
    spec(2, 1, "Protagonist Intro (1)", "Shows the protagonist's daily life, temperament and surroundings so the reader can relate."),
    spec(3, 1, "Protagonist Intro (2)", "Reveals the protagonist's inner conflict or lack, hinting at room to grow."),
    spec(4, 1, "Inciting Event", "A decisive event breaks the protagonist's routine and the story truly begins."),
    spec(5, 1, "Aftermath", "Depicts the confusion and resistance the protagonist goes through in the wake of the inciting event."),
    spec(6, 1, "Aftermath Resolved", "The protagonist accepts the new situation and resolves to set out."),
    // Act 2: 7-12
    spec(7, 2, "Starting Point", "The protagonist starts moving toward the goal and enters a new world."),
    spec(8, 2, "Trial / B-Story", "An event tests the protagonist's ability or worth, and a secondary relationship forms."),
    spec(9, 2, "The Devil's Claw", "The opposing force shows itself for the first time and threatens the protagonist."),
    spec(10, 2, "Allies Join", "The protagonist gains companions and secures what the journey needs."),
    spec(11, 2, "Struggle with the Contagonist", "The clash between the protagonist and the opposing force sharpens and the conflict deepens."),
    spec(12, 2, "Crisis and Setback", "The protagonist suffers a major failure and the goal looks out of reach."),
    // Act 3: 13-18
    spec(13, 3, "Turning Point", "The protagonist gains a new insight that could turn the situation around."),
    spec(14, 3, "The Devil Unmasked", "The true intent of the opposing force comes to light and the core of the conflict becomes clear."),
    spec(15, 3, "B-Story", "The secondary relationship or inner growth comes to the fore and the protagonist's change becomes visible."),
    spec(16, 3, "All-Out Struggle (1)", "The protagonist confronts the problem head-on and a full showdown takes shape."),
    spec(17, 3, "All-Out Struggle (2)", "The struggle escalates until both the protagonist and the opposing force reach their limits."),
    spec(18, 3, "Greater Crisis and Setback", "The protagonist faces the worst situation yet and risks losing everything."),
    // Act 4: 19-24
    spec(19, 4, "Peak Point", "The protagonist gathers the last of their strength to prepare a decisive move."),
    spec(20, 4, "Last Stand", "The final confrontation begins and tension reaches its peak."),
    spec(21, 4, "Darkest Crisis", "An unexpected reversal strikes mid-battle and the outcome becomes impossible to predict."),
    spec(22, 4, "Reward and Blessing", "The protagonist reaches the goal or completes the change and the conflict is resolved."),
    spec(23, 4, "Ending", "The aftermath settles and the protagonist's new state is shown."),
    spec(24, 4, "Epilogue", "Sums up the theme of the story and leaves the reader with a lingering echo."),
];

const fn spec(index: u8, act: u8, title: &'static str, purpose: &'static str) -> BlockSpec {
    BlockSpec {
        index,
        act,
        title,
        purpose,
    }
}

/// Look up a block spec by its 1-based index.
pub fn block_spec(index: u8) -> Option<&'static BlockSpec> {
    BLOCK_SPECS.iter().find(|spec| spec.index == index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_one_through_twenty_four() {
        for (i, spec) in BLOCK_SPECS.iter().enumerate() {
            assert_eq!(spec.index as usize, i + 1);
        }
    }

    #[test]
    fn six_blocks_per_act() {
        for act in 1..=4u8 {
            let count = BLOCK_SPECS.iter().filter(|s| s.act == act).count();
            assert_eq!(count, 6, "act {} has {} blocks", act, count);
        }
        for spec in &BLOCK_SPECS {
            assert_eq!(spec.act, (spec.index - 1) / 6 + 1);
        }
    }

    #[test]
    fn lookup() {
        assert_eq!(block_spec(4).unwrap().title, "Inciting Event");
        assert!(block_spec(0).is_none());
        assert!(block_spec(25).is_none());
    }
}
