use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::core::rng::Weighted;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid catalog: {0}")]
    Invalid(String),
}

/// One selectable choice within an option group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionChoice {
    /// Stable identifier stored in forms and idea state.
    pub key: String,
    /// Human-readable label used in generated prose and tags.
    pub label: String,
    /// Hint tags folded into a candidate's tag pool.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Sampling weight for random fill; 1 when absent.
    #[serde(default)]
    pub weight: Option<u32>,
}

impl Weighted for OptionChoice {
    fn weight(&self) -> f64 {
        self.weight.map(f64::from).unwrap_or(1.0)
    }
}

/// A named group of choices. The group id is the form field it fills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionGroup {
    pub id: String,
    pub label: String,
    pub options: Vec<OptionChoice>,
}

impl OptionGroup {
    pub fn find(&self, key: &str) -> Option<&OptionChoice> {
        self.options.iter().find(|opt| opt.key == key)
    }
}

/// Which section of the idea state a group's selection lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupSection {
    World,
    Character,
    Plot,
}

/// The full set of option groups offered by the idea form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionCatalog {
    pub world: Vec<OptionGroup>,
    pub character: Vec<OptionGroup>,
    pub plot: Vec<OptionGroup>,
    pub motifs: OptionGroup,
}

impl Default for OptionCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl OptionCatalog {
    /// Load a catalog from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<OptionCatalog, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a catalog from a RON string.
    pub fn parse_ron(input: &str) -> Result<OptionCatalog, CatalogError> {
        let catalog: OptionCatalog = ron::from_str(input)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Form groups must offer at least one choice. Weights, when given, must
    /// be positive. The motif list may be empty.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for (_, group) in self.groups() {
            if group.options.is_empty() {
                return Err(CatalogError::Invalid(format!(
                    "group '{}' has no options",
                    group.id
                )));
            }
        }
        let all = self.groups().map(|(_, g)| g).chain(std::iter::once(&self.motifs));
        for group in all {
            if let Some(choice) = group.options.iter().find(|c| c.weight == Some(0)) {
                return Err(CatalogError::Invalid(format!(
                    "{}.{}: weight must be at least 1",
                    group.id, choice.key
                )));
            }
        }
        Ok(())
    }

    /// Every non-motif group, in world → character → plot order.
    pub fn groups(&self) -> impl Iterator<Item = (GroupSection, &OptionGroup)> {
        let world = self.world.iter().map(|g| (GroupSection::World, g));
        let character = self.character.iter().map(|g| (GroupSection::Character, g));
        let plot = self.plot.iter().map(|g| (GroupSection::Plot, g));
        world.chain(character).chain(plot)
    }

    pub fn group(&self, id: &str) -> Option<&OptionGroup> {
        self.groups().map(|(_, g)| g).find(|g| g.id == id)
    }

    /// Look up a selected option by group id and option key.
    pub fn choice(&self, group_id: &str, key: &str) -> Option<&OptionChoice> {
        self.group(group_id)?.find(key)
    }

    pub fn motif(&self, key: &str) -> Option<&OptionChoice> {
        self.motifs.find(key)
    }

    /// The catalog that ships with the crate.
    pub fn builtin() -> Self {
        Self {
            world: vec![
                group(
                    "world_setting",
                    "World Setting",
                    &[
                        ("fantasy", "Fantasy", &["magic", "medieval"]),
                        ("scifi", "Sci-Fi", &["future", "technology"]),
                        ("modern", "Modern", &["realistic", "contemporary"]),
                        ("historical", "Historical", &["past", "period"]),
                        ("post_apocalyptic", "Post-Apocalyptic", &["dystopia", "survival"]),
                    ],
                ),
                group(
                    "world_era",
                    "Era",
                    &[
                        ("ancient", "Ancient", &[]),
                        ("medieval", "Medieval", &[]),
                        ("modern", "Modern", &[]),
                        ("near_future", "Near Future", &[]),
                        ("far_future", "Far Future", &[]),
                    ],
                ),
                group(
                    "world_scale",
                    "Spatial Scale",
                    &[
                        ("single_location", "single location", &[]),
                        ("city", "city", &[]),
                        ("nation", "nation", &[]),
                        ("continent", "continent", &[]),
                        ("world", "world", &[]),
                        ("multiverse", "multiverse", &[]),
                    ],
                ),
            ],
            character: vec![
                group(
                    "character_protagonist",
                    "Protagonist Type",
                    &[
                        ("hero", "the hero", &["brave", "moral"]),
                        ("antihero", "the antihero", &["flawed", "complex"]),
                        ("everyman", "an ordinary person", &["relatable", "ordinary"]),
                        ("villain", "the villain protagonist", &["dark", "antagonist"]),
                        ("ensemble", "the ensemble", &["multiple", "group"]),
                    ],
                ),
                group(
                    "character_count",
                    "Protagonist Count",
                    &[
                        ("solo", "a single lead", &[]),
                        ("duo", "a duo", &[]),
                        ("small_group", "a small group (3-5)", &[]),
                        ("large_group", "a large group (6+)", &[]),
                    ],
                ),
                group(
                    "character_relationship",
                    "Relationship",
                    &[
                        ("rivals", "rivals", &[]),
                        ("mentor_student", "mentor and student", &[]),
                        ("family", "family", &[]),
                        ("friends", "friends", &[]),
                        ("lovers", "lovers", &[]),
                        ("strangers", "strangers", &[]),
                    ],
                ),
            ],
            plot: vec![
                group(
                    "plot_structure",
                    "Plot Structure",
                    &[
                        ("heros_journey", "Hero's Journey", &["classic", "adventure"]),
                        ("three_act", "Three-Act", &["traditional"]),
                        ("nonlinear", "Nonlinear", &["complex", "experimental"]),
                        ("episodic", "Episodic", &["serial", "anthology"]),
                        ("parallel", "Parallel Narrative", &["multiple", "intertwined"]),
                    ],
                ),
                group(
                    "plot_conflict",
                    "Conflict Type",
                    &[
                        ("man_vs_man", "person versus person", &[]),
                        ("man_vs_self", "person versus self", &[]),
                        ("man_vs_society", "person versus society", &[]),
                        ("man_vs_nature", "person versus nature", &[]),
                        ("man_vs_technology", "person versus technology", &[]),
                        ("man_vs_fate", "person versus fate", &[]),
                    ],
                ),
                group(
                    "plot_ending",
                    "Ending",
                    &[
                        ("happy", "Happy Ending", &[]),
                        ("bittersweet", "Bittersweet", &[]),
                        ("tragic", "Tragedy", &[]),
                        ("open", "Open Ending", &[]),
                        ("twist", "Twist", &[]),
                    ],
                ),
            ],
            motifs: group(
                "motifs_ranked",
                "Motif Priority",
                &[
                    ("revenge", "revenge", &["vendetta", "justice"]),
                    ("love", "love", &["romance", "relationship"]),
                    ("power", "power", &["ambition", "control"]),
                    ("survival", "survival", &["danger", "perseverance"]),
                    ("redemption", "redemption", &["forgiveness", "change"]),
                    ("discovery", "discovery", &["exploration", "knowledge"]),
                    ("betrayal", "betrayal", &["deception", "trust"]),
                    ("sacrifice", "sacrifice", &["selflessness", "loss"]),
                    ("freedom", "freedom", &["independence", "rebellion"]),
                    ("identity", "identity", &["self", "belonging"]),
                ],
            ),
        }
    }
}

fn group(id: &str, label: &str, choices: &[(&str, &str, &[&str])]) -> OptionGroup {
    OptionGroup {
        id: id.to_string(),
        label: label.to_string(),
        options: choices
            .iter()
            .map(|(key, label, tags)| OptionChoice {
                key: key.to_string(),
                label: label.to_string(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
                weight: None,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_group_order() {
        let catalog = OptionCatalog::builtin();
        let ids: Vec<&str> = catalog.groups().map(|(_, g)| g.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "world_setting",
                "world_era",
                "world_scale",
                "character_protagonist",
                "character_count",
                "character_relationship",
                "plot_structure",
                "plot_conflict",
                "plot_ending",
            ]
        );
    }

    #[test]
    fn choice_lookup() {
        let catalog = OptionCatalog::builtin();
        let scifi = catalog.choice("world_setting", "scifi").unwrap();
        assert_eq!(scifi.label, "Sci-Fi");
        assert_eq!(scifi.tags, vec!["future", "technology"]);
        assert!(catalog.choice("world_setting", "nope").is_none());
        assert!(catalog.choice("nope", "scifi").is_none());
        assert_eq!(catalog.motif("identity").unwrap().label, "identity");
    }

    #[test]
    fn default_weight_is_one() {
        let catalog = OptionCatalog::builtin();
        let choice = catalog.choice("plot_ending", "happy").unwrap();
        assert_eq!(Weighted::weight(choice), 1.0);
    }

    #[test]
    fn ron_round_trip() {
        let catalog = OptionCatalog::builtin();
        let serialized = ron::to_string(&catalog).unwrap();
        let parsed = OptionCatalog::parse_ron(&serialized).unwrap();
        assert_eq!(parsed, catalog);
    }

    #[test]
    fn parse_ron_with_weights() {
        let input = r#"(
            world: [(
                id: "world_setting",
                label: "World",
                options: [
                    (key: "fantasy", label: "Fantasy", weight: Some(5)),
                    (key: "scifi", label: "Sci-Fi", tags: ["future"]),
                ],
            )],
            character: [],
            plot: [],
            motifs: (id: "motifs_ranked", label: "Motifs", options: []),
        )"#;
        let catalog = OptionCatalog::parse_ron(input).unwrap();
        let fantasy = catalog.choice("world_setting", "fantasy").unwrap();
        assert_eq!(fantasy.weight, Some(5));
        assert!(fantasy.tags.is_empty());
    }

    #[test]
    fn rejects_zero_weight() {
        let input = r#"(
            world: [(
                id: "world_setting",
                label: "World",
                options: [
                    (key: "a", label: "A", weight: Some(0)),
                    (key: "b", label: "B", weight: Some(0)),
                ],
            )],
            character: [],
            plot: [],
            motifs: (id: "motifs_ranked", label: "Motifs", options: []),
        )"#;
        let err = OptionCatalog::parse_ron(input).unwrap_err();
        assert!(matches!(err, CatalogError::Invalid(_)));
        assert!(err.to_string().contains("world_setting.a"));
    }

    #[test]
    fn rejects_empty_group() {
        let input = r#"(
            world: [],
            character: [],
            plot: [(id: "plot_ending", label: "Ending", options: [])],
            motifs: (id: "motifs_ranked", label: "Motifs", options: []),
        )"#;
        let err = OptionCatalog::parse_ron(input).unwrap_err();
        assert!(err.to_string().contains("plot_ending"));
    }

    #[test]
    fn builtin_catalog_is_valid() {
        OptionCatalog::builtin().validate().unwrap();
    }
}
