use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::block_specs::{block_spec, BLOCK_SPECS};

/// Static description of one of the 24 blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockSpec {
    /// 1-based position, 1..=24.
    pub index: u8,
    /// Act bucket, 1..=4.
    pub act: u8,
    pub title: &'static str,
    /// Dramatic function of the block, as prose.
    pub purpose: &'static str,
}

/// Newtype wrapper for variant IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantId(pub Uuid);

impl VariantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for VariantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for VariantId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// How a variant came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantSource {
    Initial,
    Regenerate,
    Expand,
}

/// A named stylistic transformation applied when expanding content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpandPreset {
    MoreSpecific,
    RaiseStakes,
    AddEmotion,
    AddTwist,
    AddDialogue,
}

impl ExpandPreset {
    pub const ALL: [ExpandPreset; 5] = [
        ExpandPreset::MoreSpecific,
        ExpandPreset::RaiseStakes,
        ExpandPreset::AddEmotion,
        ExpandPreset::AddTwist,
        ExpandPreset::AddDialogue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MoreSpecific => "more_specific",
            Self::RaiseStakes => "raise_stakes",
            Self::AddEmotion => "add_emotion",
            Self::AddTwist => "add_twist",
            Self::AddDialogue => "add_dialogue",
        }
    }

    pub fn parse(s: &str) -> Option<ExpandPreset> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }

    /// Human-readable description, stored as an expanded overview's note.
    pub fn description(&self) -> &'static str {
        match self {
            Self::MoreSpecific => "Sharper concrete detail",
            Self::RaiseStakes => "Higher stakes",
            Self::AddEmotion => "Stronger emotion",
            Self::AddTwist => "Added twist",
            Self::AddDialogue => "Added dialogue",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockOverviewVariant {
    pub id: VariantId,
    /// Milliseconds since the Unix epoch.
    pub created_at: u64,
    pub source: VariantSource,
    pub headline: String,
    /// One to three short hook phrases.
    pub hooks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stakes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDetailVariant {
    pub id: VariantId,
    pub created_at: u64,
    pub source: VariantSource,
    pub beat: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub micro_hooks: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<ExpandPreset>,
}

/// The variant history of one block plus its selection pointers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockNode {
    pub index: u8,
    pub overview_variants: Vec<BlockOverviewVariant>,
    pub selected_overview_id: VariantId,
    pub detail_variants: Vec<BlockDetailVariant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_detail_id: Option<VariantId>,
}

impl BlockNode {
    /// A node holding a single, selected overview.
    pub fn new(index: u8, overview: BlockOverviewVariant) -> Self {
        Self {
            index,
            selected_overview_id: overview.id,
            overview_variants: vec![overview],
            detail_variants: Vec::new(),
            selected_detail_id: None,
        }
    }

    pub fn selected_overview(&self) -> Option<&BlockOverviewVariant> {
        self.overview_variants
            .iter()
            .find(|v| v.id == self.selected_overview_id)
    }

    pub fn selected_detail(&self) -> Option<&BlockDetailVariant> {
        let id = self.selected_detail_id?;
        self.detail_variants.iter().find(|v| v.id == id)
    }
}

/// Continuity ledger filled in while the initial draft is generated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlocksMemory {
    pub protagonist_goal: String,
    pub central_conflict: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b_story: Option<String>,
    #[serde(default)]
    pub progress_flags: Vec<String>,
    /// Hooks of the most recently generated block.
    #[serde(default)]
    pub last_hooks: Vec<String>,
}

fn builtin_specs() -> &'static [BlockSpec] {
    &BLOCK_SPECS
}

/// The working state of the 24-block structure for one story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlocksDraft {
    #[serde(skip, default = "builtin_specs")]
    pub specs: &'static [BlockSpec],
    pub blocks_by_index: BTreeMap<u8, BlockNode>,
    pub memory: BlocksMemory,
}

impl BlocksDraft {
    pub fn spec(&self, index: u8) -> Option<&'static BlockSpec> {
        block_spec(index)
    }

    pub fn node(&self, index: u8) -> Option<&BlockNode> {
        self.blocks_by_index.get(&index)
    }

    pub fn node_mut(&mut self, index: u8) -> Option<&mut BlockNode> {
        self.blocks_by_index.get_mut(&index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_id_parses_its_display_form() {
        let id = VariantId::new();
        let parsed: VariantId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<VariantId>().is_err());
    }

    fn overview(headline: &str) -> BlockOverviewVariant {
        BlockOverviewVariant {
            id: VariantId::new(),
            created_at: 1,
            source: VariantSource::Initial,
            headline: headline.to_string(),
            hooks: vec!["a hook".to_string()],
            stakes: None,
            tags: None,
            note: None,
        }
    }

    #[test]
    fn new_node_selects_its_overview() {
        let ov = overview("Opening");
        let id = ov.id;
        let node = BlockNode::new(1, ov);
        assert_eq!(node.selected_overview_id, id);
        assert_eq!(node.selected_overview().unwrap().headline, "Opening");
        assert!(node.detail_variants.is_empty());
        assert!(node.selected_detail().is_none());
    }

    #[test]
    fn variant_ids_are_unique() {
        assert_ne!(VariantId::new(), VariantId::new());
    }

    #[test]
    fn preset_names_round_trip() {
        for preset in ExpandPreset::ALL {
            assert_eq!(ExpandPreset::parse(preset.as_str()), Some(preset));
        }
        assert_eq!(ExpandPreset::parse("bogus"), None);
    }

    #[test]
    fn draft_ron_round_trip_restores_specs() {
        let mut blocks_by_index = BTreeMap::new();
        blocks_by_index.insert(1, BlockNode::new(1, overview("Opening")));
        let draft = BlocksDraft {
            specs: &BLOCK_SPECS,
            blocks_by_index,
            memory: BlocksMemory::default(),
        };
        let text = ron::to_string(&draft).unwrap();
        let parsed: BlocksDraft = ron::from_str(&text).unwrap();
        assert_eq!(parsed.specs.len(), 24);
        assert_eq!(parsed, draft);
    }
}
