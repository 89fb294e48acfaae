use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The overall tone of a story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Light,
    Hard,
    Bleak,
}

/// Adjective/adverb triple used to colour act and block prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneModifiers {
    pub conflict: &'static str,
    pub emotion: &'static str,
    pub ending: &'static str,
}

impl Tone {
    /// Returns the tag string for this tone (e.g., "hard").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Hard => "hard",
            Self::Bleak => "bleak",
        }
    }

    pub fn modifiers(&self) -> ToneModifiers {
        match self {
            Self::Light => ToneModifiers {
                conflict: "lighthearted",
                emotion: "hopeful",
                ending: "positively",
            },
            Self::Hard => ToneModifiers {
                conflict: "heavy",
                emotion: "earnest",
                ending: "reflectively",
            },
            Self::Bleak => ToneModifiers {
                conflict: "grim",
                emotion: "tragic",
                ending: "desolately",
            },
        }
    }
}

/// Snapshot of the idea form as the user filled it in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdeaForm {
    pub tone: Tone,
    /// 0 = fantastical, 100 = strict realism.
    pub realism: u8,
    #[serde(default)]
    pub seed: Option<u32>,
    /// Option group id → selected option key.
    #[serde(default)]
    pub selections: BTreeMap<String, String>,
    /// Motif keys, highest priority first.
    #[serde(default)]
    pub motifs_ranked: Vec<String>,
}

impl Default for IdeaForm {
    fn default() -> Self {
        Self {
            tone: Tone::default(),
            realism: 50,
            seed: None,
            selections: BTreeMap::new(),
            motifs_ranked: Vec::new(),
        }
    }
}

impl IdeaForm {
    pub fn new(tone: Tone) -> Self {
        Self {
            tone,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_realism(mut self, realism: u8) -> Self {
        self.realism = realism.min(100);
        self
    }

    pub fn select(mut self, group_id: &str, key: &str) -> Self {
        self.selections.insert(group_id.to_string(), key.to_string());
        self
    }

    pub fn with_motifs(mut self, motifs: &[&str]) -> Self {
        self.motifs_ranked = motifs.iter().map(|m| m.to_string()).collect();
        self
    }

    /// The selected option key for a group, ignoring empty values.
    pub fn selection(&self, group_id: &str) -> Option<&str> {
        self.selections
            .get(group_id)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Strip absent and empty fields.
    pub fn compact(&self) -> CompactedPayload {
        CompactedPayload {
            tone: self.tone,
            realism: self.realism,
            seed: self.seed,
            selections: self
                .selections
                .iter()
                .filter(|(_, v)| !v.is_empty())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            motifs_ranked: self.motifs_ranked.clone(),
        }
    }
}

/// The form with empty fields removed, as handed to a generation backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactedPayload {
    pub tone: Tone,
    pub realism: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub selections: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub motifs_ranked: Vec<String>,
}

/// One generated story idea.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeaCandidate {
    pub logline: String,
    pub synopsis: String,
    pub tags: Vec<String>,
}

/// The decided facts carried forward to the acts and blocks stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeaState {
    pub seed: u32,
    pub tone: Tone,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realism: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motifs_ranked: Option<Vec<String>>,
}

impl IdeaState {
    /// A bare state with only seed and tone decided.
    pub fn new(seed: u32, tone: Tone) -> Self {
        Self {
            seed,
            tone,
            realism: None,
            world: None,
            character: None,
            plot: None,
            motifs_ranked: None,
        }
    }
}

/// Output of one idea-generation call: always two candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeaResult {
    pub candidates: [IdeaCandidate; 2],
    pub state: IdeaState,
}

/// Which part of the form a random fill touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RandomizeScope {
    All,
    World,
    Character,
    Plot,
    Motifs,
}
