use serde::{Deserialize, Serialize};

use super::idea::IdeaState;

/// The five acts, in story order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActKey {
    Setup,
    Progress,
    Crisis,
    Climax,
    Resolution,
}

impl ActKey {
    pub const ALL: [ActKey; 5] = [
        ActKey::Setup,
        ActKey::Progress,
        ActKey::Crisis,
        ActKey::Climax,
        ActKey::Resolution,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Progress => "progress",
            Self::Crisis => "crisis",
            Self::Climax => "climax",
            Self::Resolution => "resolution",
        }
    }

    /// Display title, e.g. "Act 1: Setup".
    pub fn title(&self) -> &'static str {
        match self {
            Self::Setup => "Act 1: Setup",
            Self::Progress => "Act 2: Progress",
            Self::Crisis => "Act 3: Crisis",
            Self::Climax => "Act 4: Climax",
            Self::Resolution => "Act 5: Resolution",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Act {
    pub key: ActKey,
    pub title: String,
    pub summary: String,
}

/// Five acts in key order, plus the idea state they were derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActsResult {
    pub acts: [Act; 5],
    pub state: IdeaState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_in_story_order() {
        let names: Vec<&str> = ActKey::ALL.iter().map(ActKey::as_str).collect();
        assert_eq!(names, vec!["setup", "progress", "crisis", "climax", "resolution"]);
    }

    #[test]
    fn titles_are_numbered() {
        assert!(ActKey::Setup.title().starts_with("Act 1"));
        assert!(ActKey::Resolution.title().starts_with("Act 5"));
    }
}
