use crate::models::geometry::Region;
use serde::{Deserialize, Serialize};

/// How the locator searches for the icon
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// OCR the screen and match the icon's text label
    Text,
    /// Multi-scale correlation against a reference image
    Template,
}

/// A single matching attempt that cleared the locator's acceptance rules
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchCandidate {
    pub region: Region,
    /// Normalized match strength in [0, 1] (OCR certainty or correlation peak)
    pub confidence: f64,
    pub mode: MatchMode,
}

impl MatchCandidate {
    /// Screen coordinate the automation should click
    pub fn center(&self) -> (i32, i32) {
        self.region.center()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_center_follows_region() {
        let candidate = MatchCandidate {
            region: Region::new(100, 100, 150, 140),
            confidence: 0.9,
            mode: MatchMode::Text,
        };
        assert_eq!(candidate.center(), (125, 120));
    }

    #[test]
    fn test_match_mode_serde_names() {
        assert_eq!(serde_json::to_string(&MatchMode::Text).unwrap(), "\"text\"");
        assert_eq!(
            serde_json::to_string(&MatchMode::Template).unwrap(),
            "\"template\""
        );
        let mode: MatchMode = serde_json::from_str("\"template\"").unwrap();
        assert_eq!(mode, MatchMode::Template);
    }
}
