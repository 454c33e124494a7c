//! Records printed by `mystem --format json`.

use serde::{Deserialize, Serialize};

/// One token of analyzer output.
///
/// Dictionary words carry hypotheses in `analysis`, best first. Whitespace,
/// punctuation and unknown tokens carry only `text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub analysis: Vec<Analysis>,
}

/// A single lemma hypothesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub lex: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wt: Option<f64>,
    /// `"bastard"` for hypotheses built from a non-dictionary word.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qual: Option<String>,
}

impl Record {
    /// Lemma of the best hypothesis, else the original text.
    pub fn lemma(&self) -> Option<&str> {
        self.analysis
            .first()
            .map(|a| a.lex.as_str())
            .or(self.text.as_deref())
            .filter(|s| !s.is_empty())
    }

    /// Main part-of-speech tag of the best hypothesis.
    ///
    /// `"S,жен,од=им,ед"` yields `"S"`.
    pub fn pos(&self) -> Option<&str> {
        let gr = self.analysis.first()?.gr.as_deref()?;
        let head = gr.split('=').next().unwrap_or(gr);
        head.split(',').next().filter(|s| !s.is_empty())
    }

    /// Whether the analyzer recognized this token.
    pub fn is_analyzed(&self) -> bool {
        !self.analysis.is_empty()
    }
}
