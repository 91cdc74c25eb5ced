use serde::{Deserialize, Serialize};

/// One recognizer guess with its acoustic model log score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    pub words: Vec<String>,
    pub acoustic_score: f64,
}

/// Competing transcriptions of one utterance and the correct one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechNBestList {
    pub reference: Vec<String>,
    pub hypotheses: Vec<Hypothesis>,
}

impl SpeechNBestList {
    pub fn new(reference: Vec<String>) -> Self {
        Self {
            reference,
            hypotheses: Vec::new(),
        }
    }

    pub fn push(&mut self, words: Vec<String>, acoustic_score: f64) {
        self.hypotheses.push(Hypothesis {
            words,
            acoustic_score,
        });
    }
}

/// The reference transcriptions, e.g. to measure perplexity on them.
pub fn references(lists: &[SpeechNBestList]) -> Vec<Vec<String>> {
    lists.iter().map(|list| list.reference.clone()).collect()
}
