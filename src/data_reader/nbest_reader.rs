// N-best list files. One block per utterance, blocks separated by blank lines:
//
//   REF<TAB>reference words
//   <acoustic score><TAB>hypothesis words
//   ...

use std::path::Path;

use anyhow::Result;
use log::warn;

use crate::data_reader::sentence_reader::tokenize;
use crate::data_reader::BufReader;
use crate::nbest::SpeechNBestList;

const REFERENCE_TAG: &str = "REF";

pub struct NBestReader;

impl NBestReader {
    pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<SpeechNBestList>> {
        let mut lines = Vec::new();
        for line in BufReader::open(path)? {
            lines.push(line?.to_string());
        }
        Ok(Self::parse(&lines))
    }

    /// Malformed lines and lists without hypotheses are logged and dropped.
    pub fn parse<S: AsRef<str>>(lines: &[S]) -> Vec<SpeechNBestList> {
        let mut lists = Vec::new();
        let mut current: Option<SpeechNBestList> = None;

        for (idx, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            if line.trim().is_empty() {
                Self::finish(&mut current, &mut lists);
                continue;
            }
            let (head, rest) = match line.split_once('\t') {
                Some(split) => split,
                None => {
                    warn!("line {}: no tab separator in {:?}", idx + 1, line);
                    continue;
                }
            };

            if head.trim() == REFERENCE_TAG {
                Self::finish(&mut current, &mut lists);
                current = Some(SpeechNBestList::new(tokenize(rest)));
                continue;
            }
            let list = match current.as_mut() {
                Some(list) => list,
                None => {
                    warn!("line {}: hypothesis before any {} line", idx + 1, REFERENCE_TAG);
                    continue;
                }
            };
            match head.trim().parse::<f64>() {
                Ok(score) if score.is_finite() => list.push(tokenize(rest), score),
                _ => warn!("line {}: bad acoustic score {:?}", idx + 1, head),
            }
        }
        Self::finish(&mut current, &mut lists);
        lists
    }

    fn finish(current: &mut Option<SpeechNBestList>, lists: &mut Vec<SpeechNBestList>) {
        if let Some(list) = current.take() {
            if list.hypotheses.is_empty() {
                warn!("dropping n-best list with no hypotheses: {:?}", list.reference);
            } else {
                lists.push(list);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const LISTS: &str = "REF\tThe cat sat
-120.5\tthe cat sat
-118.0\tthe cat sad
oops\tthe hat sat

REF\tit ran
-50\tit ran
REF\tnothing here

no tab here
-3\torphan";

    #[test]
    fn test_parse() {
        let lines: Vec<&str> = LISTS.lines().collect();
        let lists = NBestReader::parse(&lines);
        assert_eq!(lists.len(), 2);
        assert_eq!(lists[0].reference, vec!["the", "cat", "sat"]);
        assert_eq!(lists[0].hypotheses.len(), 2);
        assert_eq!(lists[0].hypotheses[1].acoustic_score, -118.);
        assert_eq!(lists[0].hypotheses[1].words, vec!["the", "cat", "sad"]);
        assert_eq!(lists[1].reference, vec!["it", "ran"]);
        assert_eq!(lists[1].hypotheses[0].acoustic_score, -50.);
    }

    #[test]
    fn test_read_all() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nbest.txt");
        std::fs::write(&path, LISTS).unwrap();
        assert_eq!(NBestReader::read_all(&path).unwrap().len(), 2);
    }
}
