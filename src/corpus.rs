//! Text corpora served by the dashboard

use crate::Result;
use anyhow::Context;

/// Get information about a corpus
pub fn get(id: &str) -> Result<CorpusInfo> {
    all()
        .iter()
        .find(|corpus| corpus.id == id)
        .copied()
        .with_context(|| format!("Failed to find user-requested corpus {id}"))
}

/// What we know about a corpus whose frequency data can be served
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct CorpusInfo {
    /// Short name, as given on the command line
    pub id: &'static str,

    /// Title displayed at the top of the dashboard page
    pub title: &'static str,

    /// File stem of the frequency tables within the processed data directory
    ///
    /// The relative table lives at `<stem>.csv` and the absolute one at
    /// `<stem>_abs.csv`.
    pub dataset_stem: &'static str,

    /// Name of the keyword-in-context table in the relational store
    ///
    /// Corpora without digitized source texts have no context data to show,
    /// and thus no table name here.
    pub kwic_table: Option<&'static str>,
}

/// Every corpus that is supported by this program
pub fn all() -> &'static [CorpusInfo] {
    &CORPORA
}
//
static CORPORA: [CorpusInfo; 2] = [
    CorpusInfo {
        id: "riksdag",
        title: "Ståndsriksdagen (1521-1866)",
        dataset_stem: "frequencies_riksdag_all",
        kwic_table: None,
    },
    CorpusInfo {
        id: "newspapers",
        title: "Finnish newspapers (1771-1917)",
        dataset_stem: "frequencies_newspapers_all",
        kwic_table: Some("kwic_newspapers"),
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_corpus() {
        let corpus = get("riksdag").unwrap();
        assert_eq!(corpus.dataset_stem, "frequencies_riksdag_all");
        assert_eq!(corpus.kwic_table, None);
    }

    #[test]
    fn unknown_corpus() {
        assert!(get("akkadian").is_err());
    }

    #[test]
    fn distinct_ids() {
        let ids = all()
            .iter()
            .map(|corpus| corpus.id)
            .collect::<std::collections::HashSet<_>>();
        assert_eq!(ids.len(), all().len());
    }
}
