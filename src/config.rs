//! Process configuration

use crate::{corpus::CorpusInfo, dataset::Mode, Args};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

/// Environment variable through which the KWIC database is configured
pub const KWIC_DATABASE_VAR: &str = "KWIC_DATABASE";

/// Final process configuration
///
/// This is the result of combining digested [`Args`] with corpus-specific
/// considerations. Please refer to [`Args`] to know more about common fields.
#[allow(missing_docs)]
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Config {
    /// Corpus being served
    pub corpus: CorpusInfo,

    /// Base URL of the processed data directory, with a trailing slash
    pub data_url: Box<str>,

    // Other fields have the same meaning as in Args
    pub host: Box<str>,
    pub port: u16,
    pub kwic_database: Option<Box<Path>>,
}
//
impl Config {
    /// Determine process configuration from initialization products
    pub(crate) fn new(args: Args, corpus: CorpusInfo) -> Arc<Self> {
        let Args {
            corpus: _,
            data_url,
            host,
            port,
            kwic_database,
        } = args;
        let data_url = if data_url.ends_with('/') {
            data_url
        } else {
            format!("{data_url}/").into()
        };
        let kwic_database = kwic_database
            .or_else(|| std::env::var_os(KWIC_DATABASE_VAR).map(PathBuf::from))
            .map(PathBuf::into_boxed_path);
        Arc::new(Self {
            corpus,
            data_url,
            host,
            port,
            kwic_database,
        })
    }

    /// URL of the frequency table behind one normalization mode
    pub fn dataset_url(&self, mode: Mode) -> Box<str> {
        let stem = self.corpus.dataset_stem;
        match mode {
            Mode::Absolute => format!("{}{stem}_abs.csv", self.data_url).into(),
            Mode::Relative => format!("{}{stem}.csv", self.data_url).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus;

    fn args(data_url: &str) -> Args {
        Args {
            corpus: "riksdag".into(),
            data_url: data_url.into(),
            host: "127.0.0.1".into(),
            port: 0,
            kwic_database: None,
        }
    }

    #[test]
    fn dataset_urls() {
        let config = Config::new(
            args("https://data.test/processed/"),
            corpus::get("riksdag").unwrap(),
        );
        assert_eq!(
            &*config.dataset_url(Mode::Relative),
            "https://data.test/processed/frequencies_riksdag_all.csv"
        );
        assert_eq!(
            &*config.dataset_url(Mode::Absolute),
            "https://data.test/processed/frequencies_riksdag_all_abs.csv"
        );
    }

    #[test]
    fn missing_trailing_slash_is_added() {
        let config = Config::new(
            args("https://data.test/processed"),
            corpus::get("riksdag").unwrap(),
        );
        assert_eq!(&*config.data_url, "https://data.test/processed/");
    }

    #[test]
    fn explicit_database_path_wins() {
        let mut args = args("https://data.test/processed/");
        args.kwic_database = Some(PathBuf::from("/srv/kwic.sqlite"));
        let config = Config::new(args, corpus::get("newspapers").unwrap());
        assert_eq!(
            config.kwic_database.as_deref(),
            Some(Path::new("/srv/kwic.sqlite"))
        );
    }
}
