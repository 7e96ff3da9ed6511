//! In-memory frequency tables and the metadata derived from them

use crate::{Frequency, Keyword, Result, Year};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the column that holds the year axis
const YEAR_COLUMN: &str = "year";

/// Normalization mode of a frequency table
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Raw occurence counts
    #[default]
    Absolute,

    /// Occurence counts normalized by yearly corpus size
    Relative,
}
//
impl Mode {
    /// Every supported normalization mode
    pub const ALL: [Mode; 2] = [Mode::Absolute, Mode::Relative];
}

/// Per-year frequency readings for every keyword of one corpus table
///
/// Row i of every column is the reading for `years[i]`. Loaded once at
/// startup, never mutated afterwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrequencyTable {
    /// Year axis, in file order
    pub years: Box<[Year]>,

    /// Frequency readings, one column per keyword
    pub columns: BTreeMap<Keyword, Box<[Frequency]>>,
}

/// Incremental [`FrequencyTable`] decoder
///
/// The header row classifies the columns: the `year` column provides the year
/// axis, an unnamed column is the row index artifact of the upstream export
/// and gets discarded, and every other column holds one keyword's readings.
#[derive(Clone, Debug)]
pub struct TableBuilder {
    /// Classification of every CSV column, in file order
    columns: Box<[Column]>,

    /// Names of the keyword columns, in file order
    keywords: Box<[Keyword]>,

    /// Year axis accumulated so far
    years: Vec<Year>,

    /// Keyword readings accumulated so far, parallel to `keywords`
    values: Vec<Vec<Frequency>>,
}

/// What one CSV column contributes to the table
#[derive(Clone, Copy, Debug)]
enum Column {
    /// Year axis
    Year,

    /// Row index artifact of the upstream export, discarded
    Index,

    /// Readings for the next keyword in file order
    Keyword,
}
//
impl TableBuilder {
    /// Classify the columns of a CSV header row
    pub fn new<'a>(headers: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let mut columns = Vec::new();
        let mut keywords = Vec::new();
        for header in headers {
            columns.push(match header {
                YEAR_COLUMN => Column::Year,
                "" => Column::Index,
                keyword => {
                    keywords.push(Keyword::from(keyword));
                    Column::Keyword
                }
            });
        }
        let year_columns = columns
            .iter()
            .filter(|column| matches!(column, Column::Year))
            .count();
        anyhow::ensure!(
            year_columns == 1,
            "expected exactly one {YEAR_COLUMN:?} column, got {year_columns}"
        );
        let values = vec![Vec::new(); keywords.len()];
        Ok(Self {
            columns: columns.into(),
            keywords: keywords.into(),
            years: Vec::new(),
            values,
        })
    }

    /// Decode one data row
    pub fn push_row<'a>(&mut self, row: impl IntoIterator<Item = &'a str>) -> Result<()> {
        let mut row = row.into_iter();
        let mut keyword_idx = 0;
        for column in self.columns.iter() {
            let cell = row
                .next()
                .with_context(|| format!("row {} is shorter than the header", self.years.len()))?;
            match column {
                Column::Year => self.years.push(
                    cell.trim()
                        .parse()
                        .with_context(|| format!("parsing year {cell:?}"))?,
                ),
                Column::Index => {}
                Column::Keyword => {
                    let keyword = &self.keywords[keyword_idx];
                    let frequency = parse_frequency(cell)
                        .with_context(|| format!("parsing a {keyword:?} reading"))?;
                    self.values[keyword_idx].push(frequency);
                    keyword_idx += 1;
                }
            }
        }
        anyhow::ensure!(row.next().is_none(), "row is longer than the header");
        Ok(())
    }

    /// Finalize the table
    pub fn finish(self) -> Result<FrequencyTable> {
        let num_keywords = self.keywords.len();
        let columns = self
            .keywords
            .into_vec()
            .into_iter()
            .zip(self.values.into_iter().map(Vec::into_boxed_slice))
            .collect::<BTreeMap<_, _>>();
        anyhow::ensure!(
            columns.len() == num_keywords,
            "multiple columns share the same keyword"
        );
        Ok(FrequencyTable {
            years: self.years.into(),
            columns,
        })
    }
}

/// Decode one frequency reading, treating an empty cell as a gap
fn parse_frequency(cell: &str) -> Result<Frequency> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(Frequency::NAN);
    }
    Ok(cell.parse::<Frequency>()?)
}

/// Everything the dashboard knows about one corpus' frequency data
#[derive(Clone, Debug)]
pub struct Dataset {
    /// Raw occurence counts per year
    absolute: FrequencyTable,

    /// Occurence counts normalized by yearly corpus size
    relative: FrequencyTable,

    /// Keywords that can be plotted, in display order
    catalog: Box<[Keyword]>,
}
//
impl Dataset {
    /// Derive the keyword catalog from freshly loaded tables
    ///
    /// The relative table is the reference for keyword selection.
    pub fn new(absolute: FrequencyTable, relative: FrequencyTable) -> Self {
        let catalog = relative.columns.keys().cloned().collect::<Box<[_]>>();
        if absolute.columns.keys().ne(relative.columns.keys()) {
            log::warn!(
                "absolute and relative tables disagree on the keyword set, \
                 some plots will fail with an unknown keyword"
            );
        }
        Self {
            absolute,
            relative,
            catalog,
        }
    }

    /// Keywords that can be plotted, in display order
    pub fn catalog(&self) -> &[Keyword] {
        &self.catalog
    }

    /// Bar series for one keyword, or None if the keyword is unknown
    pub fn series(&self, keyword: &str, mode: Mode) -> Option<BarSeries> {
        let table = self.table(mode);
        let values = table.columns.get(keyword)?;
        Some(BarSeries {
            x: table.years.clone(),
            y: values.clone(),
            kind: "bar",
            name: keyword.into(),
        })
    }

    /// Table behind one normalization mode
    fn table(&self, mode: Mode) -> &FrequencyTable {
        match mode {
            Mode::Absolute => &self.absolute,
            Mode::Relative => &self.relative,
        }
    }
}

/// One bar trace, in the shape the plotting library consumes
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BarSeries {
    /// Year axis
    pub x: Box<[Year]>,

    /// Frequency readings, with gaps encoded as NaN
    pub y: Box<[Frequency]>,

    /// Trace type, always "bar"
    #[serde(rename = "type")]
    pub kind: &'static str,

    /// Legend label, the keyword itself
    pub name: Keyword,
}
