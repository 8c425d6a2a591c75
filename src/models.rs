use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use thiserror::Error;

/// Raised when a review's read-date list contains a malformed entry.
///
/// Read dates are the backbone of every aggregation, so a bad date is a data
/// error that must surface immediately instead of being skipped.
#[derive(Debug, Error)]
#[error("invalid read date {value:?}: {source}")]
pub struct DateParseError {
    pub value: String,
    #[source]
    pub source: chrono::format::ParseError,
}

/// A catalogue entry: one reviewed book plus its metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Book {
    pub title: String,
    /// Primary author display name; slugs derive from this.
    pub author: String,
    #[serde(default)]
    pub additional_authors: Vec<String>,
    #[serde(default)]
    pub series: Option<String>,
    #[serde(default)]
    pub series_position: Option<String>,
    #[serde(default)]
    pub pages: Option<u32>,
    #[serde(default)]
    pub publication_year: Option<i32>,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
    /// Path of the stored cover image, relative to the media root.
    #[serde(default)]
    pub cover: Option<String>,
    /// URL to fetch a (new) cover from; cleared once the download succeeds.
    #[serde(default)]
    pub cover_source: Option<String>,
    /// Hex `#rrggbb` color picked from the cover; empty until computed.
    #[serde(default)]
    pub spine_color: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    pub review: Review,
}

/// Physical book dimensions in centimeters, as far as they are known.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Dimensions {
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub thickness: Option<f64>,
}

/// A categorized tag like `author:gender:female` or `genre:fantasy`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Tag {
    pub category: String,
    pub name: String,
}

impl Tag {
    pub fn label(&self) -> String {
        format!("{}:{}", self.category, self.name)
    }

    /// Parse a `category:name` label; the name part may itself contain colons.
    pub fn parse(label: &str) -> Option<Tag> {
        let (category, name) = label.split_once(':')?;
        Some(Tag {
            category: category.to_string(),
            name: name.to_string(),
        })
    }
}

/// The review attached to a book.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Review {
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub text: Option<String>,
    /// Comma-joined `YYYY-MM-DD` dates, one per (re-)read.
    #[serde(default)]
    pub dates_read: Option<String>,
    #[serde(default)]
    pub did_not_finish: bool,
}

impl Review {
    pub fn word_count(&self) -> usize {
        self.text
            .as_deref()
            .map(|text| text.split_whitespace().count())
            .unwrap_or(0)
    }

    /// All read dates, in list order. Any malformed entry is a hard error.
    pub fn dates_read_list(&self) -> Result<Vec<NaiveDate>, DateParseError> {
        let Some(raw) = self.dates_read.as_deref() else {
            return Ok(Vec::new());
        };
        raw.split(',')
            .map(|value| {
                NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|source| DateParseError {
                    value: value.to_string(),
                    source,
                })
            })
            .collect()
    }

    /// Year to read date; when a year was read twice, the later list entry wins.
    pub fn date_read_lookup(&self) -> Result<BTreeMap<i32, NaiveDate>, DateParseError> {
        use chrono::Datelike;
        let mut lookup = BTreeMap::new();
        for date in self.dates_read_list()? {
            lookup.insert(date.year(), date);
        }
        Ok(lookup)
    }
}

/// A directed relation between two books, stored by slug.
///
/// Storage is asymmetric but the semantics are symmetric; the graph module
/// folds both directions into one undirected edge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookRelation {
    pub source: String,
    pub destination: String,
}

/// One occurrence of a book being finished on a specific date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadEvent {
    pub slug: String,
    pub date: NaiveDate,
    pub pages: Option<u32>,
}

/// The whole catalogue: reviewed books plus their declared relations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Catalogue {
    pub books: Vec<Book>,
    #[serde(default)]
    pub relations: Vec<BookRelation>,
}

impl Book {
    pub fn author_slug(&self) -> String {
        slugify(&self.author)
    }

    pub fn title_slug(&self) -> String {
        slugify(&self.title)
    }

    /// Stable identifier, `author-slug/title-slug`.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.author_slug(), self.title_slug())
    }

    /// All authors for display: "A", "A & B", "A, B & C".
    pub fn author_string(&self) -> String {
        if self.additional_authors.is_empty() {
            return self.author.clone();
        }
        let mut names: Vec<&str> = Vec::with_capacity(1 + self.additional_authors.len());
        names.push(self.author.as_str());
        names.extend(self.additional_authors.iter().map(String::as_str));
        match names.split_last() {
            Some((last, rest)) => format!("{} & {}", rest.join(", "), last),
            None => self.author.clone(),
        }
    }

    pub fn has_cover(&self) -> bool {
        self.cover.is_some()
    }
}

impl Catalogue {
    /// Books keyed by slug, for graph validation and view assembly.
    pub fn book_lookup(&self) -> BTreeMap<String, &Book> {
        self.books
            .iter()
            .map(|book| (book.slug(), book))
            .collect()
    }

    /// Flatten every review's date list into read events.
    pub fn read_events(&self) -> Result<Vec<ReadEvent>, DateParseError> {
        let mut events = Vec::new();
        for book in &self.books {
            let slug = book.slug();
            for date in book.review.dates_read_list()? {
                events.push(ReadEvent {
                    slug: slug.clone(),
                    date,
                    pages: book.pages,
                });
            }
        }
        Ok(events)
    }
}

/// Convert a title or name into a URL slug.
///
/// Separating punctuation becomes a hyphen before anything else is stripped,
/// so "J.K. R" turns into "j-k-r" rather than "jk-r".
pub fn slugify(text: &str) -> String {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    static INVALID: OnceLock<Regex> = OnceLock::new();
    static HYPHENS: OnceLock<Regex> = OnceLock::new();
    let separators = SEPARATORS.get_or_init(|| Regex::new(r"[–—/:;,.]").expect("static regex"));
    let invalid = INVALID.get_or_init(|| Regex::new(r"[^a-z0-9 -]").expect("static regex"));
    let hyphens = HYPHENS.get_or_init(|| Regex::new(r"-+").expect("static regex"));

    let text = separators.replace_all(text, "-");
    let mut folded = String::with_capacity(text.len());
    for ch in text.chars() {
        for lower in ch.to_lowercase() {
            fold_char(lower, &mut folded);
        }
    }
    let stripped = invalid.replace_all(&folded, "");
    let hyphenated = stripped.replace(' ', "-");
    hyphens.replace_all(&hyphenated, "-").into_owned()
}

/// ASCII fold for the Latin-1 range and common ligatures.
fn fold_char(ch: char, out: &mut String) {
    let folded = match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'ç' | 'ć' | 'č' => "c",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'ī' => "i",
        'ñ' | 'ń' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' => "o",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' => "u",
        'ý' | 'ÿ' => "y",
        'š' | 'ś' => "s",
        'ž' | 'ź' | 'ż' => "z",
        'ł' => "l",
        'ð' | 'đ' => "d",
        'þ' => "th",
        'æ' => "ae",
        'œ' => "oe",
        'ß' => "ss",
        _ => {
            out.push(ch);
            return;
        }
    };
    out.push_str(folded);
}
