use crate::models::{Book, Catalogue, DateParseError, ReadEvent};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// First year with recorded reads; grids and charts start here.
pub const FIRST_YEAR: i32 = 1998;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Every catalogue year, newest first.
pub fn all_years(today: NaiveDate) -> Vec<i32> {
    (FIRST_YEAR..=today.year()).rev().collect()
}

/// One month cell of the reading grid.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MonthCell {
    /// Zero-padded month number, "01" through "12".
    pub month: String,
    /// "YYYY-MM", used as anchor and tooltip key.
    pub date: String,
    pub total_books: u32,
    pub total_pages: u64,
}

/// One grid row: a year with its twelve months.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct YearRow {
    pub year: i32,
    pub months: Vec<MonthCell>,
    pub total_books: u32,
    pub total_pages: u64,
}

/// The year-by-month reading grid plus the maxima used for color scaling.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatsGrid {
    pub years: Vec<YearRow>,
    pub most_monthly_books: u32,
    pub most_monthly_pages: u64,
    pub most_yearly_books: u32,
    pub most_yearly_pages: u64,
}

/// Aggregate read events into the grid for the given years.
///
/// Every listed year gets all twelve months, zero-filled where nothing was
/// read. Events with unknown page counts still count as one book and
/// contribute zero pages.
pub fn build_grid(events: &[ReadEvent], years: &[i32]) -> StatsGrid {
    let mut by_month: BTreeMap<(i32, u32), (u32, u64)> = BTreeMap::new();
    for event in events {
        let entry = by_month
            .entry((event.date.year(), event.date.month()))
            .or_default();
        entry.0 += 1;
        entry.1 += u64::from(event.pages.unwrap_or(0));
    }

    let mut grid = StatsGrid {
        years: Vec::with_capacity(years.len()),
        most_monthly_books: 0,
        most_monthly_pages: 0,
        most_yearly_books: 0,
        most_yearly_pages: 0,
    };
    for &year in years {
        let mut row = YearRow {
            year,
            months: Vec::with_capacity(12),
            total_books: 0,
            total_pages: 0,
        };
        for month in 1..=12u32 {
            let (total_books, total_pages) =
                by_month.get(&(year, month)).copied().unwrap_or((0, 0));
            row.total_books += total_books;
            row.total_pages += total_pages;
            grid.most_monthly_books = grid.most_monthly_books.max(total_books);
            grid.most_monthly_pages = grid.most_monthly_pages.max(total_pages);
            row.months.push(MonthCell {
                month: format!("{month:02}"),
                date: format!("{year}-{month:02}"),
                total_books,
                total_pages,
            });
        }
        grid.most_yearly_books = grid.most_yearly_books.max(row.total_books);
        grid.most_yearly_pages = grid.most_yearly_pages.max(row.total_pages);
        grid.years.push(row);
    }
    grid
}

/// Whole-catalogue summary, shown alongside every yearly one.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AllTimeStats {
    pub total_books: u32,
    pub total_pages: u64,
    pub books_without_review: u32,
    /// Books per week since the start of 1998, two decimals.
    pub books_per_week: f64,
    pub median_year: Option<f64>,
    pub median_length: Option<f64>,
    pub average_rating: Option<f64>,
    pub percent_female: f64,
    pub percent_male: f64,
}

/// A book reduced to what summary tables show.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BookSummary {
    pub slug: String,
    pub title: String,
    pub author: String,
    pub pages: Option<u32>,
}

impl BookSummary {
    fn from_book(book: &Book) -> Self {
        BookSummary {
            slug: book.slug(),
            title: book.title.clone(),
            author: book.author_string(),
            pages: book.pages,
        }
    }
}

/// Author gender counts from `author:gender:*` tags.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub struct GenderCounts {
    pub male: u32,
    pub female: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BusiestMonth {
    pub month: String,
    pub count: u32,
}

/// Summary of one reading year.
///
/// `previous` is always filled so a rendered summary can show the
/// year-over-year change; `next` only exists when the following year has
/// reads. Neither nests further.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct YearStats {
    pub year: i32,
    pub total_books: u32,
    pub total_pages: u64,
    pub average_pages: f64,
    pub average_rating: Option<f64>,
    pub shortest_book: BookSummary,
    pub longest_book: BookSummary,
    pub shortest_review: BookSummary,
    pub longest_review: BookSummary,
    /// Average review length in words, one decimal.
    pub average_review: f64,
    pub median_year: Option<f64>,
    pub median_length: Option<f64>,
    pub all_time: AllTimeStats,
    pub gender: GenderCounts,
    pub first_book: BookSummary,
    pub last_book: BookSummary,
    pub busiest_month: BusiestMonth,
    pub previous: Option<Box<YearStats>>,
    pub next: Option<Box<YearStats>>,
}

/// Summarize one reading year.
///
/// Requires at least one read in `year` and in `year - 1` (for the embedded
/// `previous` summary); callers check that before asking.
pub fn year_stats(
    catalogue: &Catalogue,
    year: i32,
    today: NaiveDate,
) -> Result<YearStats, DateParseError> {
    year_stats_inner(catalogue, year, today, true)
}

fn year_stats_inner(
    catalogue: &Catalogue,
    year: i32,
    today: NaiveDate,
    adjacent_years: bool,
) -> Result<YearStats, DateParseError> {
    let read = books_read_in(catalogue, year)?;
    assert!(!read.is_empty(), "no books read in {year}");

    let total_books = read.len() as u32;
    let total_pages: u64 = read
        .iter()
        .map(|(book, _)| u64::from(book.pages.unwrap_or(0)))
        .sum();
    let average_pages = round_to(total_pages as f64 / f64::from(total_books), 1);
    let average_rating = average_rating_of(read.iter().map(|(book, _)| *book));

    // extremes tie-break on slug so reruns stay stable
    let mut by_pages: Vec<(u32, String, &Book)> = read
        .iter()
        .map(|(book, _)| (book.pages.unwrap_or(0), book.slug(), *book))
        .collect();
    by_pages.sort_by(|a, b| (a.0, a.1.as_str()).cmp(&(b.0, b.1.as_str())));

    let mut by_words: Vec<(usize, String, &Book)> = read
        .iter()
        .map(|(book, _)| (book.review.word_count(), book.slug(), *book))
        .collect();
    by_words.sort_by(|a, b| (a.0, a.1.as_str()).cmp(&(b.0, b.1.as_str())));
    let total_words: usize = by_words.iter().map(|(words, _, _)| *words).sum();
    let average_review = round_to(total_words as f64 / f64::from(total_books), 1);

    let mut by_date: Vec<(NaiveDate, String, &Book)> = read
        .iter()
        .map(|(book, date)| (*date, book.slug(), *book))
        .collect();
    by_date.sort_by(|a, b| (a.0, a.1.as_str()).cmp(&(b.0, b.1.as_str())));

    let mut month_counts = [0u32; 12];
    for (_, date) in &read {
        month_counts[date.month0() as usize] += 1;
    }
    // earliest month wins a tie
    let mut busiest = 0;
    for (index, &count) in month_counts.iter().enumerate() {
        if count > month_counts[busiest] {
            busiest = index;
        }
    }

    let (previous, next) = if adjacent_years {
        let previous = Box::new(year_stats_inner(catalogue, year - 1, today, false)?);
        let next = if books_read_in(catalogue, year + 1)?.is_empty() {
            None
        } else {
            Some(Box::new(year_stats_inner(catalogue, year + 1, today, false)?))
        };
        (Some(previous), next)
    } else {
        (None, None)
    };

    Ok(YearStats {
        year,
        total_books,
        total_pages,
        average_pages,
        average_rating,
        shortest_book: BookSummary::from_book(by_pages[0].2),
        longest_book: BookSummary::from_book(by_pages[by_pages.len() - 1].2),
        shortest_review: BookSummary::from_book(by_words[0].2),
        longest_review: BookSummary::from_book(by_words[by_words.len() - 1].2),
        average_review,
        median_year: median_publication_year(read.iter().map(|(book, _)| *book)),
        median_length: median_pages(read.iter().map(|(book, _)| *book)),
        all_time: all_time_table(catalogue, today),
        gender: GenderCounts {
            male: tag_count(read.iter().map(|(book, _)| *book), "author:gender:male"),
            female: tag_count(read.iter().map(|(book, _)| *book), "author:gender:female"),
        },
        first_book: BookSummary::from_book(by_date[0].2),
        last_book: BookSummary::from_book(by_date[by_date.len() - 1].2),
        busiest_month: BusiestMonth {
            month: MONTH_NAMES[busiest].to_string(),
            count: month_counts[busiest],
        },
        previous,
        next,
    })
}

/// Books read in `year` with the read date; rereads within a year keep the
/// later date.
pub fn books_read_in(
    catalogue: &Catalogue,
    year: i32,
) -> Result<Vec<(&Book, NaiveDate)>, DateParseError> {
    let mut read = Vec::new();
    for book in &catalogue.books {
        if let Some(date) = book.review.date_read_lookup()?.get(&year).copied() {
            read.push((book, date));
        }
    }
    Ok(read)
}

/// The all-time summary table.
pub fn all_time_table(catalogue: &Catalogue, today: NaiveDate) -> AllTimeStats {
    let books = &catalogue.books;
    let total_books = books.len() as u32;
    let total_pages: u64 = books
        .iter()
        .map(|book| u64::from(book.pages.unwrap_or(0)))
        .sum();
    let books_without_review = books
        .iter()
        .filter(|book| book.review.text.as_deref().map_or(true, str::is_empty))
        .count() as u32;

    let start = NaiveDate::from_ymd_opt(FIRST_YEAR, 1, 1).expect("valid date");
    let weeks = (today - start).num_days() as f64 / 7.0;
    let books_per_week = if weeks > 0.0 {
        round_to(f64::from(total_books) / weeks, 2)
    } else {
        0.0
    };

    AllTimeStats {
        total_books,
        total_pages,
        books_without_review,
        books_per_week,
        median_year: median_publication_year(books.iter()),
        median_length: median_pages(books.iter()),
        average_rating: average_rating_of(books.iter()),
        percent_female: percent(tag_count(books.iter(), "author:gender:female"), total_books),
        percent_male: percent(tag_count(books.iter(), "author:gender:male"), total_books),
    }
}

/// Count books carrying the given tag label.
pub fn tag_count<'a>(books: impl IntoIterator<Item = &'a Book>, label: &str) -> u32 {
    books
        .into_iter()
        .filter(|book| book.tags.iter().any(|tag| tag.label() == label))
        .count() as u32
}

fn percent(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round_to(f64::from(part) * 100.0 / f64::from(whole), 1)
}

fn average_rating_of<'a>(books: impl Iterator<Item = &'a Book>) -> Option<f64> {
    let mut sum = 0u64;
    let mut rated = 0u32;
    for book in books {
        if let Some(rating) = book.review.rating {
            sum += u64::from(rating);
            rated += 1;
        }
    }
    (rated > 0).then(|| round_to(sum as f64 / f64::from(rated), 1))
}

fn median_publication_year<'a>(books: impl Iterator<Item = &'a Book>) -> Option<f64> {
    let mut years: Vec<f64> = books
        .filter_map(|book| book.publication_year)
        .map(f64::from)
        .collect();
    median(&mut years)
}

fn median_pages<'a>(books: impl Iterator<Item = &'a Book>) -> Option<f64> {
    let mut pages: Vec<f64> = books
        .filter_map(|book| book.pages)
        .map(f64::from)
        .collect();
    median(&mut pages)
}

/// Median of the values; the mean of the middle two for even counts.
fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let count = values.len();
    if count % 2 == 1 {
        Some(values[count / 2])
    } else {
        Some((values[count / 2 - 1] + values[count / 2]) / 2.0)
    }
}

// ties go to the even neighbor: an average of 141.25 pages displays as 141.2
fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round_ties_even() / factor
}

/// How bucket membership is reduced to a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketAgg {
    /// Mean of the values `value_fn` yields; `None` when nothing measured.
    Average,
    /// Member count, mirrored into the aggregate value.
    Count,
}

/// How bucket boundary labels are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketLabels {
    /// "lower-upper".
    Plain,
    /// Upper bound shortened to a two-digit year, "1975-85".
    YearSuffix,
}

/// One half-open bucket `[lower, upper)`; the final bucket is unbounded.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartBucket {
    pub label: String,
    pub lower_bound: f64,
    pub upper_bound: Option<f64>,
    pub aggregate_value: Option<f64>,
    pub count: u32,
}

/// Distribute records over half-open buckets and aggregate per bucket.
///
/// `boundaries` must be sorted ascending; the last boundary opens an
/// unbounded final bucket. Records where `key_fn` returns `None` are left
/// out entirely; records where only `value_fn` returns `None` still count
/// as members but contribute nothing to an average.
pub fn bucket<T>(
    records: &[T],
    boundaries: &[f64],
    key_fn: impl Fn(&T) -> Option<f64>,
    value_fn: impl Fn(&T) -> Option<f64>,
    agg: BucketAgg,
    decimals: u32,
    labels: BucketLabels,
) -> Vec<ChartBucket> {
    let mut buckets = Vec::with_capacity(boundaries.len());
    for (index, &lower) in boundaries.iter().enumerate() {
        let upper = boundaries.get(index + 1).copied();
        let mut count = 0u32;
        let mut sum = 0.0;
        let mut measured = 0u32;
        for record in records {
            let Some(key) = key_fn(record) else { continue };
            if key < lower || upper.is_some_and(|bound| key >= bound) {
                continue;
            }
            count += 1;
            if let Some(value) = value_fn(record) {
                sum += value;
                measured += 1;
            }
        }
        let aggregate_value = match agg {
            BucketAgg::Average => {
                (measured > 0).then(|| round_to(sum / f64::from(measured), decimals))
            }
            BucketAgg::Count => Some(f64::from(count)),
        };
        buckets.push(ChartBucket {
            label: bucket_label(lower, upper, labels),
            lower_bound: lower,
            upper_bound: upper,
            aggregate_value,
            count,
        });
    }
    buckets
}

fn fmt_bound(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn bucket_label(lower: f64, upper: Option<f64>, labels: BucketLabels) -> String {
    let lower = fmt_bound(lower);
    let Some(upper) = upper else {
        return format!("{lower}-∞");
    };
    match labels {
        BucketLabels::Plain => format!("{lower}-{}", fmt_bound(upper)),
        BucketLabels::YearSuffix => {
            // 1900 stays in full, later years shorten to their last digits
            let upper = fmt_bound(upper);
            if upper == "1900" {
                return format!("{lower}-{upper}");
            }
            let suffix = upper.get(2..).unwrap_or("");
            if suffix.is_empty() {
                format!("{lower}-∞")
            } else {
                format!("{lower}-{suffix}")
            }
        }
    }
}

/// Page-count boundaries for the rating-by-length chart.
pub const PAGE_BUCKETS: [f64; 13] = [
    0.0, 50.0, 100.0, 150.0, 200.0, 250.0, 300.0, 350.0, 400.0, 500.0, 750.0, 1000.0, 2000.0,
];

/// Publication-year boundaries for the rating-by-era chart.
pub const PUBLICATION_YEAR_BUCKETS: [f64; 13] = [
    0.0, 1900.0, 1925.0, 1950.0, 1975.0, 1985.0, 1990.0, 1995.0, 2000.0, 2005.0, 2010.0, 2015.0,
    2020.0,
];

/// One x-axis slot of the rating charts: the average rating drawn as a line
/// and the book count drawn as a bar.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartPoint {
    pub label: String,
    pub rating: Option<f64>,
    pub count: u32,
}

impl From<ChartBucket> for ChartPoint {
    fn from(bucket: ChartBucket) -> Self {
        ChartPoint {
            label: bucket.label,
            rating: bucket.aggregate_value,
            count: bucket.count,
        }
    }
}

/// Average rating and rated-book count per year, ascending, starting the
/// year after records begin.
pub fn rating_over_time(
    catalogue: &Catalogue,
    today: NaiveDate,
) -> Result<Vec<ChartPoint>, DateParseError> {
    let mut points = Vec::new();
    for year in (FIRST_YEAR + 1)..=today.year() {
        let mut sum = 0u64;
        let mut rated = 0u32;
        for (book, _) in books_read_in(catalogue, year)? {
            if let Some(rating) = book.review.rating {
                sum += u64::from(rating);
                rated += 1;
            }
        }
        points.push(ChartPoint {
            label: year.to_string(),
            rating: (rated > 0).then(|| sum as f64 / f64::from(rated)),
            count: rated,
        });
    }
    Ok(points)
}

/// Average rating per page-count bucket, over rated books only.
pub fn rating_by_pages(catalogue: &Catalogue) -> Vec<ChartBucket> {
    let rated: Vec<&Book> = catalogue
        .books
        .iter()
        .filter(|book| book.review.rating.is_some())
        .collect();
    bucket(
        &rated,
        &PAGE_BUCKETS,
        |book| book.pages.map(f64::from),
        |book| book.review.rating.map(f64::from),
        BucketAgg::Average,
        1,
        BucketLabels::Plain,
    )
}

/// Average rating per publication-era bucket, over rated books only.
pub fn rating_by_publication_year(catalogue: &Catalogue) -> Vec<ChartBucket> {
    let rated: Vec<&Book> = catalogue
        .books
        .iter()
        .filter(|book| book.review.rating.is_some())
        .collect();
    bucket(
        &rated,
        &PUBLICATION_YEAR_BUCKETS,
        |book| book.publication_year.map(f64::from),
        |book| book.review.rating.map(f64::from),
        BucketAgg::Average,
        2,
        BucketLabels::YearSuffix,
    )
}
