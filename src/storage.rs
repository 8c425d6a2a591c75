use crate::models::Catalogue;
use crate::stats::StatsGrid;
use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

/// Load the catalogue from its JSON file.
pub fn load_catalogue<P: AsRef<Path>>(path: P) -> Result<Catalogue> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("opening catalogue {}", path.display()))?;
    let catalogue = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing catalogue {}", path.display()))?;
    Ok(catalogue)
}

/// Save any serializable value as pretty JSON.
pub fn save_json<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(value)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

/// Save the reading grid as flat CSV with header, one row per month cell.
pub fn save_grid_csv<P: AsRef<Path>>(grid: &StatsGrid, path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.serialize(("year", "month", "total_books", "total_pages"))?;
    for year in &grid.years {
        for month in &year.months {
            wtr.serialize((year.year, &month.month, month.total_books, month.total_pages))?;
        }
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Book, Review};
    use tempfile::tempdir;

    fn book(title: &str, author: &str) -> Book {
        Book {
            title: title.into(),
            author: author.into(),
            additional_authors: Vec::new(),
            series: None,
            series_position: None,
            pages: Some(200),
            publication_year: Some(2001),
            dimensions: None,
            cover: None,
            cover_source: None,
            spine_color: None,
            tags: Vec::new(),
            review: Review {
                rating: Some(4),
                text: Some("fine".into()),
                dates_read: Some("2020-05-01".into()),
                did_not_finish: false,
            },
        }
    }

    #[test]
    fn roundtrip_catalogue_and_save_grid() {
        let dir = tempdir().unwrap();
        let jsonp = dir.path().join("catalogue.json");
        let csvp = dir.path().join("grid.csv");

        let catalogue = Catalogue {
            books: vec![book("Piranesi", "Susanna Clarke")],
            relations: Vec::new(),
        };
        save_json(&catalogue, &jsonp).unwrap();
        let loaded = load_catalogue(&jsonp).unwrap();
        assert_eq!(loaded, catalogue);

        let events = loaded.read_events().unwrap();
        let grid = crate::stats::build_grid(&events, &[2020]);
        save_grid_csv(&grid, &csvp).unwrap();
        let written = std::fs::read_to_string(&csvp).unwrap();
        assert!(written.starts_with("year,month,total_books,total_pages\n"));
        assert!(written.contains("2020,05,1,200"));
    }
}
