//! shelf_rs
//!
//! A lightweight Rust library for aggregating, summarizing, and visualizing a
//! personal book catalogue. Pairs with the `shelf` CLI.
//!
//! ### Features
//! - Year-by-month reading grid with the maxima needed for color scaling
//! - Yearly and all-time summaries (averages, medians, extremes, busiest month)
//! - Relation graph over books, with search metadata and connectivity checks
//! - Spine geometry plus dominant-color extraction from cover images
//! - Hand-assembled SVG heatmaps and rating charts
//!
//! ### Example
//! ```no_run
//! use shelf_rs::{render, stats, storage};
//!
//! let catalogue = storage::load_catalogue("catalogue.json")?;
//! let today = chrono::Local::now().date_naive();
//! let events = catalogue.read_events()?;
//! let grid = stats::build_grid(&events, &stats::all_years(today));
//! let svg = render::grid_svg(&grid, render::GridMetric::Books, today);
//! std::fs::write("grid.svg", svg)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod color;
pub mod covers;
pub mod graph;
pub mod models;
pub mod render;
pub mod spine;
pub mod stats;
pub mod storage;

pub use models::{Book, BookRelation, Catalogue, ReadEvent, Review, Tag};
pub use spine::Spine;
