use anyhow::{Result, bail};
use chrono::Local;
use clap::{Args, Parser, Subcommand, ValueEnum};
use num_format::{Locale, ToFormattedString};
use rand::SeedableRng;
use rand::rngs::StdRng;
use shelf_rs::Spine;
use shelf_rs::covers::{self, CoverClient, CoverStore};
use shelf_rs::graph::{self, RelationGraph};
use shelf_rs::render::{self, GridMetric};
use shelf_rs::stats::{self, AllTimeStats, BookSummary, YearStats};
use shelf_rs::storage;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "shelf",
    version,
    about = "Aggregate, summarize & visualize a personal book catalogue"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the all-time table, or one year's summary.
    Stats(StatsArgs),
    /// Build the year-by-month reading grid (CSV and/or SVG heatmap).
    Grid(GridArgs),
    /// Write the rating chart SVGs.
    Charts(ChartsArgs),
    /// Summarize the book relation graph.
    Graph(GraphArgs),
    /// Compute spine geometry for every book.
    Spine(SpineArgs),
    /// Rebuild cover thumbnails (and optionally download pending covers).
    Covers(CoversArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Metric {
    Books,
    Pages,
}

#[derive(Args, Debug)]
struct StatsArgs {
    /// Path to the catalogue JSON file.
    #[arg(short, long)]
    catalogue: PathBuf,
    /// Summarize this year instead of all time.
    #[arg(short, long)]
    year: Option<i32>,
    /// Also save the summary as JSON.
    #[arg(long)]
    json: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct GridArgs {
    /// Path to the catalogue JSON file.
    #[arg(short, long)]
    catalogue: PathBuf,
    /// Save the grid as flat CSV.
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Render the grid as an SVG heatmap.
    #[arg(long)]
    svg: Option<PathBuf>,
    /// Which number the heatmap shows.
    #[arg(long, value_enum, default_value_t = Metric::Books)]
    metric: Metric,
}

#[derive(Args, Debug)]
struct ChartsArgs {
    /// Path to the catalogue JSON file.
    #[arg(short, long)]
    catalogue: PathBuf,
    /// Directory the chart SVGs are written to.
    #[arg(short, long, default_value = "charts")]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct GraphArgs {
    /// Path to the catalogue JSON file.
    #[arg(short, long)]
    catalogue: PathBuf,
    /// Save the d3-style nodes/links payload as JSON.
    #[arg(long)]
    json: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SpineArgs {
    /// Path to the catalogue JSON file.
    #[arg(short, long)]
    catalogue: PathBuf,
    /// Seed for the fallback dimensions, for reproducible shelves.
    #[arg(long)]
    seed: Option<u64>,
    /// Also print the margin freed by tilting each spine this many degrees.
    #[arg(long)]
    tilt: Option<f64>,
}

#[derive(Args, Debug)]
struct CoversArgs {
    /// Path to the catalogue JSON file.
    #[arg(short, long)]
    catalogue: PathBuf,
    /// Media directory holding the cover files.
    #[arg(short, long)]
    media: PathBuf,
    /// Download covers for books with a pending source URL first.
    #[arg(long, default_value_t = false)]
    download: bool,
    /// Write the updated catalogue (cover paths, spine colors) back to disk.
    #[arg(long, default_value_t = false)]
    write: bool,
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => {
            // Format up to 4 decimals, then trim trailing zeros and trailing dot.
            let s = format!("{:.4}", x);
            s.trim_end_matches('0').trim_end_matches('.').to_string()
        }
        _ => "NA".to_string(),
    }
}

fn fmt_book(book: &BookSummary) -> String {
    match book.pages {
        Some(pages) => format!("{} by {} ({pages} pages)", book.title, book.author),
        None => format!("{} by {}", book.title, book.author),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Stats(args) => cmd_stats(args),
        Command::Grid(args) => cmd_grid(args),
        Command::Charts(args) => cmd_charts(args),
        Command::Graph(args) => cmd_graph(args),
        Command::Spine(args) => cmd_spine(args),
        Command::Covers(args) => cmd_covers(args),
    }
}

fn cmd_stats(args: StatsArgs) -> Result<()> {
    let catalogue = storage::load_catalogue(&args.catalogue)?;
    let today = Local::now().date_naive();

    if let Some(year) = args.year {
        if stats::books_read_in(&catalogue, year)?.is_empty() {
            bail!("no books read in {year}");
        }
        if stats::books_read_in(&catalogue, year - 1)?.is_empty() {
            bail!(
                "no books read in {}; year summaries compare against the preceding year",
                year - 1
            );
        }
        let summary = stats::year_stats(&catalogue, year, today)?;
        print_year(&summary);
        if let Some(path) = args.json.as_ref() {
            storage::save_json(&summary, path)?;
            eprintln!("Saved stats to {}", path.display());
        }
    } else {
        let table = stats::all_time_table(&catalogue, today);
        print_all_time(&table);
        if let Some(path) = args.json.as_ref() {
            storage::save_json(&table, path)?;
            eprintln!("Saved stats to {}", path.display());
        }
    }
    Ok(())
}

fn print_all_time(table: &AllTimeStats) {
    println!(
        "Total books              {}",
        table.total_books.to_formatted_string(&Locale::en)
    );
    println!(
        "Total pages              {}",
        table.total_pages.to_formatted_string(&Locale::en)
    );
    println!("Books without review     {}", table.books_without_review);
    println!("Books per week           {}", table.books_per_week);
    println!("Median publication year  {}", fmt_opt(table.median_year));
    println!("Median length            {}", fmt_opt(table.median_length));
    println!("Average rating           {}", fmt_opt(table.average_rating));
    println!(
        "Female/male authors      {}% / {}%",
        table.percent_female, table.percent_male
    );
}

fn print_year(summary: &YearStats) {
    println!("Books read in {}", summary.year);
    match summary.previous.as_ref() {
        Some(previous) => println!(
            "Total books       {} ({:+} vs {})",
            summary.total_books,
            i64::from(summary.total_books) - i64::from(previous.total_books),
            previous.year
        ),
        None => println!("Total books       {}", summary.total_books),
    }
    println!(
        "Total pages       {}",
        summary.total_pages.to_formatted_string(&Locale::en)
    );
    println!("Average pages     {}", summary.average_pages);
    println!("Average rating    {}", fmt_opt(summary.average_rating));
    println!("Average review    {} words", summary.average_review);
    println!("Median year       {}", fmt_opt(summary.median_year));
    println!("Median length     {}", fmt_opt(summary.median_length));
    println!("Shortest book     {}", fmt_book(&summary.shortest_book));
    println!("Longest book      {}", fmt_book(&summary.longest_book));
    println!("First book        {}", fmt_book(&summary.first_book));
    println!("Last book         {}", fmt_book(&summary.last_book));
    println!(
        "Busiest month     {} ({} books)",
        summary.busiest_month.month, summary.busiest_month.count
    );
    println!(
        "Female/male       {}/{}",
        summary.gender.female, summary.gender.male
    );
}

fn cmd_grid(args: GridArgs) -> Result<()> {
    let catalogue = storage::load_catalogue(&args.catalogue)?;
    let today = Local::now().date_naive();
    let events = catalogue.read_events()?;
    let grid = stats::build_grid(&events, &stats::all_years(today));
    println!(
        "Grid covers {} years; busiest month {} books / {} pages",
        grid.years.len(),
        grid.most_monthly_books,
        grid.most_monthly_pages
    );

    if let Some(path) = args.csv.as_ref() {
        storage::save_grid_csv(&grid, path)?;
        eprintln!("Saved grid to {}", path.display());
    }
    if let Some(path) = args.svg.as_ref() {
        let metric = match args.metric {
            Metric::Books => GridMetric::Books,
            Metric::Pages => GridMetric::Pages,
        };
        std::fs::write(path, render::grid_svg(&grid, metric, today))?;
        eprintln!("Wrote grid SVG to {}", path.display());
    }
    Ok(())
}

fn cmd_charts(args: ChartsArgs) -> Result<()> {
    let catalogue = storage::load_catalogue(&args.catalogue)?;
    let today = Local::now().date_naive();
    std::fs::create_dir_all(&args.out)?;

    let over_time = stats::rating_over_time(&catalogue, today)?;
    let by_pages: Vec<_> = stats::rating_by_pages(&catalogue)
        .into_iter()
        .map(Into::into)
        .collect();
    let by_year: Vec<_> = stats::rating_by_publication_year(&catalogue)
        .into_iter()
        .map(Into::into)
        .collect();

    let charts = [
        ("rating-over-time.svg", "Rating and books over time", over_time),
        (
            "rating-by-pages.svg",
            "Rating and books per page count",
            by_pages,
        ),
        (
            "rating-by-publication-year.svg",
            "Ratings and books per publication year",
            by_year,
        ),
    ];
    for (file, title, points) in &charts {
        let path = args.out.join(file);
        std::fs::write(&path, render::line_bar_svg(points, title))?;
        eprintln!("Wrote {}", path.display());
    }
    Ok(())
}

fn cmd_graph(args: GraphArgs) -> Result<()> {
    let catalogue = storage::load_catalogue(&args.catalogue)?;
    let lookup = catalogue.book_lookup();
    let graph = RelationGraph::build(&catalogue.relations, &lookup);
    let summary = graph::summarize(&graph, catalogue.books.len());

    println!("Nodes         {}", summary.node_count);
    println!("Edges         {}", summary.edge_count);
    println!("Not in graph  {}", summary.missing_nodes);
    println!("Parts         {}", summary.parts);
    println!(
        "Connected     {}",
        if summary.is_connected { "yes" } else { "no" }
    );

    if let Some(path) = args.json.as_ref() {
        storage::save_json(&graph::graph_json(&graph, &lookup), path)?;
        eprintln!("Wrote graph data to {}", path.display());
    }
    Ok(())
}

fn cmd_spine(args: SpineArgs) -> Result<()> {
    let catalogue = storage::load_catalogue(&args.catalogue)?;
    let mut rng: StdRng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    for book in &catalogue.books {
        let spine = Spine::new(book, &mut rng);
        let star = if spine.starred { " *" } else { "" };
        let color = spine.color.as_deref().unwrap_or("-");
        match args.tilt {
            Some(tilt) => println!(
                "{} {}x{} {} margin={:.1}{star}",
                book.slug(),
                spine.width,
                spine.height,
                color,
                spine.margin(tilt)
            ),
            None => println!(
                "{} {}x{} {}{star}",
                book.slug(),
                spine.width,
                spine.height,
                color
            ),
        }
    }
    Ok(())
}

fn cmd_covers(args: CoversArgs) -> Result<()> {
    let mut catalogue = storage::load_catalogue(&args.catalogue)?;
    let store = CoverStore::new(&args.media);

    if args.download {
        let client = CoverClient::default();
        let downloaded = covers::download_all(&store, &client, &mut catalogue);
        eprintln!("Downloaded {downloaded} covers");
    }
    let refreshed = store.refresh_all(&mut catalogue);
    eprintln!("Refreshed thumbnails for {refreshed} books");

    if args.write {
        storage::save_json(&catalogue, &args.catalogue)?;
        eprintln!("Updated {}", args.catalogue.display());
    }
    Ok(())
}
