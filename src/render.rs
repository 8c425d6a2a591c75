use crate::stats::{ChartPoint, StatsGrid, YearRow};
use chrono::{Datelike, NaiveDate};

const FALLBACK_COLOR: &str = "#ebedf0";
const YEAR_WIDTH: u32 = 45;
const RECT_HEIGHT: u32 = 15;
const GAP: u32 = 3;
const BLOCK_WIDTH: u32 = RECT_HEIGHT + GAP;
/// Width of the per-year total bar area, six blocks.
const STATS_WIDTH: u32 = 6 * BLOCK_WIDTH;

const LINE_COLOR: &str = "#990000";
const BAR_COLOR: &str = "#007171";
const BAR_OPACITY: f64 = 0.3;
/// Ratings only ever move in this band, so the line axis zooms into it.
const RATING_RANGE: (f64, f64) = (2.5, 4.5);
/// Bar axis range for yearly book counts.
const COUNT_RANGE: (f64, f64) = (0.0, 225.0);
const LABEL_ROTATION: f64 = 40.0;

/// Which grid number a rendered heatmap shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridMetric {
    Books,
    Pages,
}

/// Serialize one XML element with its attributes and nested content.
pub fn xml_element(name: &str, content: &str, attrs: &[(&str, String)]) -> String {
    let mut attributes = String::new();
    for (key, value) in attrs {
        attributes.push_str(&format!(" {key}=\"{value}\""));
    }
    format!("<{name}{attributes}>{content}</{name}>")
}

/// Render the reading grid as a GitHub-style heatmap.
///
/// One row per year: the year label, twelve month cells, then a bar plus
/// number for the year total. Months in the current year that have no reads
/// yet are omitted instead of drawn in the fallback color, since they are
/// simply still ahead.
pub fn grid_svg(grid: &StatsGrid, metric: GridMetric, today: NaiveDate) -> String {
    let (primary, secondary, offset, max_month, max_year) = match metric {
        GridMetric::Books => (
            "153, 0, 0",
            "0, 113, 113",
            1.0,
            f64::from(grid.most_monthly_books),
            f64::from(grid.most_yearly_books),
        ),
        GridMetric::Pages => (
            "0, 113, 113",
            "153, 0, 0",
            1000.0,
            grid.most_monthly_pages as f64,
            grid.most_yearly_pages as f64,
        ),
    };
    let current_year = today.year();
    let total_width = BLOCK_WIDTH * 12 + YEAR_WIDTH * 3 + STATS_WIDTH;
    let total_height = BLOCK_WIDTH * grid.years.len() as u32;

    let mut content = String::new();
    for (row, year) in grid.years.iter().enumerate() {
        let row = row as u32;
        let mut year_content = xml_element(
            "text",
            &year.year.to_string(),
            &[
                ("x", (YEAR_WIDTH - GAP * 2).to_string()),
                ("y", (row * BLOCK_WIDTH + 13).to_string()),
                ("width", YEAR_WIDTH.to_string()),
                ("text-anchor", "end".to_string()),
            ],
        ) + "\n";
        for (column, month) in year.months.iter().enumerate() {
            let total = metric_value(metric, month.total_books, month.total_pages);
            let title = xml_element("title", &format!("{}: {}", month.date, total), &[]);
            let color = if total > 0 {
                format!("rgba({primary}, {})", (total as f64 + offset) / max_month)
            } else if year.year == current_year {
                continue;
            } else {
                FALLBACK_COLOR.to_string()
            };
            let rect = xml_element(
                "rect",
                &title,
                &[
                    ("width", RECT_HEIGHT.to_string()),
                    ("height", RECT_HEIGHT.to_string()),
                    ("x", (column as u32 * BLOCK_WIDTH + YEAR_WIDTH).to_string()),
                    ("y", (row * BLOCK_WIDTH).to_string()),
                    ("fill", color),
                    ("class", "month".to_string()),
                ],
            );
            year_content += &xml_element(
                "a",
                &rect,
                &[("href", format!("/reviews/{}/#{}", year.year, month.date))],
            );
            year_content.push('\n');
        }

        let total = year_total(metric, year);
        let title = xml_element("title", &format!("{}: {}", year.year, total), &[]);
        let rect_width = if max_year > 0.0 {
            total as f64 * f64::from(STATS_WIDTH) / max_year
        } else {
            0.0
        };
        let rect = xml_element(
            "rect",
            &title,
            &[
                ("width", rect_width.to_string()),
                ("height", RECT_HEIGHT.to_string()),
                ("x", (12 * BLOCK_WIDTH + YEAR_WIDTH).to_string()),
                ("y", (row * BLOCK_WIDTH).to_string()),
                ("fill", format!("rgba({secondary}, 0.42)")),
                ("class", "total".to_string()),
            ],
        );
        content += &(year_content + &rect + "\n");
        content += &xml_element(
            "text",
            &total.to_string(),
            &[
                (
                    "x",
                    (12.5 * f64::from(BLOCK_WIDTH) + f64::from(YEAR_WIDTH) + rect_width)
                        .to_string(),
                ),
                ("y", (row * BLOCK_WIDTH + 13).to_string()),
                ("width", (YEAR_WIDTH * 2).to_string()),
                ("fill", "#97989a".to_string()),
            ],
        );
        content.push('\n');
    }

    xml_element(
        "svg",
        &content,
        &[(
            "style",
            format!("width: {total_width}px; height: {total_height}px"),
        )],
    )
}

fn metric_value(metric: GridMetric, books: u32, pages: u64) -> u64 {
    match metric {
        GridMetric::Books => u64::from(books),
        GridMetric::Pages => pages,
    }
}

fn year_total(metric: GridMetric, year: &YearRow) -> u64 {
    metric_value(metric, year.total_books, year.total_pages)
}

/// Render chart points as a combined line and bar chart.
///
/// The average rating is a line against the left axis, the book count bars
/// against the right one. Years without a rating leave a gap in the line.
pub fn line_bar_svg(points: &[ChartPoint], title: &str) -> String {
    const WIDTH: f64 = 800.0;
    const HEIGHT: f64 = 450.0;
    const LEFT: f64 = 60.0;
    const RIGHT: f64 = 60.0;
    const TOP: f64 = 50.0;
    const BOTTOM: f64 = 90.0;

    let plot_width = WIDTH - LEFT - RIGHT;
    let plot_height = HEIGHT - TOP - BOTTOM;
    let floor = HEIGHT - BOTTOM;

    let mut content = String::new();
    content += &xml_element(
        "text",
        title,
        &[
            ("x", fmt(WIDTH / 2.0)),
            ("y", "28".to_string()),
            ("text-anchor", "middle".to_string()),
            ("font-size", "24".to_string()),
            ("class", "title".to_string()),
        ],
    );
    content.push('\n');

    // left axis: rating ticks every half star
    let mut tick = RATING_RANGE.0;
    while tick <= RATING_RANGE.1 + f64::EPSILON {
        let y = value_to_y(tick, RATING_RANGE, floor, plot_height);
        content += &xml_element(
            "line",
            "",
            &[
                ("x1", fmt(LEFT)),
                ("y1", fmt(y)),
                ("x2", fmt(WIDTH - RIGHT)),
                ("y2", fmt(y)),
                ("stroke", "#e0e0e0".to_string()),
                ("stroke-width", "1".to_string()),
            ],
        );
        content.push('\n');
        content += &xml_element(
            "text",
            &format!("{tick:.1}"),
            &[
                ("x", fmt(LEFT - 8.0)),
                ("y", fmt(y + 5.0)),
                ("text-anchor", "end".to_string()),
                ("font-size", "18".to_string()),
                ("fill", LINE_COLOR.to_string()),
            ],
        );
        content.push('\n');
        tick += 0.5;
    }

    // right axis: book counts in thirds
    for step in 0..=3u32 {
        let value = COUNT_RANGE.0 + (COUNT_RANGE.1 - COUNT_RANGE.0) * f64::from(step) / 3.0;
        let y = value_to_y(value, COUNT_RANGE, floor, plot_height);
        content += &xml_element(
            "text",
            &fmt(value),
            &[
                ("x", fmt(WIDTH - RIGHT + 8.0)),
                ("y", fmt(y + 5.0)),
                ("text-anchor", "start".to_string()),
                ("font-size", "18".to_string()),
                ("fill", BAR_COLOR.to_string()),
            ],
        );
        content.push('\n');
    }

    if !points.is_empty() {
        let slot = plot_width / points.len() as f64;

        for (index, point) in points.iter().enumerate() {
            let x = LEFT + index as f64 * slot;
            let count = f64::from(point.count).clamp(COUNT_RANGE.0, COUNT_RANGE.1);
            let top = value_to_y(count, COUNT_RANGE, floor, plot_height);
            let title = xml_element(
                "title",
                &format!("{}: {} books", point.label, point.count),
                &[],
            );
            content += &xml_element(
                "rect",
                &title,
                &[
                    ("x", fmt(x + slot * 0.15)),
                    ("y", fmt(top)),
                    ("width", fmt(slot * 0.7)),
                    ("height", fmt(floor - top)),
                    ("fill", BAR_COLOR.to_string()),
                    ("opacity", BAR_OPACITY.to_string()),
                    ("class", "bar".to_string()),
                ],
            );
            content.push('\n');
        }

        // the rating line restarts after every gap
        let mut path = String::new();
        let mut pen_down = false;
        for (index, point) in points.iter().enumerate() {
            let Some(rating) = point.rating else {
                pen_down = false;
                continue;
            };
            let x = LEFT + (index as f64 + 0.5) * slot;
            let y = value_to_y(
                rating.clamp(RATING_RANGE.0, RATING_RANGE.1),
                RATING_RANGE,
                floor,
                plot_height,
            );
            path += &format!("{}{},{} ", if pen_down { "L" } else { "M" }, fmt(x), fmt(y));
            pen_down = true;
        }
        if !path.is_empty() {
            content += &xml_element(
                "path",
                "",
                &[
                    ("d", path.trim_end().to_string()),
                    ("fill", "none".to_string()),
                    ("stroke", LINE_COLOR.to_string()),
                    ("stroke-width", "2".to_string()),
                    ("class", "line".to_string()),
                ],
            );
            content.push('\n');
        }

        for (index, point) in points.iter().enumerate() {
            let Some(rating) = point.rating else { continue };
            let x = LEFT + (index as f64 + 0.5) * slot;
            let y = value_to_y(
                rating.clamp(RATING_RANGE.0, RATING_RANGE.1),
                RATING_RANGE,
                floor,
                plot_height,
            );
            let title = xml_element("title", &format!("{}: {:.2}", point.label, rating), &[]);
            content += &xml_element(
                "circle",
                &title,
                &[
                    ("cx", fmt(x)),
                    ("cy", fmt(y)),
                    ("r", "4".to_string()),
                    ("fill", LINE_COLOR.to_string()),
                ],
            );
            content.push('\n');
        }

        for (index, point) in points.iter().enumerate() {
            let x = LEFT + (index as f64 + 0.5) * slot;
            let y = floor + 20.0;
            content += &xml_element(
                "text",
                &point.label,
                &[
                    ("x", fmt(x)),
                    ("y", fmt(y)),
                    ("transform", format!("rotate({LABEL_ROTATION} {} {})", fmt(x), fmt(y))),
                    ("text-anchor", "start".to_string()),
                    ("font-size", "18".to_string()),
                ],
            );
            content.push('\n');
        }
    }

    content += &xml_element(
        "line",
        "",
        &[
            ("x1", fmt(LEFT)),
            ("y1", fmt(floor)),
            ("x2", fmt(WIDTH - RIGHT)),
            ("y2", fmt(floor)),
            ("stroke", "#666666".to_string()),
            ("stroke-width", "1".to_string()),
        ],
    );
    content.push('\n');

    xml_element(
        "svg",
        &content,
        &[
            ("xmlns", "http://www.w3.org/2000/svg".to_string()),
            ("viewBox", format!("0 0 {} {}", fmt(WIDTH), fmt(HEIGHT))),
            ("style", format!("width: {}px; height: {}px", fmt(WIDTH), fmt(HEIGHT))),
        ],
    )
}

fn value_to_y(value: f64, range: (f64, f64), floor: f64, plot_height: f64) -> f64 {
    let scale = (value - range.0) / (range.1 - range.0);
    floor - scale * plot_height
}

fn fmt(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value:.2}")
    }
}
