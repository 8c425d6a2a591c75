use chrono::NaiveDate;
use shelf_rs::models::{Book, Catalogue, Review};
use shelf_rs::stats::{
    BucketAgg, BucketLabels, bucket, rating_by_pages, rating_by_publication_year, rating_over_time,
};

fn book(
    title: &str,
    pages: Option<u32>,
    publication_year: Option<i32>,
    rating: Option<u8>,
    dates_read: &str,
) -> Book {
    Book {
        title: title.into(),
        author: "Ann Smith".into(),
        additional_authors: Vec::new(),
        series: None,
        series_position: None,
        pages,
        publication_year,
        dimensions: None,
        cover: None,
        cover_source: None,
        spine_color: None,
        tags: Vec::new(),
        review: Review {
            rating,
            text: None,
            dates_read: Some(dates_read.into()),
            did_not_finish: false,
        },
    }
}

#[test]
fn counting_distributes_over_half_open_buckets() {
    let keys = [10.0, 60.0, 120.0];
    let buckets = bucket(
        &keys,
        &[0.0, 50.0, 100.0],
        |k| Some(*k),
        |_| None,
        BucketAgg::Count,
        0,
        BucketLabels::Plain,
    );
    assert_eq!(buckets.len(), 3);
    assert_eq!(buckets[0].label, "0-50");
    assert_eq!(buckets[1].label, "50-100");
    assert_eq!(buckets[2].label, "100-∞");
    assert_eq!(buckets[2].upper_bound, None);
    let counts: Vec<u32> = buckets.iter().map(|b| b.count).collect();
    assert_eq!(counts, vec![1, 1, 1]);
    // counts mirror into the aggregate for chart rendering
    assert_eq!(buckets[0].aggregate_value, Some(1.0));
}

#[test]
fn boundary_values_fall_into_the_upper_bucket() {
    let keys = [50.0];
    let buckets = bucket(
        &keys,
        &[0.0, 50.0, 100.0],
        |k| Some(*k),
        |_| None,
        BucketAgg::Count,
        0,
        BucketLabels::Plain,
    );
    assert_eq!(buckets[0].count, 0);
    assert_eq!(buckets[1].count, 1);
}

#[test]
fn averages_skip_unmeasured_members_but_count_them() {
    let records = [(10.0, Some(4.0)), (20.0, None), (150.0, Some(2.0))];
    let buckets = bucket(
        &records,
        &[0.0, 100.0],
        |r| Some(r.0),
        |r| r.1,
        BucketAgg::Average,
        1,
        BucketLabels::Plain,
    );
    assert_eq!(buckets[0].count, 2);
    assert_eq!(buckets[0].aggregate_value, Some(4.0));
    assert_eq!(buckets[1].count, 1);
    assert_eq!(buckets[1].aggregate_value, Some(2.0));
}

#[test]
fn records_without_a_key_are_left_out() {
    let records: [Option<f64>; 3] = [Some(10.0), None, Some(20.0)];
    let buckets = bucket(
        &records,
        &[0.0],
        |r| *r,
        |_| None,
        BucketAgg::Count,
        0,
        BucketLabels::Plain,
    );
    assert_eq!(buckets[0].count, 2);
}

#[test]
fn rating_by_pages_uses_rated_books_only() {
    let catalogue = Catalogue {
        books: vec![
            book("A", Some(40), None, Some(3), "2020-01-01"),
            book("B", Some(45), None, Some(4), "2020-02-01"),
            book("C", Some(60), None, None, "2020-03-01"),
            book("D", None, None, Some(5), "2020-04-01"),
            book("E", Some(2500), None, Some(5), "2020-05-01"),
        ],
        relations: Vec::new(),
    };
    let buckets = rating_by_pages(&catalogue);
    assert_eq!(buckets.len(), 13);
    assert_eq!(buckets[0].label, "0-50");
    // unrated C is excluded, unpaged D has no key
    assert_eq!(buckets[0].count, 2);
    assert_eq!(buckets[0].aggregate_value, Some(3.5));
    assert_eq!(buckets[1].count, 0);
    assert_eq!(buckets[1].aggregate_value, None);
    let last = buckets.last().unwrap();
    assert_eq!(last.label, "2000-∞");
    assert_eq!(last.count, 1);
    assert_eq!(last.aggregate_value, Some(5.0));
}

#[test]
fn publication_year_labels_shorten_to_two_digits() {
    let catalogue = Catalogue {
        books: vec![
            book("Old", Some(100), Some(1890), Some(4), "2020-01-01"),
            book("Mid", Some(100), Some(1930), Some(3), "2020-02-01"),
            book("New", Some(100), Some(2021), Some(5), "2020-03-01"),
        ],
        relations: Vec::new(),
    };
    let buckets = rating_by_publication_year(&catalogue);
    assert_eq!(buckets.len(), 13);
    assert_eq!(buckets[0].label, "0-1900");
    assert_eq!(buckets[1].label, "1900-25");
    assert_eq!(buckets[2].label, "1925-50");
    assert_eq!(buckets.last().unwrap().label, "2020-∞");

    assert_eq!(buckets[0].count, 1);
    assert_eq!(buckets[0].aggregate_value, Some(4.0));
    assert_eq!(buckets[2].count, 1);
    assert_eq!(buckets[2].aggregate_value, Some(3.0));
    assert_eq!(buckets.last().unwrap().count, 1);
}

#[test]
fn era_averages_round_to_two_decimals() {
    let catalogue = Catalogue {
        books: vec![
            book("A", None, Some(2001), Some(3), "2020-01-01"),
            book("B", None, Some(2002), Some(3), "2020-02-01"),
            book("C", None, Some(2003), Some(4), "2020-03-01"),
        ],
        relations: Vec::new(),
    };
    let buckets = rating_by_publication_year(&catalogue);
    // 2000-05 bucket: (3 + 3 + 4) / 3 = 3.33
    let era = buckets.iter().find(|b| b.label == "2000-05").unwrap();
    assert_eq!(era.count, 3);
    assert_eq!(era.aggregate_value, Some(3.33));
}

#[test]
fn rating_over_time_runs_ascending_with_gaps() {
    let catalogue = Catalogue {
        books: vec![
            book("A", None, None, Some(4), "1999-05-05"),
            book("B", None, None, Some(3), "2001-05-05"),
            book("C", None, None, Some(3), "2001-06-06"),
            book("D", None, None, Some(5), "2001-07-07"),
            book("E", None, None, None, "2000-02-02"),
        ],
        relations: Vec::new(),
    };
    let today = NaiveDate::from_ymd_opt(2001, 12, 31).unwrap();
    let points = rating_over_time(&catalogue, today).unwrap();
    assert_eq!(points.len(), 3);
    assert_eq!(points[0].label, "1999");
    assert_eq!(points[0].rating, Some(4.0));
    assert_eq!(points[0].count, 1);
    // a year with only unrated reads leaves a gap
    assert_eq!(points[1].label, "2000");
    assert_eq!(points[1].rating, None);
    assert_eq!(points[1].count, 0);
    // averages stay unrounded
    let avg = points[2].rating.unwrap();
    assert!((avg - 11.0 / 3.0).abs() < 1e-9);
    assert_eq!(points[2].count, 3);
}
