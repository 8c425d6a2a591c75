use shelf_rs::graph::{RelationGraph, edge_view, graph_json, node_view, search_tokens, summarize};
use shelf_rs::models::{Book, BookRelation, Catalogue, Review, Tag};

fn book(title: &str, author: &str) -> Book {
    Book {
        title: title.into(),
        author: author.into(),
        additional_authors: Vec::new(),
        series: None,
        series_position: None,
        pages: Some(250),
        publication_year: Some(2015),
        dimensions: None,
        cover: Some("x/cover.jpg".into()),
        cover_source: None,
        spine_color: Some("#336699".into()),
        tags: Vec::new(),
        review: Review {
            rating: Some(4),
            ..Review::default()
        },
    }
}

fn relation(source: &str, destination: &str) -> BookRelation {
    BookRelation {
        source: source.into(),
        destination: destination.into(),
    }
}

fn catalogue() -> Catalogue {
    Catalogue {
        books: vec![
            book("Alpha", "Ann Smith"),
            book("Beta", "Ann Smith"),
            book("Gamma", "Ann Smith"),
            book("Delta", "Ann Smith"),
        ],
        relations: vec![
            relation("ann-smith/alpha", "ann-smith/beta"),
            // reversed duplicate folds into the same undirected edge
            relation("ann-smith/beta", "ann-smith/alpha"),
            relation("ann-smith/gamma", "ghost/unknown"),
        ],
    }
}

#[test]
fn graph_folds_directions_and_drops_dangling_edges() {
    let catalogue = catalogue();
    let lookup = catalogue.book_lookup();
    let graph = RelationGraph::build(&catalogue.relations, &lookup);

    // delta is in no relation at all, the ghost endpoint is dropped
    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.edge_count(), 1);
    assert_eq!(
        graph.edges(),
        vec![("ann-smith/alpha".to_string(), "ann-smith/beta".to_string())]
    );
    // gamma keeps its node even though its only edge was dangling
    assert_eq!(graph.neighbors("ann-smith/gamma").map(|n| n.len()), Some(0));
    assert_eq!(graph.component_count(), 2);
    assert!(!graph.is_connected());
}

#[test]
fn self_relations_keep_the_node_without_an_edge() {
    let catalogue = Catalogue {
        books: vec![book("Alpha", "Ann Smith")],
        relations: vec![relation("ann-smith/alpha", "ann-smith/alpha")],
    };
    let lookup = catalogue.book_lookup();
    let graph = RelationGraph::build(&catalogue.relations, &lookup);
    assert_eq!(graph.node_count(), 1);
    assert_eq!(graph.edge_count(), 0);
    assert_eq!(graph.component_count(), 1);
    assert!(graph.is_connected());
}

#[test]
fn empty_graph_is_not_connected() {
    let graph = RelationGraph::default();
    assert_eq!(graph.node_count(), 0);
    assert_eq!(graph.component_count(), 0);
    assert!(!graph.is_connected());
}

#[test]
fn summary_counts_books_outside_the_graph() {
    let catalogue = catalogue();
    let lookup = catalogue.book_lookup();
    let graph = RelationGraph::build(&catalogue.relations, &lookup);
    let summary = summarize(&graph, catalogue.books.len());
    assert_eq!(summary.node_count, 3);
    assert_eq!(summary.edge_count, 1);
    assert_eq!(summary.missing_nodes, 1);
    assert_eq!(summary.parts, 2);
    assert!(!summary.is_connected);
}

#[test]
fn node_records_carry_display_and_search_data() {
    let catalogue = catalogue();
    let lookup = catalogue.book_lookup();
    let graph = RelationGraph::build(&catalogue.relations, &lookup);
    let nodes = node_view(&graph, &lookup);

    assert_eq!(nodes.len(), 3);
    let alpha = nodes.iter().find(|n| n.id == "ann-smith/alpha").unwrap();
    assert_eq!(alpha.name, "Alpha");
    assert_eq!(alpha.author, "Ann Smith");
    assert!(alpha.cover);
    assert_eq!(alpha.rating, Some(4));
    assert_eq!(alpha.color.as_deref(), Some("#336699"));
    assert_eq!(alpha.connections, 1);
    let gamma = nodes.iter().find(|n| n.id == "ann-smith/gamma").unwrap();
    assert_eq!(gamma.connections, 0);
}

#[test]
fn search_tokens_cover_title_author_series_tags_rating() {
    let mut b = book("The Fifth Season", "N. K. Jemisin");
    b.series = Some("Broken Earth".into());
    b.tags = vec![Tag::parse("author:gender:female").unwrap()];
    b.review.rating = Some(5);

    let tokens = search_tokens(&b);
    for expected in [
        "the",
        "fifth",
        "season",
        "n.",
        "k.",
        "jemisin",
        "broken",
        "earth",
        "tag:author:gender:female",
        "rating:5",
    ] {
        assert!(tokens.contains(&expected.to_string()), "missing {expected}");
    }
}

#[test]
fn unrated_books_get_no_rating_token() {
    let mut b = book("Alpha", "Ann Smith");
    b.review.rating = None;
    let tokens = search_tokens(&b);
    assert!(tokens.iter().all(|t| !t.starts_with("rating:")));

    // a zero rating counts as unrated too
    b.review.rating = Some(0);
    let tokens = search_tokens(&b);
    assert!(tokens.iter().all(|t| !t.starts_with("rating:")));
}

#[test]
fn graph_json_has_the_d3_shape() {
    let catalogue = catalogue();
    let lookup = catalogue.book_lookup();
    let graph = RelationGraph::build(&catalogue.relations, &lookup);
    let value = graph_json(&graph, &lookup);

    let nodes = value["nodes"].as_array().unwrap();
    let links = value["links"].as_array().unwrap();
    assert_eq!(nodes.len(), 3);
    assert_eq!(links.len(), 1);
    assert_eq!(links[0]["source"], "ann-smith/alpha");
    assert_eq!(links[0]["target"], "ann-smith/beta");
    assert_eq!(nodes[0]["id"], "ann-smith/alpha");
    assert!(nodes[0]["search"].is_array());
    assert_eq!(edge_view(&graph).len(), 1);
}
