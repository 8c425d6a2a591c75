use crate::models::{Book, BookRelation};
use log::warn;
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Undirected graph over book slugs.
///
/// Relations are stored directed but mean "these belong together", so both
/// endpoints see each other as neighbors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationGraph {
    adjacency: BTreeMap<String, BTreeSet<String>>,
}

impl RelationGraph {
    /// Build the graph from declared relations, validated against the book
    /// lookup.
    ///
    /// A relation endpoint that is not in the catalogue gets logged and
    /// dropped; the known endpoint still becomes a node, just without the
    /// edge. Self-relations keep their node and lose the edge too.
    pub fn build(relations: &[BookRelation], books: &BTreeMap<String, &Book>) -> Self {
        let mut graph = RelationGraph::default();
        for relation in relations {
            let source_known = books.contains_key(&relation.source);
            let destination_known = books.contains_key(&relation.destination);
            if !source_known {
                warn!("relation references unknown book {}", relation.source);
            }
            if !destination_known {
                warn!("relation references unknown book {}", relation.destination);
            }
            if source_known && destination_known && relation.source != relation.destination {
                graph
                    .adjacency
                    .entry(relation.source.clone())
                    .or_default()
                    .insert(relation.destination.clone());
                graph
                    .adjacency
                    .entry(relation.destination.clone())
                    .or_default()
                    .insert(relation.source.clone());
            } else {
                if source_known {
                    graph.adjacency.entry(relation.source.clone()).or_default();
                }
                if destination_known {
                    graph
                        .adjacency
                        .entry(relation.destination.clone())
                        .or_default();
                }
            }
        }
        graph
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    /// Slugs of all nodes in sorted order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.adjacency.keys().map(String::as_str)
    }

    pub fn neighbors(&self, slug: &str) -> Option<&BTreeSet<String>> {
        self.adjacency.get(slug)
    }

    /// Each undirected edge once, smaller slug first, sorted.
    pub fn edges(&self) -> Vec<(String, String)> {
        let mut edges = Vec::with_capacity(self.edge_count());
        for (node, neighbors) in &self.adjacency {
            for neighbor in neighbors {
                if neighbor.as_str() > node.as_str() {
                    edges.push((node.clone(), neighbor.clone()));
                }
            }
        }
        edges
    }

    /// Number of connected components, by breadth-first search.
    pub fn component_count(&self) -> usize {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut parts = 0;
        for node in self.adjacency.keys() {
            if seen.contains(node.as_str()) {
                continue;
            }
            parts += 1;
            seen.insert(node.as_str());
            let mut queue = VecDeque::from([node.as_str()]);
            while let Some(current) = queue.pop_front() {
                if let Some(neighbors) = self.adjacency.get(current) {
                    for next in neighbors {
                        if seen.insert(next.as_str()) {
                            queue.push_back(next.as_str());
                        }
                    }
                }
            }
        }
        parts
    }

    /// True when every node reaches every other; false for the empty graph.
    pub fn is_connected(&self) -> bool {
        self.component_count() == 1
    }
}

/// One node of the rendered graph, with everything the frontend needs to
/// draw and filter it.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NodeRecord {
    pub id: String,
    pub name: String,
    pub cover: bool,
    pub author: String,
    pub series: Option<String>,
    pub rating: Option<u8>,
    pub color: Option<String>,
    pub connections: usize,
    pub search: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
}

/// Headline numbers about the relation graph.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GraphSummary {
    pub node_count: usize,
    pub edge_count: usize,
    /// Catalogue books that appear in no relation at all.
    pub missing_nodes: usize,
    pub parts: usize,
    pub is_connected: bool,
}

/// Node records for every graph node, in slug order.
pub fn node_view(graph: &RelationGraph, books: &BTreeMap<String, &Book>) -> Vec<NodeRecord> {
    let mut nodes = Vec::with_capacity(graph.node_count());
    for slug in graph.nodes() {
        let Some(book) = books.get(slug) else {
            warn!("graph node {slug} has no book record");
            continue;
        };
        nodes.push(NodeRecord {
            id: slug.to_string(),
            name: book.title.clone(),
            cover: book.has_cover(),
            author: book.author_string(),
            series: book.series.clone(),
            rating: book.review.rating,
            color: book.spine_color.clone(),
            connections: graph.neighbors(slug).map_or(0, BTreeSet::len),
            search: search_tokens(book),
        });
    }
    nodes
}

/// Lowercased search terms for a node: title, primary author and series
/// words, `tag:` labels, and `rating:n` when rated.
pub fn search_tokens(book: &Book) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    tokens.extend(book.title.to_lowercase().split_whitespace().map(String::from));
    tokens.extend(book.author.to_lowercase().split_whitespace().map(String::from));
    if let Some(series) = &book.series {
        tokens.extend(series.to_lowercase().split_whitespace().map(String::from));
    }
    tokens.extend(book.tags.iter().map(|tag| format!("tag:{}", tag.label())));
    // a zero rating is "unrated", it gets no token
    if let Some(rating) = book.review.rating.filter(|rating| *rating > 0) {
        tokens.push(format!("rating:{rating}"));
    }
    tokens.retain(|token| !token.is_empty());
    tokens
}

/// Edge records matching `RelationGraph::edges`.
pub fn edge_view(graph: &RelationGraph) -> Vec<EdgeRecord> {
    graph
        .edges()
        .into_iter()
        .map(|(source, target)| EdgeRecord { source, target })
        .collect()
}

pub fn summarize(graph: &RelationGraph, total_books: usize) -> GraphSummary {
    GraphSummary {
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
        missing_nodes: total_books.saturating_sub(graph.node_count()),
        parts: graph.component_count(),
        is_connected: graph.is_connected(),
    }
}

/// The d3-style payload: `{"nodes": [...], "links": [...]}`.
pub fn graph_json(graph: &RelationGraph, books: &BTreeMap<String, &Book>) -> Value {
    json!({
        "nodes": node_view(graph, books),
        "links": edge_view(graph),
    })
}
