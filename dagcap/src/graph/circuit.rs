// src/graph/circuit.rs

//! Loader for the whitespace-separated circuit DAG format:
//!
//! ```text
//! 3
//! "A";
//! "B";
//! "C";
//! "A" -> "B";
//! "B" -> "C";
//! ```
//!
//! A leading node count, one quoted name per node line, then edge
//! lines distinguished by `->`. Quotes and trailing semicolons are
//! literal and required; edges naming an undeclared node are fatal.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::errors::{GraphError, Result};
use crate::graph::{Graph, NodeId};

impl Graph {
    /// Load a circuit file from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Graph> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let graph = parse_circuit(&contents)?;
        info!(
            path = %path.display(),
            nodes = graph.num_nodes(),
            edges = graph.num_edges(),
            "loaded circuit"
        );
        Ok(graph)
    }
}

/// Parse circuit text into a [`Graph`].
pub fn parse_circuit(input: &str) -> Result<Graph> {
    let mut tokens = input.split_whitespace();

    let count_tok = tokens
        .next()
        .ok_or_else(|| GraphError::Parse("empty circuit file".into()))?;
    let num_nodes: usize = count_tok.parse().map_err(|_| {
        GraphError::Parse(format!("expected node count, found {count_tok:?}"))
    })?;

    let mut graph = Graph::new();
    let mut by_name: HashMap<String, NodeId> = HashMap::with_capacity(num_nodes);

    for _ in 0..num_nodes {
        let tok = tokens.next().ok_or_else(|| {
            GraphError::Parse(format!(
                "file declares {num_nodes} nodes but ends after {}",
                graph.num_nodes()
            ))
        })?;
        let name = strip_quoted(tok, true)?;
        let id = graph.insert_node(name.clone());
        if by_name.insert(name.clone(), id).is_some() {
            warn!(name = %name, "duplicate node name in circuit file; edges bind to the last one");
        }
    }

    while let Some(from_tok) = tokens.next() {
        let arrow = tokens.next().ok_or_else(|| {
            GraphError::Parse(format!("dangling token {from_tok:?} at end of file"))
        })?;
        if arrow != "->" {
            return Err(GraphError::Parse(format!(
                "expected `->` after {from_tok:?}, found {arrow:?}"
            )));
        }
        let to_tok = tokens.next().ok_or_else(|| {
            GraphError::Parse(format!("edge from {from_tok:?} is missing its target"))
        })?;

        let from = strip_quoted(from_tok, false)?;
        let to = strip_quoted(to_tok, true)?;

        let from_id = *by_name.get(&from).ok_or_else(|| {
            GraphError::Parse(format!("edge references unknown node {from:?}"))
        })?;
        let to_id = *by_name.get(&to).ok_or_else(|| {
            GraphError::Parse(format!("edge references unknown node {to:?}"))
        })?;
        graph.insert_edge(from_id, to_id);
    }

    Ok(graph)
}

/// Strip the literal quotes (and, where the grammar puts one, the
/// trailing semicolon) from a token.
fn strip_quoted(token: &str, trailing_semicolon: bool) -> Result<String> {
    let body = if trailing_semicolon {
        token.strip_suffix(';').ok_or_else(|| {
            GraphError::Parse(format!("missing trailing `;` in {token:?}"))
        })?
    } else {
        token
    };
    let name = body
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(|| GraphError::Parse(format!("expected quoted name, found {token:?}")))?;
    if name.is_empty() {
        return Err(GraphError::Parse(format!("empty node name in {token:?}")));
    }
    Ok(name.to_string())
}
