//! `aggregate_fields`: fields gathered from the document built so far
//!
//! The stage settings map each output field to a list of path queries.
//! Every non-null value a query selects is appended to the field, so output
//! fields are always lists. Run it late in the stage list.
//!
//! Queries use a small path language:
//!
//! - `.` selects the whole document
//! - `.name` selects a key of an object
//! - `[]` selects every element of a list
//! - `[n]` selects the element at index `n`
//!
//! ```text
//! .item__creator[].agent__label__txts[]
//! ```

use quarry_core::{Fields, PipelineContext, StageError};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unable to compile aggregate field query \"{query}\": {reason}")]
pub struct QueryError {
    pub query: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Key(String),
    Each,
    Index(usize),
}

/// A compiled path query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    source: String,
    steps: Vec<Step>,
}

impl Query {
    pub fn compile(query: &str) -> Result<Self, QueryError> {
        let error = |reason: &str| QueryError {
            query: query.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(error("empty query"));
        }
        let mut rest = trimmed;
        if rest == "." {
            return Ok(Self {
                source: query.to_string(),
                steps: Vec::new(),
            });
        }

        let mut steps = Vec::new();
        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix('.') {
                let end = after
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                    .unwrap_or(after.len());
                if end == 0 {
                    return Err(error("expected a key after '.'"));
                }
                steps.push(Step::Key(after[..end].to_string()));
                rest = &after[end..];
            } else if let Some(after) = rest.strip_prefix('[') {
                let close = after.find(']').ok_or_else(|| error("unclosed '['"))?;
                let inner = after[..close].trim();
                if inner.is_empty() {
                    steps.push(Step::Each);
                } else {
                    let index = inner
                        .parse::<usize>()
                        .map_err(|_| error("list index must be a non-negative integer"))?;
                    steps.push(Step::Index(index));
                }
                rest = &after[close + 1..];
            } else {
                return Err(error("expected '.' or '['"));
            }
        }

        Ok(Self {
            source: query.to_string(),
            steps,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Every value the query selects from `input`
    pub fn select<'v>(&self, input: &'v Value) -> Vec<&'v Value> {
        let mut current = vec![input];
        for step in &self.steps {
            let mut next = Vec::new();
            for value in current {
                match (step, value) {
                    (Step::Key(key), Value::Object(map)) => {
                        if let Some(v) = map.get(key) {
                            next.push(v);
                        }
                    }
                    (Step::Each, Value::Array(items)) => next.extend(items.iter()),
                    (Step::Each, Value::Object(map)) => next.extend(map.values()),
                    (Step::Index(i), Value::Array(items)) => {
                        if let Some(v) = items.get(*i) {
                            next.push(v);
                        }
                    }
                    _ => {}
                }
            }
            current = next;
        }
        current
    }
}

fn compile_settings(ctx: &PipelineContext<'_>) -> Result<Vec<(String, Vec<Query>)>, StageError> {
    let mut fields = Vec::new();
    for (field, queries) in &ctx.settings.options {
        let queries = match queries {
            Value::String(q) => vec![Query::compile(q)],
            Value::Array(items) => items
                .iter()
                .map(|q| match q.as_str() {
                    Some(q) => Query::compile(q),
                    None => Err(QueryError {
                        query: q.to_string(),
                        reason: "query must be a string".to_string(),
                    }),
                })
                .collect(),
            other => vec![Err(QueryError {
                query: other.to_string(),
                reason: format!("queries for {field} must be a list of strings"),
            })],
        };
        let queries = queries
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StageError::failed(e.to_string()))?;
        fields.push((field.clone(), queries));
    }
    Ok(fields)
}

pub async fn run(ctx: &PipelineContext<'_>) -> Result<Fields, StageError> {
    let compiled = compile_settings(ctx)?;
    let doc = ctx.doc.to_value();

    let mut fields = Fields::new();
    for (field, queries) in compiled {
        info!("Running queries to build field \"{field}\"");
        let mut values = Vec::new();
        for query in &queries {
            debug!("Query: {}", query.as_str());
            values.extend(query.select(&doc).into_iter().filter(|v| !v.is_null()).cloned());
        }
        fields.insert(field, Value::Array(values));
    }
    Ok(fields)
}
