//! Query text rendering
//!
//! Renders a [`Relation`] into a statement. Sections appear in a fixed order
//! and are left out when empty:
//!
//! ```text
//! select <fields|calc> from <series> [merge <s>]... [where ...] [group by ...] [fill(..)] [limit n] [offset n]
//! delete               from <series> [merge <s>]... [where ...] [group by ...] [fill(..)] [limit n] [offset n]
//! ```

use crate::query::relation::Relation;

/// Render the `select` statement
pub fn render_select(relation: &Relation) -> String {
    let fields = match &relation.calculation {
        Some(calc) => calc.render(),
        None if relation.select.is_empty() => "*".to_string(),
        None => unique(&relation.select).join(","),
    };

    let mut parts = vec!["select".to_string(), fields];
    parts.extend(render_body(relation));
    parts.join(" ")
}

/// Render the `delete` statement
pub fn render_delete(relation: &Relation) -> String {
    let mut parts = vec!["delete".to_string()];
    parts.extend(render_body(relation));
    parts.join(" ")
}

/// Everything after the select list
fn render_body(relation: &Relation) -> Vec<String> {
    let mut parts = vec![format!("from {}", relation.series.quoted(None))];

    for target in &relation.merge_targets {
        parts.push(format!("merge {}", target.quoted(None)));
    }

    let mut groups: Vec<String> = relation.conditions.iter().map(|g| g.render()).collect();
    if let Some(window) = &relation.window {
        groups.push(window.condition().render());
    }
    if !groups.is_empty() {
        parts.push(format!("where {}", groups.join(" and ")));
    }

    let spec = &relation.group;
    let mut terms: Vec<String> = Vec::new();
    if let Some(bucket) = &spec.bucket {
        terms.push(format!("time({})", bucket.resolve()));
    }
    terms.extend(spec.terms.iter().cloned());
    if !terms.is_empty() {
        parts.push(format!("group by {}", unique(&terms).join(",")));
    }
    if let Some(fill) = &spec.fill {
        parts.push(format!("fill({})", fill));
    }

    if let Some(limit) = relation.limit {
        parts.push(format!("limit {}", limit));
    }
    if let Some(offset) = relation.offset {
        parts.push(format!("offset {}", offset));
    }

    parts
}

/// Drop repeated entries, keeping the first occurrence
fn unique(items: &[String]) -> Vec<&str> {
    let mut seen = std::collections::HashSet::new();
    items
        .iter()
        .map(String::as_str)
        .filter(|item| seen.insert(*item))
        .collect()
}
