//! Version constraint filtering of search results
//!
//! Constraints follow the usual chart-repository syntax: comparators joined
//! by commas or spaces (`>=1.0.0 <2.0.0`), `||` alternatives, hyphen ranges
//! (`1.0 - 2.0`), wildcards (`1.2.x`) and exclusions (`!=1.5.0`). The
//! spellings `=>`, `=<` and `~>` are read as `>=`, `<=` and `~`.

use semver::{Version, VersionReq};
use std::collections::HashSet;

use crate::error::{RepoError, Result};
use crate::index::parse_version;
use crate::search::SearchResult;

/// A parsed version constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConstraint {
    alternatives: Vec<Alternative>,
}

/// One `||` branch
#[derive(Debug, Clone, PartialEq, Eq)]
struct Alternative {
    req: VersionReq,
    /// `semver` has no not-equal comparator
    excluded: Vec<VersionReq>,
}

impl Alternative {
    fn matches(&self, version: &Version) -> bool {
        self.req.matches(version) && !self.excluded.iter().any(|ex| ex.matches(version))
    }
}

impl VersionConstraint {
    /// Parse a constraint; `None` for an empty string
    pub fn parse(constraint: &str) -> Result<Option<Self>> {
        if constraint.trim().is_empty() {
            return Ok(None);
        }

        let alternatives = constraint
            .split("||")
            .map(|alt| {
                parse_alternative(alt).map_err(|message| RepoError::InvalidConstraint {
                    constraint: constraint.to_string(),
                    message,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(Self { alternatives }))
    }

    /// Whether a version string satisfies the constraint
    ///
    /// `None` when the version cannot be parsed.
    pub fn matches(&self, version: &str) -> Option<bool> {
        let version = parse_version(version)?;
        Some(self.alternatives.iter().any(|alt| alt.matches(&version)))
    }

    /// Filter sorted search results
    ///
    /// Results whose version cannot be parsed are kept. Unless `keep_all`
    /// is set only the first accepted result of each name survives; with
    /// results sorted newest first that is the newest matching version.
    pub fn apply(&self, results: Vec<SearchResult>, keep_all: bool) -> Vec<SearchResult> {
        let mut found = HashSet::new();
        results
            .into_iter()
            .filter(|r| {
                if found.contains(&r.name) {
                    return false;
                }
                let accepted = self.matches(&r.chart.version).unwrap_or(true);
                if accepted && !keep_all {
                    found.insert(r.name.clone());
                }
                accepted
            })
            .collect()
    }
}

/// Filter search results by a constraint string
///
/// An empty constraint passes everything through untouched.
pub fn apply_constraint(
    results: Vec<SearchResult>,
    constraint: &str,
    keep_all: bool,
) -> Result<Vec<SearchResult>> {
    match VersionConstraint::parse(constraint)? {
        Some(c) => Ok(c.apply(results, keep_all)),
        None => Ok(results),
    }
}

enum Operator<'a> {
    Require(&'a str),
    Exclude,
}

fn operator(op: &str) -> Operator<'_> {
    match op {
        "=>" => Operator::Require(">="),
        "=<" => Operator::Require("<="),
        "~>" => Operator::Require("~"),
        "!=" | "!" => Operator::Exclude,
        other => Operator::Require(other),
    }
}

/// Rewrite space-separated comparators and hyphen ranges into the
/// comma-separated form `semver` understands, setting exclusions aside
fn parse_alternative(alt: &str) -> std::result::Result<Alternative, String> {
    let tokens: Vec<&str> = alt
        .split([' ', ','])
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        return Err("empty constraint".to_string());
    }

    if let [low, "-", high] = tokens.as_slice() {
        return Ok(Alternative {
            req: parse_req(&format!(">={}, <={}", strip_v(low), strip_v(high)))?,
            excluded: Vec::new(),
        });
    }

    let mut comparators = Vec::new();
    let mut excluded = Vec::new();
    let mut pending_op = String::new();
    for token in tokens {
        let split = token.find(|c: char| !is_op_char(c)).unwrap_or(token.len());
        let (lead, version) = token.split_at(split);
        pending_op.push_str(lead);
        if version.is_empty() {
            continue;
        }

        let op = std::mem::take(&mut pending_op);
        let version = strip_v(version);
        match operator(&op) {
            Operator::Exclude => excluded.push(parse_req(&exact(version))?),
            // A bare version is an exact match, not a caret range
            Operator::Require("") => comparators.push(exact(version)),
            Operator::Require(op) => comparators.push(format!("{}{}", op, version)),
        }
    }
    if !pending_op.is_empty() {
        return Err(format!("operator {:?} without a version", pending_op));
    }

    let req = if comparators.is_empty() {
        VersionReq::STAR
    } else {
        parse_req(&comparators.join(", "))?
    };
    Ok(Alternative { req, excluded })
}

fn parse_req(req: &str) -> std::result::Result<VersionReq, String> {
    VersionReq::parse(req).map_err(|e| e.to_string())
}

fn exact(version: &str) -> String {
    if is_wildcard(version) {
        version.to_string()
    } else {
        format!("={}", version)
    }
}

fn is_wildcard(version: &str) -> bool {
    version.split('.').any(|part| matches!(part, "*" | "x" | "X"))
}

fn is_op_char(c: char) -> bool {
    matches!(c, '<' | '>' | '=' | '~' | '^' | '!')
}

fn strip_v(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}
