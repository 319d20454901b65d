//! Picks one server out of a stack from a loose selector.
//!
//! A selector may be an address (`52.65.34.98`), the start of a server name
//! (`li` for `lion`) or a role (`web`). All comparisons ignore case.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

use crate::error::{Error, Result};
use crate::models::{Server, Stack};

pub fn resolve<'a>(servers: &'a [Server], selector: &str) -> Result<&'a Server> {
    let needle = selector.trim().to_lowercase();
    if needle.is_empty() {
        return Err(Error::Usage("Server selector cannot be empty".into()));
    }

    if let Some(server) = servers
        .iter()
        .find(|s| s.address.to_lowercase() == needle)
    {
        tracing::debug!(server = %server.uid, "matched by address");
        return Ok(server);
    }

    let prefixed: Vec<&Server> = servers
        .iter()
        .filter(|s| s.name.to_lowercase().starts_with(&needle))
        .collect();

    match prefixed.as_slice() {
        [only] => {
            tracing::debug!(server = %only.uid, "matched by name");
            return Ok(*only);
        }
        [] => {}
        many => {
            if let Some(exact) = many.iter().find(|s| s.name.to_lowercase() == needle) {
                tracing::debug!(server = %exact.uid, "matched by exact name");
                return Ok(*exact);
            }
        }
    }

    if let Some(server) = servers.iter().find(|s| {
        s.role
            .as_deref()
            .is_some_and(|role| role.to_lowercase() == needle)
    }) {
        tracing::debug!(server = %server.uid, "matched by role");
        return Ok(server);
    }

    if prefixed.len() > 1 {
        return Err(Error::AmbiguousSelector {
            selector: selector.to_string(),
            candidates: prefixed.iter().map(|s| s.name.clone()).collect(),
        });
    }

    Err(Error::ServerNotFound {
        selector: selector.to_string(),
        suggestion: closest_name(servers, selector),
    })
}

/// Best fuzzy match among server names, used only for error messages.
fn closest_name(servers: &[Server], selector: &str) -> Option<String> {
    let matcher = SkimMatcherV2::default().ignore_case();
    servers
        .iter()
        .filter_map(|s| {
            matcher
                .fuzzy_match(&s.name, selector)
                .map(|score| (score, &s.name))
        })
        .max_by_key(|(score, _)| *score)
        .map(|(_, name)| name.clone())
}

/// Finds a stack by uid or by case-insensitive name, optionally narrowed to
/// one environment. Same-named stacks that remain are an error.
pub fn resolve_stack<'a>(
    stacks: &'a [Stack],
    selector: &str,
    environment: Option<&str>,
) -> Result<&'a Stack> {
    let needle = selector.trim().to_lowercase();
    let wanted_env = environment.map(|e| e.trim().to_lowercase());
    let in_environment = |stack: &Stack| match &wanted_env {
        Some(env) => stack
            .environment
            .as_deref()
            .is_some_and(|e| e.to_lowercase() == *env),
        None => true,
    };

    if let Some(stack) = stacks.iter().find(|s| s.uid == selector && in_environment(*s)) {
        return Ok(stack);
    }

    let named: Vec<&Stack> = stacks
        .iter()
        .filter(|s| s.name.to_lowercase() == needle && in_environment(*s))
        .collect();

    match named.as_slice() {
        [only] => Ok(*only),
        [] => Err(Error::StackNotFound(match environment {
            Some(env) => format!("{} ({})", selector, env),
            None => selector.to_string(),
        })),
        many => Err(Error::AmbiguousStack {
            name: selector.to_string(),
            environments: many
                .iter()
                .map(|s| s.environment.clone().unwrap_or_else(|| "unknown".into()))
                .collect(),
        }),
    }
}
