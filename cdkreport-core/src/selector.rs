//! Stack selection by exact name, prefix, or wildcard.

use cdkreport_types::stack::StackDescriptor;
use std::fmt;
use tracing::{debug, warn};

/// Pattern that selects every stack.
pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Criterion {
    /// Matches a stack whose name equals or starts with the pattern.
    ExactOrPrefix(String),
    All,
}

impl Criterion {
    pub fn matches(&self, stack_name: &str) -> bool {
        match self {
            Criterion::All => true,
            Criterion::ExactOrPrefix(pattern) => stack_name.starts_with(pattern.as_str()),
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criterion::All => f.write_str(WILDCARD),
            Criterion::ExactOrPrefix(pattern) => f.write_str(pattern),
        }
    }
}

/// Selection criteria accumulated before a single batch fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackSelection {
    criteria: Vec<Criterion>,
}

impl StackSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn match_all() -> Self {
        Self {
            criteria: vec![Criterion::All],
        }
    }

    /// Build from patterns, treating an empty list as match-all.
    pub fn from_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selection = Self::new();
        for pattern in patterns {
            selection.add_criterion(pattern);
        }
        if selection.criteria.is_empty() {
            return Self::match_all();
        }
        selection
    }

    /// Register a pattern. A bare `*` registers [`Criterion::All`].
    pub fn add_criterion(&mut self, pattern: impl Into<String>) -> &mut Self {
        let pattern = pattern.into();
        let criterion = if pattern == WILDCARD {
            Criterion::All
        } else if pattern.is_empty() {
            warn!("ignoring empty stack pattern");
            return self;
        } else {
            Criterion::ExactOrPrefix(pattern)
        };

        if !self.criteria.contains(&criterion) {
            debug!(criterion = %criterion, "registered stack criterion");
            self.criteria.push(criterion);
        }
        self
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn matches(&self, stack_name: &str) -> bool {
        self.criteria.iter().any(|c| c.matches(stack_name))
    }

    /// Descriptors matching any criterion, in their original order.
    ///
    /// Empty when nothing matches or no criteria were registered.
    pub fn select(&self, all: &[StackDescriptor]) -> Vec<StackDescriptor> {
        all.iter()
            .filter(|s| self.matches(&s.name))
            .cloned()
            .collect()
    }
}
