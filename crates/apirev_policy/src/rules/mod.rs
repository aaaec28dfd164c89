//! Rule registry.
//!
//! A rule is a plain function over a [`RuleContext`]. Rules share no state;
//! each returns the issues it found and the engine appends them in registry
//! order.

use std::fmt;

use apirev_doc::{DocNode, Document};
use serde::Serialize;

use crate::api_type::ApiType;
use crate::error::PolicyResult;
use crate::issue::Issue;
use crate::policy::{CommonalitiesPolicy, Conventions};

mod conventions;
mod structural;
mod subscription;
mod version;

/// Rule groups, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleGroup {
    Structural,
    Policy,
    VersionSpecific,
    TypeSpecific,
}

/// Everything a check may read.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub document: &'a Document,
    pub api_type: ApiType,
    pub conventions: &'a Conventions,
}

impl<'a> RuleContext<'a> {
    pub fn root(&self) -> &'a DocNode {
        self.document.root()
    }

    pub fn policy(&self) -> &'a CommonalitiesPolicy {
        self.conventions.policy()
    }
}

/// Signature shared by every check.
pub type CheckFn = fn(&RuleContext<'_>) -> PolicyResult<Vec<Issue>>;

/// A registered check.
#[derive(Clone)]
pub struct Rule {
    id: &'static str,
    /// Recorded in `checks_performed` when the rule runs.
    name: &'static str,
    group: RuleGroup,
    applies_to: Option<ApiType>,
    check: CheckFn,
}

impl Rule {
    pub fn new(id: &'static str, name: &'static str, group: RuleGroup, check: CheckFn) -> Self {
        Self {
            id,
            name,
            group,
            applies_to: None,
            check,
        }
    }

    /// Restrict the rule to one API type.
    pub fn only_for(mut self, api_type: ApiType) -> Self {
        self.applies_to = Some(api_type);
        self
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> RuleGroup {
        self.group
    }

    pub fn applies(&self, api_type: ApiType) -> bool {
        self.applies_to.map_or(true, |t| t == api_type)
    }

    pub fn run(&self, ctx: &RuleContext<'_>) -> PolicyResult<Vec<Issue>> {
        (self.check)(ctx)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("group", &self.group)
            .field("applies_to", &self.applies_to)
            .finish()
    }
}

/// An ordered set of rules.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the standard commonalities rule set.
    pub fn standard() -> Self {
        let mut set = Self::new();
        for rule in structural::rules()
            .into_iter()
            .chain(conventions::rules())
            .chain(version::rules())
            .chain(subscription::rules())
        {
            set.add(rule);
        }
        set
    }

    /// Add a rule after every rule of the same or an earlier group.
    pub fn add(&mut self, rule: Rule) {
        let at = self
            .rules
            .iter()
            .position(|r| r.group > rule.group)
            .unwrap_or(self.rules.len());
        self.rules.insert(at, rule);
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
