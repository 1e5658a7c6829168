//! Diff engine: previous vs desired sub-resource collections.
//!
//! Everything here is pure. Invariant violations are reported before
//! the caller has touched the remote store.

use indexmap::{IndexMap, IndexSet};

use fdsync_core::{resolve_name, EntityType, EventType, EventVariable, Label, NamedResource, Outcome, Rule};

use crate::error::{ReconcileError, Result};

// ── Children ──────────────────────────────────────────────────

/// A sub-resource that is either inline or referenced.
pub trait Child: Clone {
    fn is_inline(&self) -> bool;
    fn declared_name(&self) -> Option<&str>;
    fn declared_arn(&self) -> Option<&str>;

    fn resolved_name(&self) -> Option<String> {
        resolve_name(self.is_inline(), self.declared_name(), self.declared_arn())
    }
}

impl Child for NamedResource {
    fn is_inline(&self) -> bool {
        self.inline
    }
    fn declared_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
    fn declared_arn(&self) -> Option<&str> {
        self.arn.as_deref()
    }
}

impl Child for EventVariable {
    fn is_inline(&self) -> bool {
        self.inline
    }
    fn declared_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
    fn declared_arn(&self) -> Option<&str> {
        self.arn.as_deref()
    }
}

impl Child for EventType {
    fn is_inline(&self) -> bool {
        self.inline
    }
    fn declared_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
    fn declared_arn(&self) -> Option<&str> {
        self.arn.as_deref()
    }
}

fn keyed<T: Child>(kind: &str, items: &[T]) -> Result<IndexMap<String, T>> {
    let mut map = IndexMap::with_capacity(items.len());
    for item in items {
        let name = item
            .resolved_name()
            .ok_or_else(|| ReconcileError::invalid(format!("{kind} requires a Name or Arn")))?;
        if map.insert(name.clone(), item.clone()).is_some() {
            return Err(ReconcileError::invalid(format!("duplicate {kind} '{name}'")));
        }
    }
    Ok(map)
}

/// Per-collection side-effect plan, keyed by resolved name.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionDiff<T> {
    /// Inline now and not inline-managed before.
    pub create: Vec<(String, T)>,
    /// Inline before and now: `(name, desired, previous)`.
    pub persist: Vec<(String, T, T)>,
    /// Referenced now; existence-checked only.
    pub referenced: Vec<String>,
    /// Inline before and absent now.
    pub delete: Vec<String>,
}

impl<T> Default for CollectionDiff<T> {
    fn default() -> Self {
        Self {
            create: Vec::new(),
            persist: Vec::new(),
            referenced: Vec::new(),
            delete: Vec::new(),
        }
    }
}

pub fn diff_collection<T: Child>(kind: &str, desired: &[T], previous: &[T]) -> Result<CollectionDiff<T>> {
    let desired = keyed(kind, desired)?;
    let previous = keyed(kind, previous)?;
    let mut diff = CollectionDiff::default();

    for (name, item) in &desired {
        if !item.is_inline() {
            diff.referenced.push(name.clone());
            continue;
        }
        match previous.get(name) {
            Some(prev) if prev.is_inline() => {
                diff.persist.push((name.clone(), item.clone(), prev.clone()))
            }
            _ => diff.create.push((name.clone(), item.clone())),
        }
    }

    diff.delete = previous
        .iter()
        .filter(|(name, prev)| prev.is_inline() && !desired.contains_key(*name))
        .map(|(name, _)| name.clone())
        .collect();

    Ok(diff)
}

// ── Event variables ───────────────────────────────────────────

/// Immutability rules for event variables across an update.
pub fn check_variables(desired: &[EventVariable], previous: &[EventVariable]) -> Result<()> {
    let desired = keyed("event variable", desired)?;
    let previous = keyed("event variable", previous)?;

    let removed: Vec<&str> = previous
        .keys()
        .filter(|name| !desired.contains_key(*name))
        .map(String::as_str)
        .collect();
    if !removed.is_empty() {
        return Err(ReconcileError::invalid(format!(
            "cannot remove event variables: {}",
            removed.join(", ")
        )));
    }

    for (name, item) in &desired {
        let Some(prev) = previous.get(name) else {
            continue;
        };
        if item.inline && !prev.inline {
            return Err(ReconcileError::invalid(format!(
                "event variable '{name}' cannot change from referenced to inline"
            )));
        }
        if !(item.inline && prev.inline) {
            continue;
        }
        if item.data_source != prev.data_source {
            return Err(ReconcileError::invalid(format!(
                "event variable '{name}': DataSource cannot be changed"
            )));
        }
        if item.data_type != prev.data_type {
            return Err(ReconcileError::invalid(format!(
                "event variable '{name}': DataType cannot be changed"
            )));
        }
        if let (Some(before), Some(after)) = (&prev.variable_type, &item.variable_type) {
            if before != after {
                return Err(ReconcileError::invalid(format!(
                    "event variable '{name}': VariableType cannot be changed once set"
                )));
            }
        }
    }
    Ok(())
}

fn check_new_variable(name: &str, variable: &EventVariable) -> Result<()> {
    let complete = variable.data_source.is_some()
        && variable.data_type.is_some()
        && variable.default_value.is_some();
    if complete {
        Ok(())
    } else {
        Err(ReconcileError::invalid(format!(
            "inline event variable '{name}' requires DataSource, DataType and DefaultValue"
        )))
    }
}

// ── Event type ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct EventTypePlan {
    pub name: String,
    pub desired: EventType,
    pub entity_types: CollectionDiff<EntityType>,
    pub labels: CollectionDiff<Label>,
    pub variables: CollectionDiff<EventVariable>,
}

impl EventTypePlan {
    pub fn is_inline(&self) -> bool {
        self.desired.inline
    }
}

/// Names of an event type's children in declaration order.
pub fn child_names<T: Child>(items: &[T]) -> Vec<String> {
    items.iter().filter_map(Child::resolved_name).collect()
}

/// Plan the event type subtree. `previous` is `None` on create.
pub fn plan_event_type(desired: &EventType, previous: Option<&EventType>) -> Result<EventTypePlan> {
    let name = desired
        .resolved_name()
        .ok_or_else(|| ReconcileError::invalid("EventType requires a Name or Arn"))?;

    if let Some(prev) = previous {
        let prev_name = prev.resolved_name();
        if prev_name.as_deref() != Some(name.as_str()) {
            return Err(ReconcileError::invalid(format!(
                "EventType name cannot change from '{}' to '{name}'",
                prev_name.unwrap_or_default()
            )));
        }
        if prev.inline != desired.inline {
            return Err(ReconcileError::invalid(format!(
                "EventType '{name}' cannot change between inline and referenced"
            )));
        }
    }

    let mut plan = EventTypePlan {
        name,
        desired: desired.clone(),
        entity_types: CollectionDiff::default(),
        labels: CollectionDiff::default(),
        variables: CollectionDiff::default(),
    };
    if !desired.inline {
        return Ok(plan);
    }

    let empty = EventType::default();
    let prev = previous.unwrap_or(&empty);
    if previous.is_some() {
        check_variables(&desired.event_variables, &prev.event_variables)?;
    }

    plan.entity_types = diff_collection("entity type", &desired.entity_types, &prev.entity_types)?;
    plan.labels = diff_collection("label", &desired.labels, &prev.labels)?;
    plan.variables = diff_collection("event variable", &desired.event_variables, &prev.event_variables)?;
    for (name, variable) in &plan.variables.create {
        check_new_variable(name, variable)?;
    }
    Ok(plan)
}

// ── Rules and outcomes ────────────────────────────────────────

/// Outcome side effects across all rules of a detector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutcomePlan {
    /// Inline now, not inline before.
    pub create: IndexMap<String, Outcome>,
    /// Inline before and now; re-put for description and tag changes.
    pub refresh: IndexMap<String, Outcome>,
    pub referenced: IndexSet<String>,
    /// Inline before, not used by any desired rule.
    pub delete: IndexSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RulePlan {
    pub create: Vec<Rule>,
    pub persist: Vec<Rule>,
    /// Rule ids no longer desired.
    pub delete: Vec<String>,
    /// Desired rule ids in declaration order.
    pub order: Vec<String>,
    pub outcomes: OutcomePlan,
}

struct OutcomeUse {
    inline: IndexMap<String, Outcome>,
    referenced: IndexSet<String>,
}

fn outcome_use(rules: &[Rule]) -> Result<OutcomeUse> {
    let mut inline = IndexMap::new();
    let mut referenced = IndexSet::new();
    for rule in rules {
        for outcome in &rule.outcomes {
            let name = outcome.resolved_name().ok_or_else(|| {
                ReconcileError::invalid(format!(
                    "outcome in rule '{}' requires a Name or Arn",
                    rule.rule_id
                ))
            })?;
            if outcome.inline {
                inline.entry(name).or_insert_with(|| outcome.clone());
            } else {
                referenced.insert(name);
            }
        }
    }
    referenced.retain(|name| !inline.contains_key(name));
    Ok(OutcomeUse { inline, referenced })
}

/// Names of a rule's outcomes in declaration order.
pub fn outcome_names(rule: &Rule) -> Vec<String> {
    child_names(&rule.outcomes)
}

pub fn plan_rules(detector_id: &str, desired: &[Rule], previous: &[Rule]) -> Result<RulePlan> {
    let mut desired_by_id: IndexMap<&str, &Rule> = IndexMap::new();
    for rule in desired {
        if rule.rule_id.is_empty() {
            return Err(ReconcileError::invalid("rule requires a RuleId"));
        }
        if rule.detector_id != detector_id {
            return Err(ReconcileError::invalid(format!(
                "rule '{}' names detector '{}' but belongs to '{detector_id}'",
                rule.rule_id, rule.detector_id
            )));
        }
        if desired_by_id.insert(rule.rule_id.as_str(), rule).is_some() {
            return Err(ReconcileError::invalid(format!("duplicate rule '{}'", rule.rule_id)));
        }
    }
    let previous_by_id: IndexMap<&str, &Rule> =
        previous.iter().map(|r| (r.rule_id.as_str(), r)).collect();

    let mut plan = RulePlan::default();
    for (id, rule) in &desired_by_id {
        plan.order.push(id.to_string());
        if previous_by_id.contains_key(id) {
            plan.persist.push((*rule).clone());
        } else {
            plan.create.push((*rule).clone());
        }
    }
    plan.delete = previous_by_id
        .keys()
        .filter(|id| !desired_by_id.contains_key(*id))
        .map(|id| id.to_string())
        .collect();

    let now = outcome_use(desired)?;
    let before = outcome_use(previous)?;
    for (name, outcome) in now.inline {
        if before.inline.contains_key(&name) {
            plan.outcomes.refresh.insert(name, outcome);
        } else {
            plan.outcomes.create.insert(name, outcome);
        }
    }
    plan.outcomes.referenced = now.referenced;
    plan.outcomes.delete = before
        .inline
        .into_keys()
        .filter(|name| {
            !plan.outcomes.create.contains_key(name)
                && !plan.outcomes.refresh.contains_key(name)
                && !plan.outcomes.referenced.contains(name)
        })
        .collect();

    Ok(plan)
}
