//! Rule store
//!
//! Owns every configured rule. Rules are never edited in place: a change is a
//! deactivation followed by a new rule.

use super::types::{Rule, RuleId, SubjectId};
use crate::error::ValidationError;
use std::collections::BTreeSet;
use std::sync::RwLock;

struct RuleTable {
    rules: Vec<Rule>,
    next_id: RuleId,
}

/// Thread-safe rule store
pub struct RuleStore {
    table: RwLock<RuleTable>,
}

impl RuleStore {
    /// Create an empty store; the first rule gets id 1
    pub fn new() -> Self {
        Self {
            table: RwLock::new(RuleTable {
                rules: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Create an active rule
    ///
    /// The strategy tag is only checked for emptiness; whether a strategy is registered
    /// for it is decided at evaluation time.
    pub fn create(
        &self,
        subject_id: SubjectId,
        strategy: &str,
        parameter: &str,
    ) -> Result<RuleId, ValidationError> {
        let strategy = strategy.trim();
        if strategy.is_empty() {
            return Err(ValidationError::EmptyStrategyTag);
        }

        let mut table = self.table.write().unwrap_or_else(|e| e.into_inner());
        let id = table.next_id;
        table.next_id += 1;

        let rule = Rule::new(id, subject_id, strategy, parameter);
        log::info!("Rule created: {}", rule);
        table.rules.push(rule);

        Ok(id)
    }

    /// Deactivate a rule; false if the id is unknown
    pub fn deactivate(&self, rule_id: RuleId) -> bool {
        let mut table = self.table.write().unwrap_or_else(|e| e.into_inner());
        match table.rules.iter_mut().find(|r| r.id == rule_id) {
            Some(rule) => {
                rule.active = false;
                log::info!("Rule {} deactivated", rule_id);
                true
            }
            None => false,
        }
    }

    /// Rule by id
    pub fn get(&self, rule_id: RuleId) -> Option<Rule> {
        let table = self.table.read().unwrap_or_else(|e| e.into_inner());
        table.rules.iter().find(|r| r.id == rule_id).cloned()
    }

    /// All rules of a subject, active or not, in creation order
    pub fn by_subject(&self, subject_id: SubjectId) -> Vec<Rule> {
        let table = self.table.read().unwrap_or_else(|e| e.into_inner());
        table
            .rules
            .iter()
            .filter(|r| r.subject_id == subject_id)
            .cloned()
            .collect()
    }

    /// All active rules in creation order
    pub fn active_rules(&self) -> Vec<Rule> {
        let table = self.table.read().unwrap_or_else(|e| e.into_inner());
        table.rules.iter().filter(|r| r.active).cloned().collect()
    }

    /// Every rule ever created
    pub fn all(&self) -> Vec<Rule> {
        self.table
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .rules
            .clone()
    }

    /// Subjects with at least one active rule, ascending
    pub fn subjects_with_active_rules(&self) -> Vec<SubjectId> {
        let table = self.table.read().unwrap_or_else(|e| e.into_inner());
        table
            .rules
            .iter()
            .filter(|r| r.active)
            .map(|r| r.subject_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.table.read().unwrap_or_else(|e| e.into_inner()).rules.len()
    }

    /// Whether the store holds no rules
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new()
    }
}
