//! Stacking compatibility rules for lines sharing a trailer.

use crate::config::CompatibilityRules;
use crate::order::{Category, OrderLine};
use crate::stack::StackPosition;
use crate::warning::{Warning, WarningKind};
use std::collections::BTreeSet;

/// Evaluates whether a group of lines may ride on one trailer.
///
/// All rules run independently and every finding is reported:
/// - a no-mix category alongside any other category is a hard
///   incompatibility,
/// - a position stacked above the stability ceiling is an advisory,
/// - a trailer-floor category mixed with other categories is informational.
#[derive(Debug, Clone)]
pub struct CompatibilityChecker<'a> {
    rules: &'a CompatibilityRules,
}

impl<'a> CompatibilityChecker<'a> {
    /// Create a checker for a rule set.
    pub fn new(rules: &'a CompatibilityRules) -> Self {
        CompatibilityChecker { rules }
    }

    /// Category-level checks over a set of lines.
    pub fn check(&self, lines: &[OrderLine]) -> Vec<Warning> {
        let categories: BTreeSet<&Category> = lines.iter().map(|line| &line.category).collect();
        let mut warnings = Vec::new();

        if categories.len() > 1 {
            for category in &categories {
                if self.rules.no_mix_categories.contains(*category) {
                    warnings.push(Warning::hard(WarningKind::NoMixCategory {
                        category: category.to_string(),
                    }));
                }
            }
            for category in &categories {
                if self.rules.floor_type_categories.contains(*category) {
                    warnings.push(Warning::info(WarningKind::FloorTypeMix {
                        category: category.to_string(),
                    }));
                }
            }
        }

        warnings
    }

    /// Stack stability check over packed positions.
    pub fn check_positions(&self, positions: &[StackPosition]) -> Vec<Warning> {
        let ceiling = self.rules.stack_height_ceiling;
        positions
            .iter()
            .enumerate()
            .filter(|(_, position)| position.units_count > ceiling)
            .map(|(idx, position)| {
                Warning::advisory(WarningKind::UnstableStack {
                    position: idx,
                    units: position.units_count,
                    ceiling,
                })
            })
            .collect()
    }

    /// Run every rule against lines and their packed positions.
    pub fn check_load(&self, lines: &[OrderLine], positions: &[StackPosition]) -> Vec<Warning> {
        let mut warnings = self.check(lines);
        warnings.extend(self.check_positions(positions));
        warnings
    }

    /// Check if the lines may share a trailer at all.
    pub fn is_compatible(&self, lines: &[OrderLine]) -> bool {
        !self.check(lines).iter().any(Warning::is_hard)
    }
}
