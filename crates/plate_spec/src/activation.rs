//! Section activation.
//!
//! Required sections are always active. Any other section activates once all
//! of its `needs` are active and its toggle variable, if it has one, is known
//! and true. Activation only ever adds sections, so iterating to a fixed point
//! terminates within `sections + 1` rounds.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::collection::Collection;
use crate::error::{SpecError, SpecResult};
use crate::validator::parse_bool;
use crate::value::RawValue;

/// Outcome of one activation pass, each list in collection order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Activation {
    pub active: Vec<String>,
    /// Needs are met but the toggle value is not known yet.
    pub pending: Vec<String>,
    pub inactive: Vec<String>,
}

impl Activation {
    pub fn is_active(&self, section: &str) -> bool {
        self.active.iter().any(|s| s == section)
    }

    pub fn is_pending(&self, section: &str) -> bool {
        self.pending.iter().any(|s| s == section)
    }
}

/// Computes the active section set from currently known values.
pub struct ActivationEngine;

impl ActivationEngine {
    /// Run activation to its fixed point.
    pub fn activate(
        collection: &Collection,
        known: &HashMap<String, RawValue>,
    ) -> SpecResult<Activation> {
        let sections = collection.sections();
        let mut active: Vec<bool> = sections.iter().map(|s| s.required).collect();

        let mut rounds = 0;
        loop {
            if rounds > sections.len() {
                return Err(SpecError::CircularSectionDependency {
                    cycle: sections
                        .iter()
                        .zip(&active)
                        .filter(|(_, a)| !**a)
                        .map(|(s, _)| s.name.clone())
                        .collect(),
                });
            }
            rounds += 1;

            let mut changed = false;
            for (idx, section) in sections.iter().enumerate() {
                if active[idx] {
                    continue;
                }
                if !needs_met(collection, &active, &section.needs) {
                    continue;
                }
                let enabled = match &section.toggle {
                    None => true,
                    Some(toggle) => known.get(toggle).is_some_and(is_true),
                };
                if enabled {
                    debug!("Activating section '{}'", section.name);
                    active[idx] = true;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        let mut activation = Activation::default();
        for (idx, section) in sections.iter().enumerate() {
            if active[idx] {
                activation.active.push(section.name.clone());
                continue;
            }
            let toggle_unknown = section
                .toggle
                .as_ref()
                .is_some_and(|t| !known.contains_key(t));
            if toggle_unknown && needs_met(collection, &active, &section.needs) {
                activation.pending.push(section.name.clone());
            } else {
                activation.inactive.push(section.name.clone());
            }
        }

        debug!(
            "Activation: {} active, {} pending, {} inactive",
            activation.active.len(),
            activation.pending.len(),
            activation.inactive.len()
        );
        Ok(activation)
    }
}

fn needs_met(collection: &Collection, active: &[bool], needs: &[String]) -> bool {
    needs.iter().all(|need| {
        collection
            .sections()
            .iter()
            .position(|s| s.name == *need)
            .is_some_and(|idx| active[idx])
    })
}

fn is_true(value: &RawValue) -> bool {
    match value {
        RawValue::Bool(b) => *b,
        RawValue::Integer(n) => *n == 1,
        RawValue::Float(_) => false,
        RawValue::Text(s) => parse_bool(s).unwrap_or(false),
    }
}
