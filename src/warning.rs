//! Warnings surfaced to the planner.
//!
//! Nothing in a run fails because of bad data or a violated constraint; the
//! affected order or load carries a warning instead.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How strongly a warning constrains the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Shown for awareness only.
    Info,
    /// Needs a planner's look but does not block the load.
    Advisory,
    /// The load must not be accepted as-is.
    Hard,
}

/// What a warning is about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WarningKind {
    /// A no-mix category shares the trailer with other categories.
    NoMixCategory { category: String },
    /// A position stacks more units than the stability ceiling.
    UnstableStack { position: usize, units: u32, ceiling: u32 },
    /// A trailer-floor category is mixed with other categories.
    FloorTypeMix { category: String },
    /// The deck layout overflows although total floor length fits.
    DeckOverflow { lower_ft: f64, upper_ft: f64 },
    /// A location has no coordinates.
    UnknownLocation { location: String },
    /// No freight rate is on file for a lane; the default was used.
    MissingRate { origin: String, region: String, default_rate: f64 },
    /// An order needs more floor than one trailer offers.
    OversizedOrder { order_id: String, linear_feet: f64, capacity_ft: f64 },
    /// An order arrived without any lines to ship.
    EmptyOrder { order_id: String },
}

/// A warning attached to an order or a load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    pub severity: Severity,
    #[serde(flatten)]
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// Create a warning; the message is derived from the kind.
    pub fn new(severity: Severity, kind: WarningKind) -> Self {
        let message = describe(&kind);
        Warning {
            severity,
            kind,
            message,
        }
    }

    /// Hard incompatibility.
    pub fn hard(kind: WarningKind) -> Self {
        Warning::new(Severity::Hard, kind)
    }

    /// Advisory warning.
    pub fn advisory(kind: WarningKind) -> Self {
        Warning::new(Severity::Advisory, kind)
    }

    /// Informational note.
    pub fn info(kind: WarningKind) -> Self {
        Warning::new(Severity::Info, kind)
    }

    /// Check if this warning blocks a load.
    pub fn is_hard(&self) -> bool {
        self.severity == Severity::Hard
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.severity, self.message)
    }
}

fn describe(kind: &WarningKind) -> String {
    match kind {
        WarningKind::NoMixCategory { category } => {
            format!("{} freight cannot share a trailer with other categories", category)
        }
        WarningKind::UnstableStack {
            position,
            units,
            ceiling,
        } => format!(
            "Position {}: stack of {} units exceeds the stability ceiling of {}",
            position + 1,
            units,
            ceiling
        ),
        WarningKind::FloorTypeMix { category } => {
            format!("Mix includes {} floor freight; verify compatibility", category)
        }
        WarningKind::DeckOverflow { lower_ft, upper_ft } => format!(
            "Deck layout overflows (lower {:.1} ft, upper {:.1} ft)",
            lower_ft, upper_ft
        ),
        WarningKind::UnknownLocation { location } => {
            format!("No coordinates for location {}", location)
        }
        WarningKind::MissingRate {
            origin,
            region,
            default_rate,
        } => format!(
            "No rate for lane {} -> {}; using default ${:.2}/mile",
            origin, region, default_rate
        ),
        WarningKind::OversizedOrder {
            order_id,
            linear_feet,
            capacity_ft,
        } => format!(
            "Order {} needs {:.1} ft, more than the {:.1} ft trailer; split decision required",
            order_id, linear_feet, capacity_ft
        ),
        WarningKind::EmptyOrder { order_id } => {
            format!("Order {} has no lines and was not planned", order_id)
        }
    }
}

/// Check whether any warning in the list is a hard incompatibility.
pub fn has_hard(warnings: &[Warning]) -> bool {
    warnings.iter().any(Warning::is_hard)
}
