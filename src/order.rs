//! Orders and order lines as delivered by upstream ingestion.

use crate::problem::normalize_location;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Product category used by the stacking compatibility rules.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Category(String);

impl Category {
    /// Create a category; labels are compared case-insensitively.
    pub fn new(label: &str) -> Self {
        let label = label.trim().to_ascii_uppercase();
        if label.is_empty() {
            Category("STANDARD".to_string())
        } else {
            Category(label)
        }
    }

    /// The normalized label.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Category {
    fn from(label: String) -> Self {
        Category::new(&label)
    }
}

impl From<&str> for Category {
    fn from(label: &str) -> Self {
        Category::new(label)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single product line of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    /// Identifier of the owning order
    #[serde(default)]
    pub order_id: String,
    pub product_id: String,
    /// Number of units
    pub quantity: u32,
    /// Floor length of one unit in feet
    pub unit_length_ft: f64,
    /// Largest number of these units that may share one floor position
    pub max_stack: u32,
    pub category: Category,
    #[serde(default)]
    pub destination: String,
    pub due_date: NaiveDate,
}

impl OrderLine {
    /// Create a new order line.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        order_id: &str,
        product_id: &str,
        quantity: u32,
        unit_length_ft: f64,
        max_stack: u32,
        category: &str,
        destination: &str,
        due_date: NaiveDate,
    ) -> Self {
        OrderLine {
            order_id: order_id.to_string(),
            product_id: product_id.to_string(),
            quantity,
            unit_length_ft,
            max_stack,
            category: Category::new(category),
            destination: normalize_location(destination),
            due_date,
        }
    }

    /// Max stack with the zero case treated as "no stacking".
    pub fn effective_max_stack(&self) -> u32 {
        self.max_stack.max(1)
    }
}

/// A delivery that always travels as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub origin: String,
    pub destination: String,
    /// Freight region used for the rate lookup; defaults to the destination
    #[serde(default)]
    pub region: Option<String>,
    /// Earliest due date across the lines
    pub due_date: NaiveDate,
    #[serde(default)]
    pub excluded: bool,
    pub lines: Vec<OrderLine>,
}

impl Order {
    /// Create an order from its lines.
    ///
    /// The due date is the earliest line due date, or `fallback_due` when
    /// there are no lines. Lines are re-tagged with this order's id and
    /// destination.
    pub fn new(
        id: &str,
        origin: &str,
        destination: &str,
        fallback_due: NaiveDate,
        lines: Vec<OrderLine>,
    ) -> Self {
        let destination = normalize_location(destination);
        let due_date = lines
            .iter()
            .map(|line| line.due_date)
            .min()
            .unwrap_or(fallback_due);
        let lines = lines
            .into_iter()
            .map(|mut line| {
                line.order_id = id.to_string();
                line.destination = destination.clone();
                line
            })
            .collect();

        Order {
            id: id.to_string(),
            origin: normalize_location(origin),
            destination,
            region: None,
            due_date,
            excluded: false,
            lines,
        }
    }

    /// Set the freight region.
    pub fn with_region(mut self, region: &str) -> Self {
        self.region = Some(normalize_location(region));
        self
    }

    /// Mark the order as excluded from optimization.
    pub fn with_excluded(mut self, excluded: bool) -> Self {
        self.excluded = excluded;
        self
    }

    /// Region used for freight rates.
    pub fn rate_region(&self) -> &str {
        self.region.as_deref().unwrap_or(&self.destination)
    }

    /// Total number of units across all lines.
    pub fn total_units(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }
}
