//! Stack packing of order lines into trailer floor positions.
//!
//! A position is one floor slot of a given unit length. Units of different
//! lines may share a position as long as their summed occupancy fraction
//! (`units / max_stack` per line) stays within 1.0. Positions never mix unit
//! lengths.
//!
//! Giving every order line its own position under-packs badly: two lines of
//! two 4-high units each need one position, not two. The packer therefore
//! keeps the last position of a length group open and lets the next line top
//! it up.

use crate::config::TrailerType;
use crate::order::{Category, OrderLine};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A position at or above this occupancy is treated as full.
pub const FULL_THRESHOLD: f64 = 0.99;

/// Tolerance for floating point comparisons on occupancy and feet.
pub const EPSILON: f64 = 1e-9;

/// Deck a position rides on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Deck {
    #[default]
    Lower,
    Upper,
}

/// Units of one order line placed in a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionAllocation {
    pub order_id: String,
    pub product_id: String,
    pub category: Category,
    pub units: u32,
    pub max_stack: u32,
}

impl PositionAllocation {
    /// Share of the position these units occupy.
    pub fn fraction(&self) -> f64 {
        f64::from(self.units) / f64::from(self.max_stack.max(1))
    }
}

/// One floor slot on the trailer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackPosition {
    /// Unit length shared by every allocation in this position
    pub length_ft: f64,
    pub allocations: Vec<PositionAllocation>,
    /// Summed occupancy fraction, at most 1.0 + [`EPSILON`]
    pub capacity_used: f64,
    /// Total units stacked here
    pub units_count: u32,
    pub deck: Deck,
}

impl StackPosition {
    /// Open an empty position.
    pub fn new(length_ft: f64) -> Self {
        StackPosition {
            length_ft,
            allocations: Vec::new(),
            capacity_used: 0.0,
            units_count: 0,
            deck: Deck::Lower,
        }
    }

    /// Whole units of a line with `max_stack` that still fit.
    pub fn units_that_fit(&self, max_stack: u32) -> u32 {
        let available = (1.0 - self.capacity_used).max(0.0);
        (available * f64::from(max_stack.max(1)) + EPSILON).floor() as u32
    }

    /// Check whether the position is considered full.
    pub fn is_full(&self) -> bool {
        self.capacity_used >= FULL_THRESHOLD
    }

    /// Remaining occupancy fraction.
    pub fn remaining_capacity(&self) -> f64 {
        (1.0 - self.capacity_used).max(0.0)
    }

    fn allocate(&mut self, line: &OrderLine, units: u32) {
        let allocation = PositionAllocation {
            order_id: line.order_id.clone(),
            product_id: line.product_id.clone(),
            category: line.category.clone(),
            units,
            max_stack: line.effective_max_stack(),
        };
        self.capacity_used += allocation.fraction();
        self.units_count += units;
        self.allocations.push(allocation);
    }
}

/// Deck usage of a packed trailer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeckLayout {
    pub trailer_type: TrailerType,
    pub lower_capacity_ft: f64,
    pub upper_capacity_ft: f64,
    pub lower_used_ft: f64,
    pub upper_used_ft: f64,
}

impl DeckLayout {
    /// Check whether either deck is over its length.
    pub fn overflows(&self) -> bool {
        self.lower_used_ft > self.lower_capacity_ft + EPSILON
            || self.upper_used_ft > self.upper_capacity_ft + EPSILON
    }
}

/// Outcome of packing a set of order lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackResult {
    pub positions: Vec<StackPosition>,
    pub total_linear_feet: f64,
    pub max_units_in_any_position: u32,
    /// Present once decks have been assigned
    pub deck_layout: Option<DeckLayout>,
}

impl PackResult {
    /// Utilization of the trailer floor in percent.
    pub fn utilization_pct(&self, capacity_ft: f64) -> f64 {
        if capacity_ft <= 0.0 {
            return 0.0;
        }
        self.total_linear_feet / capacity_ft * 100.0
    }

    /// Floor feet weighted by how full each position is.
    pub fn credit_feet(&self) -> f64 {
        self.positions
            .iter()
            .map(|position| position.length_ft * position.capacity_used.min(1.0))
            .sum()
    }

    /// Number of floor positions.
    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    /// Check whether the packed floor exceeds a trailer length.
    pub fn exceeds(&self, capacity_ft: f64) -> bool {
        self.total_linear_feet > capacity_ft + EPSILON
    }

    /// Place positions onto the decks of a trailer.
    ///
    /// Positions short enough for the upper deck go there, longest first,
    /// until the upper deck is used up; everything else rides low.
    pub fn assign_decks(&mut self, trailer_type: TrailerType, capacity_ft: f64) {
        let (lower_capacity_ft, upper_capacity_ft) = trailer_type.deck_lengths(capacity_ft);

        for position in &mut self.positions {
            position.deck = Deck::Lower;
        }

        if upper_capacity_ft > 0.0 {
            let candidates: Vec<usize> = self
                .positions
                .iter()
                .enumerate()
                .filter(|(_, position)| position.length_ft <= upper_capacity_ft + EPSILON)
                .sorted_by(|(_, a), (_, b)| b.length_ft.total_cmp(&a.length_ft))
                .map(|(idx, _)| idx)
                .collect();

            let mut remaining = upper_capacity_ft;
            for idx in candidates {
                let position = &mut self.positions[idx];
                if position.length_ft <= remaining + EPSILON {
                    position.deck = Deck::Upper;
                    remaining -= position.length_ft;
                }
            }
        }

        let (upper_used_ft, lower_used_ft) = self
            .positions
            .iter()
            .partition::<Vec<&StackPosition>, _>(|position| position.deck == Deck::Upper);

        self.deck_layout = Some(DeckLayout {
            trailer_type,
            lower_capacity_ft,
            upper_capacity_ft,
            lower_used_ft: lower_used_ft.iter().map(|p| p.length_ft).sum(),
            upper_used_ft: upper_used_ft.iter().map(|p| p.length_ft).sum(),
        });
    }
}

/// Letter grade for a utilization percentage.
pub fn utilization_grade(utilization_pct: f64) -> char {
    match utilization_pct {
        pct if pct >= 85.0 => 'A',
        pct if pct >= 70.0 => 'B',
        pct if pct >= 55.0 => 'C',
        pct if pct >= 40.0 => 'D',
        _ => 'F',
    }
}

/// Floor feet needed when every line gets positions of its own.
pub fn naive_linear_feet(lines: &[OrderLine]) -> f64 {
    lines
        .iter()
        .map(|line| {
            let max_stack = line.effective_max_stack();
            let positions = (line.quantity + max_stack - 1) / max_stack;
            f64::from(positions) * line.unit_length_ft
        })
        .sum()
}

/// Floor feet no packing of these lines can beat.
///
/// Per unit length, the summed occupancy of all lines rounded up gives the
/// fewest positions possible. Computed in closed form, so it is cheap for
/// any quantity.
pub fn min_linear_feet(lines: &[OrderLine]) -> f64 {
    let mut occupancy: BTreeMap<u64, (f64, f64)> = BTreeMap::new();
    for line in lines.iter().filter(|line| line.quantity > 0) {
        let share = f64::from(line.quantity) / f64::from(line.effective_max_stack());
        let entry = occupancy
            .entry(line.unit_length_ft.to_bits())
            .or_insert((line.unit_length_ft, 0.0));
        entry.1 += share;
    }

    occupancy
        .values()
        .map(|(length_ft, share)| (share - EPSILON).ceil().max(0.0) * length_ft)
        .sum()
}

/// Computes floor positions for order lines.
pub struct StackPacker;

impl StackPacker {
    /// Pack lines into the fewest positions the fill order allows.
    ///
    /// Lines are grouped by unit length (longest first). Within a group,
    /// higher `max_stack` lines are placed first; ties keep input order.
    /// Each line fills the open position while its occupancy stays within
    /// 1.0, then spills into fresh positions.
    pub fn pack(lines: &[OrderLine]) -> PackResult {
        let mut positions: Vec<StackPosition> = Vec::new();

        let ordered = lines
            .iter()
            .filter(|line| line.quantity > 0)
            .sorted_by(|a, b| {
                b.unit_length_ft
                    .total_cmp(&a.unit_length_ft)
                    .then_with(|| b.effective_max_stack().cmp(&a.effective_max_stack()))
            });
        let groups = ordered.group_by(|line| line.unit_length_ft.to_bits());

        for (_, group) in &groups {
            let mut open: Option<StackPosition> = None;

            for line in group {
                let max_stack = line.effective_max_stack();
                let mut remaining = line.quantity;

                while remaining > 0 {
                    let position =
                        open.get_or_insert_with(|| StackPosition::new(line.unit_length_ft));
                    let fits = position.units_that_fit(max_stack);

                    if fits == 0 {
                        if let Some(closed) = open.take() {
                            positions.push(closed);
                        }
                        continue;
                    }

                    let units = remaining.min(fits);
                    position.allocate(line, units);
                    remaining -= units;

                    if position.is_full() {
                        if let Some(closed) = open.take() {
                            positions.push(closed);
                        }
                    }
                }
            }

            if let Some(last) = open.take() {
                positions.push(last);
            }
        }

        let total_linear_feet = positions.iter().map(|p| p.length_ft).sum();
        let max_units_in_any_position = positions
            .iter()
            .map(|p| p.units_count)
            .max()
            .unwrap_or(0);

        PackResult {
            positions,
            total_linear_feet,
            max_units_in_any_position,
            deck_layout: None,
        }
    }

    /// Pack lines and lay the positions out on a trailer's decks.
    pub fn pack_on_trailer(
        lines: &[OrderLine],
        trailer_type: TrailerType,
        capacity_ft: f64,
    ) -> PackResult {
        let mut result = StackPacker::pack(lines);
        result.assign_decks(trailer_type, capacity_ft);
        result
    }
}
