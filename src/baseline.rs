//! Manual baseline: loads the way a planner builds them by hand.
//!
//! Orders are grouped by destination and packed first-fit-decreasing by
//! linear feet with floor length as the only constraint. No clustering, no
//! time window, no compatibility screening. Orders longer than a trailer
//! are left out: neither side of the comparison can carry them.

use crate::order::{Order, OrderLine};
use crate::packer::GreedyPacker;
use crate::solution::CandidateLoad;
use crate::stack::StackPacker;
use itertools::Itertools;
use std::collections::BTreeMap;

/// Builds the "before" side of the run comparison.
pub struct BaselineBuilder;

impl BaselineBuilder {
    /// Build baseline loads for a set of orders.
    ///
    /// Loads are not evaluated; route and cost them with the same evaluator
    /// as the optimized loads.
    pub fn build(orders: &[Order], packer: &GreedyPacker<'_>) -> Vec<CandidateLoad> {
        let by_destination: BTreeMap<&str, Vec<&Order>> = orders
            .iter()
            .filter(|order| packer.fits_alone(order))
            .map(|order| (order.destination.as_str(), order))
            .into_group_map()
            .into_iter()
            .collect();

        let mut loads = Vec::new();
        for (group_id, (_, group)) in by_destination.into_iter().enumerate() {
            for bin in Self::first_fit_decreasing(&group, packer) {
                loads.push(packer.build_load(group_id, bin));
            }
        }
        loads
    }

    fn first_fit_decreasing(orders: &[&Order], packer: &GreedyPacker<'_>) -> Vec<Vec<Order>> {
        let capacity_ft = packer.capacity_ft();
        let sized = orders
            .iter()
            .map(|order| (*order, packer.order_feet(order)))
            .sorted_by(|(a, a_feet), (b, b_feet)| {
                b_feet.total_cmp(a_feet).then_with(|| a.id.cmp(&b.id))
            });

        let mut bins: Vec<(Vec<Order>, Vec<OrderLine>)> = Vec::new();
        for (order, _) in sized {
            let slot = bins.iter().position(|(_, lines)| {
                let mut combined = lines.clone();
                combined.extend(order.lines.iter().cloned());
                !StackPacker::pack(&combined).exceeds(capacity_ft)
            });

            match slot {
                Some(idx) => {
                    let (members, lines) = &mut bins[idx];
                    members.push(order.clone());
                    lines.extend(order.lines.iter().cloned());
                }
                None => bins.push((vec![order.clone()], order.lines.clone())),
            }
        }

        bins.into_iter().map(|(members, _)| members).collect()
    }
}
