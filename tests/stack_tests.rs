//! Tests for the stack packer and deck layout.

use chrono::NaiveDate;
use load_consolidator::config::TrailerType;
use load_consolidator::order::OrderLine;
use load_consolidator::stack::{
    min_linear_feet, naive_linear_feet, utilization_grade, Deck, StackPacker,
};

fn due() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
}

fn line(order_id: &str, quantity: u32, unit_length_ft: f64, max_stack: u32) -> OrderLine {
    OrderLine::new(
        order_id,
        &format!("{}-P", order_id),
        quantity,
        unit_length_ft,
        max_stack,
        "standard",
        "30301",
        due(),
    )
}

#[test]
fn test_pack_empty() {
    let result = StackPacker::pack(&[]);

    assert!(result.positions.is_empty());
    assert_eq!(result.total_linear_feet, 0.0);
    assert_eq!(result.max_units_in_any_position, 0);
}

#[test]
fn test_pack_single_line_spills_into_positions() {
    // 5 units stacking 2 high: positions of 2, 2 and 1
    let result = StackPacker::pack(&[line("O1", 5, 10.0, 2)]);

    assert_eq!(result.position_count(), 3);
    assert!((result.total_linear_feet - 30.0).abs() < 1e-6);
    assert_eq!(result.max_units_in_any_position, 2);
    assert_eq!(result.positions[2].units_count, 1);
    assert!((result.positions[2].capacity_used - 0.5).abs() < 1e-6);
}

#[test]
fn test_pack_lines_share_fractional_position() {
    // Two lines of 2 units stacking 4 high fill one position together
    let lines = vec![line("O1", 2, 8.0, 4), line("O2", 2, 8.0, 4)];
    let result = StackPacker::pack(&lines);

    assert_eq!(result.position_count(), 1);
    assert!((result.total_linear_feet - 8.0).abs() < 1e-6);
    assert_eq!(result.positions[0].allocations.len(), 2);
    assert!((result.positions[0].capacity_used - 1.0).abs() < 1e-6);
    assert!((naive_linear_feet(&lines) - 16.0).abs() < 1e-6);
}

#[test]
fn test_pack_mixed_max_stack_uses_remaining_fraction() {
    // 1 of 2 (0.5) + 1 of 4 (0.25) + 1 of 4 (0.25) = 1.0
    let lines = vec![line("O1", 1, 8.0, 2), line("O2", 2, 8.0, 4)];
    let result = StackPacker::pack(&lines);

    assert_eq!(result.position_count(), 1);
    assert_eq!(result.positions[0].units_count, 3);
}

#[test]
fn test_pack_higher_max_stack_placed_first() {
    let lines = vec![line("O1", 1, 8.0, 1), line("O2", 1, 8.0, 3)];
    let result = StackPacker::pack(&lines);

    // The 3-high line opens the first position; the 1-high unit cannot join it
    assert_eq!(result.position_count(), 2);
    assert_eq!(result.positions[0].allocations[0].order_id, "O2");
    assert_eq!(result.positions[1].allocations[0].order_id, "O1");
}

#[test]
fn test_pack_never_mixes_lengths() {
    let lines = vec![line("O1", 1, 8.0, 4), line("O2", 1, 6.0, 4)];
    let result = StackPacker::pack(&lines);

    assert_eq!(result.position_count(), 2);
    // Longest length group first
    assert!((result.positions[0].length_ft - 8.0).abs() < 1e-6);
    assert!((result.positions[1].length_ft - 6.0).abs() < 1e-6);
    assert!((result.total_linear_feet - 14.0).abs() < 1e-6);
}

#[test]
fn test_pack_capacity_never_exceeded() {
    let lines = vec![
        line("O1", 7, 8.0, 3),
        line("O2", 5, 8.0, 2),
        line("O3", 4, 8.0, 4),
        line("O4", 2, 6.0, 1),
    ];
    let result = StackPacker::pack(&lines);

    for position in &result.positions {
        assert!(position.capacity_used <= 1.0 + 1e-9);
        let fractions: f64 = position.allocations.iter().map(|a| a.fraction()).sum();
        assert!((fractions - position.capacity_used).abs() < 1e-9);
    }
    let units: u32 = result.positions.iter().map(|p| p.units_count).sum();
    assert_eq!(units, 18);
}

#[test]
fn test_zero_max_stack_treated_as_one() {
    let result = StackPacker::pack(&[line("O1", 3, 4.0, 0)]);

    assert_eq!(result.position_count(), 3);
    assert!((result.total_linear_feet - 12.0).abs() < 1e-6);
}

#[test]
fn test_zero_quantity_line_takes_no_floor() {
    let result = StackPacker::pack(&[line("O1", 0, 8.0, 2), line("O2", 1, 8.0, 2)]);

    assert_eq!(result.position_count(), 1);
    assert_eq!(result.positions[0].allocations[0].order_id, "O2");
}

#[test]
fn test_linear_feet_monotonic_in_quantity() {
    let mut previous = 0.0;
    for quantity in 0..40 {
        let feet = StackPacker::pack(&[line("O1", quantity, 7.5, 3)]).total_linear_feet;
        assert!(feet >= previous - 1e-9);
        previous = feet;
    }
}

#[test]
fn test_min_linear_feet_is_a_lower_bound() {
    // 2/4 + 3/4 of an 8 ft position, plus 5/2 of a 10 ft one
    let lines = vec![line("O1", 2, 8.0, 4), line("O2", 3, 8.0, 4), line("O3", 5, 10.0, 2)];
    assert!((min_linear_feet(&lines) - (2.0 * 8.0 + 3.0 * 10.0)).abs() < 1e-6);

    let mut lines_so_far = Vec::new();
    for quantity in 1..30 {
        let length = [4.0, 8.0][quantity as usize % 2];
        lines_so_far.push(line("R", quantity, length, 1 + quantity % 4));
        let packed = StackPacker::pack(&lines_so_far).total_linear_feet;
        assert!(min_linear_feet(&lines_so_far) <= packed + 1e-9);
    }
}

#[test]
fn test_min_linear_feet_handles_huge_quantities() {
    let lines = vec![line("O1", 1_000_000_000, 8.0, 1)];
    assert!((min_linear_feet(&lines) - 8.0e9).abs() < 1.0);
    assert_eq!(min_linear_feet(&[line("O1", 0, 8.0, 1)]), 0.0);
}

#[test]
fn test_utilization_and_credit() {
    let result = StackPacker::pack(&[line("O1", 3, 10.0, 2)]);

    // Positions: full (10 ft) + half full (10 ft)
    assert!((result.utilization_pct(50.0) - 40.0).abs() < 1e-6);
    assert!((result.credit_feet() - 15.0).abs() < 1e-6);
    assert_eq!(result.utilization_pct(0.0), 0.0);
}

#[test]
fn test_utilization_grades() {
    assert_eq!(utilization_grade(92.0), 'A');
    assert_eq!(utilization_grade(85.0), 'A');
    assert_eq!(utilization_grade(75.0), 'B');
    assert_eq!(utilization_grade(60.0), 'C');
    assert_eq!(utilization_grade(40.0), 'D');
    assert_eq!(utilization_grade(12.0), 'F');
}

#[test]
fn test_step_deck_layout() {
    // Four 10 ft positions and one 8 ft position on a 53 ft step deck
    let lines = vec![line("O1", 4, 10.0, 1), line("O2", 1, 8.0, 1)];
    let result = StackPacker::pack_on_trailer(&lines, TrailerType::StepDeck, 53.0);
    let layout = result.deck_layout.unwrap();

    assert!((layout.lower_capacity_ft - 43.0).abs() < 1e-6);
    assert!((layout.upper_capacity_ft - 10.0).abs() < 1e-6);
    assert!((layout.upper_used_ft - 10.0).abs() < 1e-6);
    assert!((layout.lower_used_ft - 38.0).abs() < 1e-6);
    assert!(!layout.overflows());

    let upper = result
        .positions
        .iter()
        .filter(|p| p.deck == Deck::Upper)
        .count();
    assert_eq!(upper, 1);
}

#[test]
fn test_step_deck_overflow_when_positions_too_long_for_upper_deck() {
    // Three 16 ft positions fit 53 ft of floor but not the 43 ft lower deck
    let lines = vec![line("O1", 3, 16.0, 1)];
    let result = StackPacker::pack_on_trailer(&lines, TrailerType::StepDeck, 53.0);
    let layout = result.deck_layout.unwrap();

    assert!(!result.exceeds(53.0));
    assert!(layout.overflows());
    assert_eq!(layout.upper_used_ft, 0.0);
}

#[test]
fn test_flatbed_single_deck() {
    let lines = vec![line("O1", 5, 10.0, 1)];
    let result = StackPacker::pack_on_trailer(&lines, TrailerType::Flatbed, 53.0);
    let layout = result.deck_layout.unwrap();

    assert_eq!(layout.upper_capacity_ft, 0.0);
    assert!((layout.lower_used_ft - 50.0).abs() < 1e-6);
    assert!(result.positions.iter().all(|p| p.deck == Deck::Lower));
}
