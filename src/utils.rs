//! Utility functions for reporting and exporting optimization runs.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use crate::error::Result;
use crate::solution::{CandidateLoad, OptimizationOutcome, RunStatus};

/// Format a duration as hours, minutes, and seconds.
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}h {:02}m {:02}s", hours, minutes, seconds)
}

/// Render a run as a plain-text planner report.
pub fn format_run_report(outcome: &OptimizationOutcome) -> String {
    let run = &outcome.run;
    let summary = &run.summary;
    let mut report = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(report, "Load consolidation for origin {}", run.params.origin);
    let _ = writeln!(report, "Status: {:?}", run.status);
    if let Some(reason) = &run.reason {
        let _ = writeln!(report, "Reason: {}", reason);
    }
    let _ = writeln!(report, "Runtime: {}", format_duration(run.runtime));
    let _ = writeln!(
        report,
        "Orders: {} eligible, {} excluded, {} oversized, {} without lines",
        run.eligible_order_count,
        run.excluded_order_count,
        run.oversized_order_count,
        run.empty_order_count
    );
    for empty in &outcome.empty_orders {
        let _ = writeln!(report, "  {}", empty.warning);
    }

    if run.status == RunStatus::NoEligibleOrders {
        return report;
    }

    let _ = writeln!(report);
    let _ = writeln!(report, "{:<22}{:>12}{:>12}", "", "Manual", "Optimized");
    let _ = writeln!(
        report,
        "{:<22}{:>12}{:>12}",
        "Loads", summary.loads_before, summary.loads_after
    );
    let _ = writeln!(
        report,
        "{:<22}{:>11.1}%{:>11.1}%",
        "Avg utilization", summary.avg_utilization_before, summary.avg_utilization_after
    );
    let _ = writeln!(
        report,
        "{:<22}{:>12.1}{:>12.1}",
        "Total miles", summary.total_miles_before, summary.total_miles_after
    );
    let _ = writeln!(
        report,
        "{:<22}{:>12.2}{:>12.2}",
        "Total cost ($)", summary.total_cost_before, summary.total_cost_after
    );
    let _ = writeln!(report, "Estimated savings: ${:.2}", summary.cost_savings());

    for load in &outcome.loads {
        let _ = writeln!(report);
        write_load(&mut report, load);
    }

    if !outcome.oversized_orders.is_empty() {
        let _ = writeln!(report);
        let _ = writeln!(report, "Oversized orders (need a split decision):");
        for oversized in &outcome.oversized_orders {
            let _ = writeln!(
                report,
                "  {} to {}: {:.1} ft",
                oversized.order.id, oversized.order.destination, oversized.linear_feet
            );
        }
    }

    if !outcome.unprocessed_orders.is_empty() {
        let _ = writeln!(report);
        let _ = writeln!(
            report,
            "Unprocessed orders: {}",
            outcome.unprocessed_orders.join(", ")
        );
    }

    report
}

fn write_load(report: &mut String, load: &CandidateLoad) {
    let _ = writeln!(
        report,
        "{}  score {:.1}  {:.1} ft  {:.1}% ({})",
        load.id,
        load.score,
        load.total_linear_feet(),
        load.utilization_pct,
        load.grade()
    );
    let _ = writeln!(report, "  Orders: {}", load.order_ids().join(", "));
    let _ = writeln!(
        report,
        "  Route: {} ({:.1} mi, detour {:.1}%)",
        load.route.stops.join(" -> "),
        load.route.total_miles,
        load.route.detour_pct()
    );
    let _ = writeln!(
        report,
        "  Cost: ${:.2} at ${:.2}/mi, saves ${:.2} vs. shipping alone",
        load.cost.dollars, load.cost.rate_per_mile, load.consolidation_savings
    );
    for flag in &load.flags {
        let _ = writeln!(report, "  Flag: {:?}", flag);
    }
    for warning in &load.warnings {
        let _ = writeln!(report, "  {}", warning);
    }
}

/// Save an outcome as pretty-printed JSON.
pub fn save_outcome<P: AsRef<Path>>(outcome: &OptimizationOutcome, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, outcome)?;
    writer.flush()?;
    Ok(())
}
