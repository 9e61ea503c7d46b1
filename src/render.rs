//! Purpose: Terminal rendering for workout pages, the pager line and stats.
//! Exports: `records_table`, `pager_line`, `stats_lines`, `animate_stats`, `format_weight`.
//! Role: Thin presentation adapter; consumes `Page`/`PagerView`/`Stats` and owns no state.
//! Invariants: Rendering never mutates or re-fetches data.

use std::io::{self, Write};
use std::thread::sleep;
use std::time::{Duration, Instant};

use liftlog::api::{COUNTER_DURATION_MS, PagerView, Stats, WorkoutRecord, ease_out_cubic};

const HEADERS: [&str; 6] = ["ID", "DATE", "EXERCISE", "SETS", "REPS", "WEIGHT"];
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

pub fn format_weight(weight: f64) -> String {
    if weight.fract() == 0.0 && weight.abs() < 1e15 {
        format!("{}", weight as i64)
    } else {
        format!("{weight}")
    }
}

pub fn records_table(records: &[WorkoutRecord]) -> String {
    if records.is_empty() {
        return "No workouts on this page.".to_string();
    }
    let rows: Vec<[String; 6]> = records
        .iter()
        .map(|record| {
            [
                record.id.to_string(),
                record.date.clone(),
                record.exercise.clone(),
                record.sets.to_string(),
                record.reps.to_string(),
                format_weight(record.weight),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(format_row(&HEADERS.map(str::to_string), &widths));
    for row in &rows {
        lines.push(format_row(row, &widths));
    }
    lines.join("\n")
}

// Text columns are left-aligned, numeric columns right-aligned.
fn format_row(cells: &[String; 6], widths: &[usize; 6]) -> String {
    let mut out = Vec::with_capacity(cells.len());
    for (index, (cell, width)) in cells.iter().zip(widths.iter()).enumerate() {
        let padded = if matches!(index, 1 | 2) {
            format!("{cell:<width$}")
        } else {
            format!("{cell:>width$}")
        };
        out.push(padded);
    }
    out.join("  ").trim_end().to_string()
}

pub fn pager_line(view: &PagerView) -> String {
    let prev = if view.prev_enabled { "< prev" } else { "      " };
    let next = if view.next_enabled { "next >" } else { "" };
    format!("{prev}  {}  {next}", view.label()).trim_end().to_string()
}

/// Stats scaled by `progress` in `[0, 1]` after easing.
pub fn stats_lines(stats: &Stats, progress: f64) -> [String; 2] {
    let eased = ease_out_cubic(progress);
    let total = (stats.total as f64 * eased).round() as u64;
    let average = stats.average_weight * eased;
    [
        format!("Total Workouts        {total}"),
        format!("Average Weight (lbs)  {average:.1}"),
    ]
}

/// Counts both values up from zero over the counter duration, redrawing in place.
pub fn animate_stats(stats: &Stats, out: &mut impl Write) -> io::Result<()> {
    let duration = Duration::from_millis(COUNTER_DURATION_MS);
    let start = Instant::now();
    let mut first = true;
    loop {
        let progress = start.elapsed().as_secs_f64() / duration.as_secs_f64();
        let lines = stats_lines(stats, progress);
        if !first {
            // Back to column 0 of the first row to redraw both rows.
            write!(out, "\r\x1b[1A")?;
        }
        write!(out, "\x1b[2K{}\n\x1b[2K{}", lines[0], lines[1])?;
        out.flush()?;
        first = false;
        if progress >= 1.0 {
            break;
        }
        sleep(FRAME_INTERVAL);
    }
    writeln!(out)
}
