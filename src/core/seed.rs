// Deterministic starter data for a store that has never been initialized.
use crate::core::record::WorkoutRecord;

pub const SEED_COUNT: u64 = 30;

pub const EXERCISES: [&str; 6] = [
    "Bench Press",
    "Squat",
    "Deadlift",
    "Pull Ups",
    "Shoulder Press",
    "Incline DB Press",
];

pub fn seed_records() -> Vec<WorkoutRecord> {
    (1..=SEED_COUNT)
        .map(|i| WorkoutRecord {
            id: i,
            date: format!("2026-01-{:02}", i % 12 + 1),
            exercise: EXERCISES[(i % EXERCISES.len() as u64) as usize].to_string(),
            sets: (i % 5 + 1) as i64,
            reps: (i % 10 + 1) as i64,
            weight: 95.0 + (i % 8) as f64 * 10.0,
        })
        .collect()
}
