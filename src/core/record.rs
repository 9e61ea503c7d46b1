// Workout record and draft types plus the lenient JSON payload decoder.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::{Error, ErrorKind};

pub const NUMBERS_REQUIRED: &str = "sets, reps, and weight must be numbers";
pub const FIELDS_REQUIRED: &str = "date and exercise are required";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    pub id: u64,
    pub date: String,
    pub exercise: String,
    pub sets: i64,
    pub reps: i64,
    pub weight: f64,
}

/// A record without its id: the payload of create and update.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkoutDraft {
    pub date: String,
    pub exercise: String,
    pub sets: i64,
    pub reps: i64,
    pub weight: f64,
}

impl WorkoutRecord {
    pub fn from_draft(id: u64, draft: WorkoutDraft) -> Self {
        Self {
            id,
            date: draft.date,
            exercise: draft.exercise,
            sets: draft.sets,
            reps: draft.reps,
            weight: draft.weight,
        }
    }

    pub fn to_draft(&self) -> WorkoutDraft {
        WorkoutDraft {
            date: self.date.clone(),
            exercise: self.exercise.clone(),
            sets: self.sets,
            reps: self.reps,
            weight: self.weight,
        }
    }

    /// Replaces every field except `id`.
    pub fn apply(&mut self, draft: WorkoutDraft) {
        self.date = draft.date;
        self.exercise = draft.exercise;
        self.sets = draft.sets;
        self.reps = draft.reps;
        self.weight = draft.weight;
    }
}

impl WorkoutDraft {
    pub fn new(
        date: impl Into<String>,
        exercise: impl Into<String>,
        sets: i64,
        reps: i64,
        weight: f64,
    ) -> Self {
        Self {
            date: date.into(),
            exercise: exercise.into(),
            sets,
            reps,
            weight,
        }
    }

    pub fn normalized(mut self) -> Self {
        self.date = self.date.trim().to_string();
        self.exercise = self.exercise.trim().to_string();
        self
    }

    /// Decodes a request body. Numeric fields may be JSON numbers or numeric
    /// strings; integral fields accept integral floats.
    pub fn from_json(value: &Value) -> Result<Self, Error> {
        let Some(object) = value.as_object() else {
            return Err(Error::new(ErrorKind::Usage).with_message("request body must be a JSON object"));
        };
        let date = text_field(object.get("date"));
        let exercise = text_field(object.get("exercise"));
        if date.trim().is_empty() || exercise.trim().is_empty() {
            return Err(Error::new(ErrorKind::Invalid).with_message(FIELDS_REQUIRED));
        }

        let numbers = (
            integer_field(object.get("sets")),
            integer_field(object.get("reps")),
            float_field(object.get("weight")),
        );
        let (Some(sets), Some(reps), Some(weight)) = numbers else {
            return Err(Error::new(ErrorKind::Invalid).with_message(NUMBERS_REQUIRED));
        };
        Ok(Self {
            date,
            exercise,
            sets,
            reps,
            weight,
        }
        .normalized())
    }
}

fn text_field(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        _ => String::new(),
    }
}

fn integer_field(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|v| v.is_finite()).map(|v| v.trunc() as i64)),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>().ok().or_else(|| {
                text.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .map(|v| v.trunc() as i64)
            })
        }
        _ => None,
    }
}

fn float_field(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok().filter(|v| !v.is_nan()),
        _ => None,
    }
}
