//! Bounded per-variable history with a running maximum, feeding the sparklines.

use std::cmp::Ordering;
use std::collections::VecDeque;

use crate::value::Value;

/// Default number of samples kept per variable.
pub const DEFAULT_HISTORY: usize = 1200;

fn push_capped<T>(dq: &mut VecDeque<T>, v: T, cap: usize) {
    if dq.len() == cap {
        dq.pop_front();
    }
    dq.push_back(v);
}

// One slot per tick; `None` records a tick where the variable could not be read.
#[derive(Debug, Clone)]
pub struct History {
    values: VecDeque<Option<Value>>,
    max: Option<Value>,
    cap: usize,
}

impl History {
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            values: VecDeque::with_capacity(cap),
            max: None,
            cap,
        }
    }

    pub fn push(&mut self, v: Option<Value>) {
        if let Some(val) = v.as_ref().filter(|val| val.is_numeric()) {
            let higher = match &self.max {
                None => true,
                Some(max) => val.numeric_cmp(max) == Some(Ordering::Greater),
            };
            if higher {
                self.max = Some(val.clone());
            }
        }
        push_capped(&mut self.values, v, self.cap);
    }

    /// Most recently pushed value.
    pub fn front(&self) -> Option<&Value> {
        self.values.back().and_then(Option::as_ref)
    }

    /// Highest numeric value ever pushed, eviction does not reset it.
    pub fn max(&self) -> Option<&Value> {
        self.max.as_ref()
    }

    // Oldest first. Unreadable ticks map to 0 so the series stays aligned in time.
    pub fn int_values(&self) -> Vec<i64> {
        self.values
            .iter()
            .map(|v| v.as_ref().map_or(0, Value::to_int))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
