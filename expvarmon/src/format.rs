//! Rendering of canonical values according to the variable kind.

use std::time::Duration;

use crate::value::Value;
use crate::var::VarKind;

/// Format a value for display. Total: values that do not fit the kind are shown as-is.
pub fn format_value(v: &Value, kind: VarKind) -> String {
    match (kind, v.as_f64()) {
        (VarKind::Memory, Some(n)) => signed(n, |b| human(b as u64)),
        (VarKind::Duration, Some(n)) => {
            signed(n, |ns| format_duration(Duration::from_nanos(ns.round() as u64)))
        }
        (VarKind::GcCpu, Some(n)) => format!("{:.2}%", n * 100.0),
        _ => v.to_string(),
    }
}

fn signed(n: f64, f: impl Fn(f64) -> String) -> String {
    if n < 0.0 {
        format!("-{}", f(-n))
    } else {
        f(n)
    }
}

pub fn human(b: u64) -> String {
    const K: f64 = 1024.0;
    let b = b as f64;
    if b < K { return format!("{b:.0}B"); }
    let kb = b / K;
    if kb < K { return format!("{kb:.1}KB"); }
    let mb = kb / K;
    if mb < K { return format!("{mb:.1}MB"); }
    let gb = mb / K;
    if gb < K { return format!("{gb:.1}GB"); }
    let tb = gb / K;
    format!("{tb:.2}TB")
}

pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    let secs = d.as_secs();
    if nanos == 0 {
        "0ns".to_string()
    } else if nanos < 1_000 {
        format!("{}ns", nanos)
    } else if nanos < 1_000_000 {
        format!("{:.2}µs", nanos as f64 / 1_000.0)
    } else if nanos < 1_000_000_000 {
        format!("{:.2}ms", nanos as f64 / 1_000_000.0)
    } else if secs < 60 {
        format!("{:.2}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m{}s", secs / 60, secs % 60)
    } else {
        format!("{}h{}m{}s", secs / 3600, secs % 3600 / 60, secs % 60)
    }
}
