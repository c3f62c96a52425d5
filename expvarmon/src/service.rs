//! Per-endpoint state: histories of every tracked variable, restart detection
//! and the one-tick update cycle.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::export::CsvExport;
use crate::expvar::{Document, Fetcher, CMDLINE_PATH};
use crate::format::format_value;
use crate::history::History;
use crate::value::guess_value;
use crate::var::VarName;

/// Counter expected to only ever grow while the process lives. Go's runtime
/// publishes it by default.
pub const DEFAULT_UPTIME_COUNTER: &str = "memstats.PauseTotalNs";

/// Shown when a value cannot be displayed.
pub const NOT_AVAILABLE: &str = "N/A";

/// Settings shared by every monitored service.
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub vars: Vec<VarName>,
    pub history: usize,
    pub uptime_counter: VarName,
}

impl ServiceOptions {
    pub fn new(vars: Vec<VarName>, history: usize) -> Self {
        Self {
            vars,
            history,
            uptime_counter: VarName::new(DEFAULT_UPTIME_COUNTER),
        }
    }
}

#[derive(Debug)]
pub struct Service {
    pub url: Url,
    pub name: String,
    pub cmdline: String,
    /// Error of the last tick, if it failed.
    pub err: Option<Error>,
    /// Set when a restart is suspected; only [`Service::acknowledge_restart`] clears it.
    pub restarted: bool,
    /// Last observed value of the uptime counter.
    pub uptime_counter: Option<i64>,

    vars: Vec<VarName>,
    stacks: HashMap<VarName, History>,
    uptime_path: VarName,
    ticks: u64,
    export: Option<CsvExport>,
}

impl Service {
    pub fn new(url: Url, opts: &ServiceOptions) -> Self {
        // only the address is known until the command line is fetched
        let name = match (url.host_str(), url.port_or_known_default()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            _ => url.to_string(),
        };
        let stacks = opts
            .vars
            .iter()
            .map(|v| (v.clone(), History::new(opts.history)))
            .collect();
        Self {
            url,
            name,
            cmdline: String::new(),
            err: None,
            restarted: false,
            uptime_counter: None,
            vars: opts.vars.clone(),
            stacks,
            uptime_path: opts.uptime_counter.clone(),
            ticks: 0,
            export: None,
        }
    }

    /// Like [`Service::new`], also creating the CSV export file in `dir`.
    pub fn with_export(url: Url, opts: &ServiceOptions, dir: &Path) -> Result<Self> {
        let mut s = Self::new(url, opts);
        s.export = Some(CsvExport::create(dir, &s.name, &s.vars)?);
        Ok(s)
    }

    pub fn vars(&self) -> &[VarName] {
        &self.vars
    }

    pub fn history(&self, name: &VarName) -> Option<&History> {
        self.stacks.get(name)
    }

    /// Run one poll tick. Never fails; problems end up in `err` and `restarted`.
    pub async fn update<F: Fetcher>(&mut self, fetcher: &F) {
        let first_tick = self.ticks == 0;
        self.ticks += 1;

        let fetched = fetcher.fetch(&self.url).await;
        match fetched {
            Ok(doc) => {
                self.err = None;
                self.apply(&doc);
            }
            Err(e) => {
                warn!(service = %self.name, error = %e, "fetch failed");
                // healthy -> failing may be the process going down for a restart
                if !first_tick && self.err.is_none() {
                    self.mark_restarted("endpoint stopped responding");
                }
                self.err = Some(e);
                // no document: every tracked variable is unreadable this tick
                for stack in self.stacks.values_mut() {
                    stack.push(None);
                }
            }
        }

        self.export_row();
    }

    fn apply(&mut self, doc: &Document) {
        if let Ok(c) = doc.get_i64(self.uptime_path.path()) {
            if self.uptime_counter.is_some_and(|prev| c < prev) {
                self.mark_restarted("uptime counter went backwards");
            }
            self.uptime_counter = Some(c);
        }

        if self.cmdline.is_empty() {
            if let Ok(cmdline) = doc.get_string_array(&[CMDLINE_PATH]) {
                self.cmdline = cmdline.join(" ");
                if let Some(name) = base_command(&cmdline) {
                    self.name = name;
                }
            }
        }

        for name in &self.vars {
            let Some(stack) = self.stacks.get_mut(name) else {
                continue;
            };
            match doc.get_var(name) {
                Ok(raw) => {
                    if let Some(v) = guess_value(raw) {
                        stack.push(Some(v));
                    }
                }
                Err(_) => stack.push(None),
            }
        }
        debug!(service = %self.name, "updated");
    }

    fn mark_restarted(&mut self, reason: &str) {
        if !self.restarted {
            warn!(service = %self.name, reason, "restart detected");
        }
        self.restarted = true;
    }

    fn export_row(&mut self) {
        if self.export.is_none() {
            return;
        }
        let row: Vec<String> = self.vars.iter().map(|v| self.value(v)).collect();
        if let Some(export) = self.export.as_mut() {
            export.write_row(&row);
        }
    }

    /// Clear the restart flag after the caller has reported it.
    pub fn acknowledge_restart(&mut self) {
        self.restarted = false;
    }

    /// Current formatted value, or [`NOT_AVAILABLE`].
    pub fn value(&self, name: &VarName) -> String {
        if self.err.is_some() {
            return NOT_AVAILABLE.to_string();
        }
        self.stacks
            .get(name)
            .and_then(History::front)
            .map(|v| format_value(v, name.kind()))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    /// Recent values projected to integers for sparklines. Kept even while erroring.
    pub fn values(&self, name: &VarName) -> Vec<i64> {
        self.stacks
            .get(name)
            .map(History::int_values)
            .unwrap_or_default()
    }

    pub fn max(&self, name: &VarName) -> Option<String> {
        let v = self.stacks.get(name)?.max()?;
        Some(format_value(v, name.kind()))
    }

    /// Flush and close the export file. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(export) = self.export.take() {
            export.close();
        }
    }
}

impl Drop for Service {
    fn drop(&mut self) {
        self.close();
    }
}

/// Short name of a process from its command line: the file name of the first token.
pub fn base_command(cmdline: &[String]) -> Option<String> {
    let first = cmdline.first()?;
    let base = first.rsplit(['/', '\\']).next().unwrap_or(first);
    if base.is_empty() {
        None
    } else {
        Some(base.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::future::Future;
    use std::sync::Mutex;

    /// Replays canned documents; `None` entries simulate a failed fetch.
    struct Scripted(Mutex<VecDeque<Option<serde_json::Value>>>);

    impl Scripted {
        fn new(docs: Vec<Option<serde_json::Value>>) -> Self {
            Self(Mutex::new(docs.into()))
        }
    }

    impl Fetcher for Scripted {
        fn fetch(&self, _url: &Url) -> impl Future<Output = Result<Document>> + Send {
            let next = self.0.lock().unwrap().pop_front().flatten();
            async move {
                next.map(Document::new)
                    .ok_or_else(|| Error::Fetch("connection refused".into()))
            }
        }
    }

    fn opts(vars: &[&str]) -> ServiceOptions {
        ServiceOptions::new(vars.iter().map(|v| VarName::new(v)).collect(), 4)
    }

    fn service(vars: &[&str]) -> Service {
        Service::new(Url::parse("http://localhost:1234/debug/vars").unwrap(), &opts(vars))
    }

    fn counter(c: i64) -> Option<serde_json::Value> {
        Some(json!({ "memstats": { "PauseTotalNs": c } }))
    }

    #[test]
    fn name_defaults_to_address() {
        let s = service(&[]);
        assert_eq!(s.name, "localhost:1234");
        assert!(s.cmdline.is_empty());
    }

    #[tokio::test]
    async fn counter_regression_sets_sticky_restart() {
        let f = Scripted::new(vec![counter(100), counter(250), counter(40), counter(500)]);
        let mut s = service(&[]);

        s.update(&f).await;
        assert!(!s.restarted);
        s.update(&f).await;
        assert!(!s.restarted);
        s.update(&f).await;
        assert!(s.restarted);
        assert_eq!(s.uptime_counter, Some(40));
        s.update(&f).await;
        assert!(s.restarted);
        assert_eq!(s.uptime_counter, Some(500));
    }

    #[tokio::test]
    async fn healthy_to_failing_sets_restart() {
        let f = Scripted::new(vec![counter(10), None]);
        let mut s = service(&[]);
        s.update(&f).await;
        assert!(s.err.is_none());
        s.update(&f).await;
        assert!(s.err.is_some());
        assert!(s.restarted);
    }

    #[tokio::test]
    async fn failing_first_tick_is_not_a_restart() {
        let f = Scripted::new(vec![None, None, counter(1)]);
        let mut s = service(&[]);
        s.update(&f).await;
        s.update(&f).await;
        assert!(!s.restarted);
        s.update(&f).await;
        assert!(s.err.is_none());
        assert!(!s.restarted);
    }

    #[tokio::test]
    async fn acknowledge_clears_restart() {
        let f = Scripted::new(vec![counter(5), counter(1), counter(2)]);
        let mut s = service(&[]);
        s.update(&f).await;
        s.update(&f).await;
        assert!(s.restarted);
        s.acknowledge_restart();
        s.update(&f).await;
        assert!(!s.restarted);
    }

    #[tokio::test]
    async fn cmdline_resolved_once() {
        let f = Scripted::new(vec![
            Some(json!({ "cmdline": ["/opt/bin/api", "-v"] })),
            Some(json!({ "cmdline": ["/usr/bin/other"] })),
        ]);
        let mut s = service(&[]);
        s.update(&f).await;
        assert_eq!(s.name, "api");
        assert_eq!(s.cmdline, "/opt/bin/api -v");
        s.update(&f).await;
        assert_eq!(s.name, "api");
        assert_eq!(s.cmdline, "/opt/bin/api -v");
    }

    #[tokio::test]
    async fn missing_vars_push_absent_and_skips_keep_front() {
        let f = Scripted::new(vec![
            Some(json!({ "a": 1, "b": 7 })),
            Some(json!({ "b": null })),
        ]);
        let a = VarName::new("a");
        let b = VarName::new("b");
        let mut s = service(&["a", "b"]);

        s.update(&f).await;
        assert_eq!(s.value(&a), "1");
        assert_eq!(s.value(&b), "7");

        s.update(&f).await;
        assert!(s.err.is_none());
        // a is missing: explicit absent push
        assert_eq!(s.value(&a), NOT_AVAILABLE);
        assert_eq!(s.values(&a), vec![1, 0]);
        // b is null: nothing pushed, previous value stays current
        assert_eq!(s.value(&b), "7");
        assert_eq!(s.values(&b), vec![7]);
    }

    #[tokio::test]
    async fn errors_hide_value_but_keep_history_and_max() {
        let f = Scripted::new(vec![Some(json!({ "mem": 2048 })), None]);
        let v = VarName::new("mem:mem");
        let mut s = service(&["mem:mem"]);
        s.update(&f).await;
        assert_eq!(s.value(&v), "2.0KB");
        s.update(&f).await;
        assert_eq!(s.value(&v), NOT_AVAILABLE);
        assert_eq!(s.values(&v), vec![2048, 0]);
        assert_eq!(s.max(&v).as_deref(), Some("2.0KB"));
    }

    #[tokio::test]
    async fn failed_tick_leaves_a_gap_in_every_history() {
        let f = Scripted::new(vec![
            Some(json!({ "a": 5, "b": 1.5 })),
            None,
            Some(json!({ "a": 6 })),
        ]);
        let a = VarName::new("a");
        let b = VarName::new("b");
        let mut s = service(&["a", "b"]);

        s.update(&f).await;
        s.update(&f).await;
        assert!(s.history(&a).unwrap().front().is_none());
        assert_eq!(s.values(&a), vec![5, 0]);
        assert_eq!(s.values(&b), vec![1, 0]);
        assert_eq!(s.uptime_counter, None);

        s.update(&f).await;
        assert_eq!(s.values(&a), vec![5, 0, 6]);
        assert_eq!(s.values(&b), vec![1, 0, 0]);
        assert_eq!(s.max(&b).as_deref(), Some("1.50"));
    }

    #[test]
    fn untracked_names() {
        let s = service(&["a"]);
        let other = VarName::new("zzz");
        assert_eq!(s.value(&other), NOT_AVAILABLE);
        assert!(s.values(&other).is_empty());
        assert!(s.max(&other).is_none());
        assert!(s.max(&VarName::new("a")).is_none());
    }

    #[tokio::test]
    async fn arrays_are_averaged_into_history() {
        let f = Scripted::new(vec![Some(json!({ "workers": [1, 2, 3] }))]);
        let w = VarName::new("workers");
        let mut s = service(&["workers"]);
        s.update(&f).await;
        assert_eq!(s.history(&w).unwrap().front(), Some(&Value::Int(2)));
    }

    #[tokio::test]
    async fn custom_uptime_counter() {
        let mut o = opts(&[]);
        o.uptime_counter = VarName::new("uptime");
        let mut s = Service::new(Url::parse("http://127.0.0.1:9000/").unwrap(), &o);
        let f = Scripted::new(vec![Some(json!({ "uptime": 9 })), Some(json!({ "uptime": 3 }))]);
        s.update(&f).await;
        s.update(&f).await;
        assert!(s.restarted);
    }

    #[tokio::test]
    async fn export_writes_one_row_per_tick() {
        let dir = tempfile::tempdir().unwrap();
        let f = Scripted::new(vec![Some(json!({ "n": 3 })), None]);
        let mut s = Service::with_export(
            Url::parse("http://localhost:7777/debug/vars").unwrap(),
            &opts(&["n"]),
            dir.path(),
        )
        .unwrap();
        s.update(&f).await;
        s.update(&f).await;
        s.close();
        s.close();

        let text = std::fs::read_to_string(dir.path().join("localhost_7777.csv")).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "time,n");
        assert!(lines[1].ends_with(",3"));
        assert!(lines[2].ends_with(",N/A"));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn base_command_strips_directories() {
        let cmd = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(base_command(&cmd(&["/usr/local/bin/app", "-x"])).as_deref(), Some("app"));
        assert_eq!(base_command(&cmd(&["app"])).as_deref(), Some("app"));
        assert_eq!(base_command(&cmd(&["C:\\svc\\app.exe"])).as_deref(), Some("app.exe"));
        assert_eq!(base_command(&[]), None);
    }
}
