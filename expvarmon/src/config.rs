//! Command line arguments and the validated runtime configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use url::Url;

use crate::error::{Error, Result};
use crate::history::DEFAULT_HISTORY;
use crate::service::{ServiceOptions, DEFAULT_UPTIME_COUNTER};
use crate::var::{parse_vars, VarName};

pub const DEFAULT_VARS: &str = "mem:memstats.Alloc,mem:memstats.Sys,mem:memstats.HeapAlloc,mem:memstats.HeapInuse,duration:memstats.PauseNs,duration:memstats.PauseTotalNs";

#[derive(Parser, Debug, Clone)]
#[command(name = "expvarmon")]
#[command(about = "Monitor expvar-style debug variables of one or more services")]
pub struct Args {
    /// Endpoints to poll: ports (1234), ranges (2000-2003), host:port or full URLs, comma separated
    #[arg(short, long, env = "EXPVARMON_PORTS", default_value = "1234")]
    pub ports: String,

    /// Variables to track, comma separated; prefix with mem:, duration:, str: or gccpu: to pick a format
    #[arg(short, long, env = "EXPVARMON_VARS", default_value = DEFAULT_VARS)]
    pub vars: String,

    /// Poll interval (e.g. "5s", "500ms")
    #[arg(short, long, env = "EXPVARMON_INTERVAL", default_value = "5s")]
    pub interval: String,

    /// Per-request HTTP timeout
    #[arg(long, env = "EXPVARMON_TIMEOUT", default_value = "2s")]
    pub timeout: String,

    /// Path of the debug document on each endpoint
    #[arg(long, env = "EXPVARMON_ENDPOINT", default_value = "/debug/vars")]
    pub endpoint: String,

    /// Number of samples kept per variable
    #[arg(long, env = "EXPVARMON_HISTORY", default_value_t = DEFAULT_HISTORY)]
    pub history: usize,

    /// Variable expected to grow monotonically; a decrease means the service restarted
    #[arg(long, env = "EXPVARMON_UPTIME_COUNTER", default_value = DEFAULT_UPTIME_COUNTER)]
    pub uptime_counter: String,

    /// Append every poll to <name>.csv per service
    #[arg(long, env = "EXPVARMON_EXPORT")]
    pub export: bool,

    /// Directory for CSV export files
    #[arg(long, env = "EXPVARMON_EXPORT_DIR", default_value = ".")]
    pub export_dir: PathBuf,

    /// Poll once, print the values and exit
    #[arg(long)]
    pub dummy: bool,

    /// Write logs to this file (the terminal UI owns stdout)
    #[arg(long, env = "EXPVARMON_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub endpoints: Vec<Url>,
    pub vars: Vec<VarName>,
    pub interval: Duration,
    pub timeout: Duration,
    pub history: usize,
    pub uptime_counter: VarName,
    pub export_dir: Option<PathBuf>,
    pub dummy: bool,
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self> {
        let endpoints = parse_ports(&args.ports, &args.endpoint)?;
        let vars = parse_vars(&args.vars);
        if vars.is_empty() {
            return Err(Error::InvalidConfig("no variables to track".into()));
        }
        if args.history == 0 {
            return Err(Error::InvalidConfig("history must be at least 1".into()));
        }
        let interval = parse_duration(&args.interval)?;
        if interval.is_zero() {
            return Err(Error::InvalidInterval(args.interval));
        }
        let timeout = parse_duration(&args.timeout)?;

        Ok(Self {
            endpoints,
            vars,
            interval,
            timeout,
            history: args.history,
            uptime_counter: VarName::new(&args.uptime_counter),
            export_dir: args.export.then_some(args.export_dir),
            dummy: args.dummy,
            log_file: args.log_file,
        })
    }

    pub fn service_options(&self) -> ServiceOptions {
        ServiceOptions {
            vars: self.vars.clone(),
            history: self.history,
            uptime_counter: self.uptime_counter.clone(),
        }
    }
}

/// Suffix to nanoseconds multiplier (order matters: longer suffixes first)
const UNITS: &[(&str, f64)] = &[
    ("ns", 1.0),
    ("µs", 1_000.0),
    ("us", 1_000.0),
    ("ms", 1_000_000.0),
    ("s", 1_000_000_000.0),
    ("m", 60_000_000_000.0),
    ("h", 3_600_000_000_000.0),
];

/// Parse duration strings like "5s", "250ms", "1.5m"
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    for (suffix, multiplier) in UNITS {
        if let Some(val_str) = s.strip_suffix(suffix) {
            let val: f64 = val_str
                .parse()
                .map_err(|_| Error::InvalidInterval(s.to_string()))?;
            if !val.is_finite() || val < 0.0 {
                return Err(Error::InvalidInterval(s.to_string()));
            }
            return Ok(Duration::from_nanos((val * multiplier) as u64));
        }
    }

    Err(Error::InvalidInterval(s.to_string()))
}

/// Expand a comma separated endpoint list into debug document URLs.
///
/// Accepted items: `1234`, `2000-2003`, `host:1234`, `host:2000-2003` and full
/// `http(s)://` URLs. `endpoint` is used as the path unless a URL already has one.
pub fn parse_ports(list: &str, endpoint: &str) -> Result<Vec<Url>> {
    let mut urls = Vec::new();
    for item in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if item.starts_with("http://") || item.starts_with("https://") {
            let mut url = Url::parse(item).map_err(|e| Error::InvalidPorts(format!("{item}: {e}")))?;
            if url.path().is_empty() || url.path() == "/" {
                url.set_path(endpoint);
            }
            urls.push(url);
            continue;
        }

        let (host, ports) = match item.rsplit_once(':') {
            Some((host, ports)) => (host, ports),
            None => ("localhost", item),
        };
        for port in parse_port_range(ports).map_err(|_| Error::InvalidPorts(item.to_string()))? {
            let raw = format!("http://{host}:{port}{endpoint}");
            let url = Url::parse(&raw).map_err(|e| Error::InvalidPorts(format!("{item}: {e}")))?;
            urls.push(url);
        }
    }

    if urls.is_empty() {
        return Err(Error::InvalidPorts(list.to_string()));
    }
    Ok(urls)
}

fn parse_port_range(s: &str) -> std::result::Result<Vec<u16>, std::num::ParseIntError> {
    match s.split_once('-') {
        Some((from, to)) => {
            let from: u16 = from.trim().parse()?;
            let to: u16 = to.trim().parse()?;
            Ok((from..=to).collect())
        }
        None => Ok(vec![s.trim().parse()?]),
    }
}
