//! Poll expvar-style debug documents from running services, keep a bounded
//! history of selected variables per service, detect restarts and render the
//! values in a terminal UI.
//!
//! The core is [`Service`]: every poll tick it fetches the document through a
//! [`Fetcher`], normalizes each tracked variable with [`guess_value`] and pushes
//! it into that variable's [`History`].

pub mod app;
pub mod config;
pub mod error;
pub mod export;
pub mod expvar;
pub mod format;
pub mod history;
pub mod service;
pub mod ui;
pub mod value;
pub mod var;

pub use app::App;
pub use config::{Args, Config};
pub use error::{Error, Result};
pub use expvar::{Document, Fetcher, HttpFetcher};
pub use format::format_value;
pub use history::History;
pub use service::{Service, ServiceOptions};
pub use value::{guess_value, Value};
pub use var::{VarKind, VarName};
