//! Fetching and walking the remote debug-variables document.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::error::{Error, Result};
use crate::var::VarName;

/// Path of the process command line in a Go-style `/debug/vars` document.
pub const CMDLINE_PATH: &str = "cmdline";

/// A decoded debug document.
#[derive(Debug, Clone)]
pub struct Document(serde_json::Value);

impl Document {
    pub fn new(root: serde_json::Value) -> Self {
        Self(root)
    }

    pub fn get_value<S: AsRef<str>>(&self, path: &[S]) -> Result<&serde_json::Value> {
        let mut cur = &self.0;
        for key in path {
            cur = cur
                .as_object()
                .and_then(|obj| obj.get(key.as_ref()))
                .ok_or_else(|| Error::PathNotFound(join(path)))?;
        }
        Ok(cur)
    }

    pub fn get_i64<S: AsRef<str>>(&self, path: &[S]) -> Result<i64> {
        let v = self.get_value(path)?;
        v.as_i64()
            .or_else(|| v.as_f64().map(|f| f as i64))
            .ok_or_else(|| Error::WrongType {
                path: join(path),
                expected: "integer",
            })
    }

    pub fn get_string_array<S: AsRef<str>>(&self, path: &[S]) -> Result<Vec<String>> {
        let wrong = || Error::WrongType {
            path: join(path),
            expected: "array of strings",
        };
        self.get_value(path)?
            .as_array()
            .ok_or_else(wrong)?
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(wrong))
            .collect()
    }

    pub fn get_var(&self, name: &VarName) -> Result<&serde_json::Value> {
        self.get_value(name.path())
    }
}

fn join<S: AsRef<str>>(path: &[S]) -> String {
    path.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(".")
}

/// Source of debug documents. Implemented over HTTP by [`HttpFetcher`].
pub trait Fetcher {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<Document>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("expvarmon/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<Document>> + Send {
        let request = self.client.get(url.clone());
        async move {
            let response = request.send().await?;
            if !response.status().is_success() {
                return Err(Error::Fetch(format!(
                    "server returned status {}",
                    response.status()
                )));
            }
            let root: serde_json::Value = response
                .json()
                .await
                .map_err(|e| Error::Decode(e.to_string()))?;
            Ok(Document::new(root))
        }
    }
}
