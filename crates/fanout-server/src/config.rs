//! Server configuration.

use std::time::Duration;

/// URLs fetched by the HTTP batch endpoints. One of them does not exist.
const DEFAULT_URLS: [&str; 4] = [
    "https://microsoftedge.github.io/Demos/json-dummy-data/invalid-url",
    "https://microsoftedge.github.io/Demos/json-dummy-data/1MB.json",
    "https://microsoftedge.github.io/Demos/json-dummy-data/5MB.json",
    "https://microsoftedge.github.io/Demos/json-dummy-data/512KB.json",
];

/// Delays, in seconds, of the simulated tasks.
const DEFAULT_DELAYS_SECS: [u64; 4] = [5, 3, 2, 0];

/// A simulated unit of work that just sleeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedTask {
    /// Task name, unique within the batch.
    pub name: String,

    /// How long the task sleeps.
    pub delay: Duration,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server bind address.
    pub bind_addr: String,

    /// Tasks run by `/async/tasks`.
    pub simulated_tasks: Vec<SimulatedTask>,

    /// URLs fetched by `/async/http` and `/sync/http`.
    pub urls: Vec<String>,

    /// Per-request timeout applied by the fetcher (seconds).
    pub request_timeout_secs: u64,
}

impl Config {
    /// Replace the simulated tasks with `task1..taskN` sleeping the given seconds.
    pub fn with_delays(mut self, delays_secs: &[u64]) -> Self {
        self.simulated_tasks = simulated_tasks(delays_secs);
        self
    }

    /// Replace the fetched URLs.
    pub fn with_urls(mut self, urls: Vec<String>) -> Self {
        self.urls = urls;
        self
    }

    /// Per-request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn simulated_tasks(delays_secs: &[u64]) -> Vec<SimulatedTask> {
    delays_secs
        .iter()
        .enumerate()
        .map(|(i, secs)| SimulatedTask {
            name: format!("task{}", i + 1),
            delay: Duration::from_secs(*secs),
        })
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            simulated_tasks: simulated_tasks(&DEFAULT_DELAYS_SECS),
            urls: DEFAULT_URLS.iter().map(|u| u.to_string()).collect(),
            request_timeout_secs: 30,
        }
    }
}
