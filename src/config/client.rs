use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings of one named backend client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Connect timeout in milliseconds (default: 500)
    pub connect_timeout_ms: u64,

    /// Read timeout in milliseconds (default: 2000)
    pub read_timeout_ms: u64,

    /// Additional attempts after a failed one (default: 1)
    pub retries: u32,

    /// Guard calls with a circuit breaker and allow fallbacks (default: true)
    pub resilient: bool,

    /// Circuit breaker settings, used when `resilient` is set
    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 500,
            read_timeout_ms: 2000,
            retries: 1,
            resilient: true,
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Upper bound of a single attempt, connect and read included.
    pub fn call_timeout(&self) -> Duration {
        self.connect_timeout() + self.read_timeout()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failed calls before the circuit opens (default: 5)
    pub failure_threshold: u32,

    /// Cool-down in milliseconds before a trial call is let through (default: 5000)
    pub open_timeout_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_timeout_ms: 5000,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn open_timeout(&self) -> Duration {
        Duration::from_millis(self.open_timeout_ms)
    }
}
