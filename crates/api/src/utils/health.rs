//! Health reporting for the cache manager
//!
//! Served on the proxy's health endpoint and available from
//! [`AppContext::health_check`](crate::AppContext::health_check).

use chrono::Utc;
use lantern_core::CacheManager;
use lantern_domain::LifecycleState;
use serde::{Deserialize, Serialize};

/// Share of healthy components required for the whole to count as healthy.
const HEALTHY_THRESHOLD: f64 = 0.8;

/// Overall health of the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub is_healthy: bool,

    /// healthy components / total components
    pub score: f64,

    /// Generation the manager installs or serves
    pub version: String,

    pub components: Vec<ComponentHealth>,

    /// Unix timestamp of the check
    pub timestamp: i64,
}

impl HealthStatus {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            is_healthy: true,
            score: 1.0,
            version: version.into(),
            components: Vec::new(),
            timestamp: Utc::now().timestamp(),
        }
    }

    pub fn add_component(mut self, component: ComponentHealth) -> Self {
        self.components.push(component);
        self
    }

    /// Recompute `score` and `is_healthy` from the components.
    pub fn calculate_score(&mut self) {
        if self.components.is_empty() {
            return;
        }
        let healthy = self.components.iter().filter(|c| c.is_healthy).count();
        self.score = healthy as f64 / self.components.len() as f64;
        self.is_healthy = self.score >= HEALTHY_THRESHOLD;
    }
}

/// Health of one component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub is_healthy: bool,
    pub message: Option<String>,
}

impl ComponentHealth {
    pub fn healthy(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_healthy: true, message: None }
    }

    pub fn unhealthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self { name: name.into(), is_healthy: false, message: Some(message.into()) }
    }
}

/// Check the lifecycle state and the cache size of `manager`.
pub async fn check(manager: &CacheManager) -> HealthStatus {
    let state = manager.state();
    let lifecycle = if state == LifecycleState::Active {
        ComponentHealth::healthy("lifecycle")
    } else {
        ComponentHealth::unhealthy("lifecycle", format!("generation is {state}"))
    };

    let cache = match manager.active_store() {
        None => ComponentHealth::unhealthy("cache_size", "no active generation"),
        Some(store) => match manager.janitor().estimate_size(store.as_ref()).await {
            Ok(estimate) if manager.janitor().exceeds_limit(&estimate) => ComponentHealth::unhealthy(
                "cache_size",
                format!(
                    "estimated {} bytes over the {} byte limit",
                    estimate.bytes,
                    manager.janitor().max_bytes()
                ),
            ),
            Ok(_) => ComponentHealth::healthy("cache_size"),
            Err(err) => ComponentHealth::unhealthy("cache_size", err.to_string()),
        },
    };

    let mut status =
        HealthStatus::new(manager.version()).add_component(lifecycle).add_component(cache);
    status.calculate_score();
    status
}
