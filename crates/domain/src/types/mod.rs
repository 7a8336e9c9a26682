//! Domain types and models
//!
//! The request/response model, classification enums and the small value
//! types exchanged between the cache engine and its host.

pub mod http;
pub mod lifecycle;
pub mod messages;
pub mod resource;
pub mod security;
pub mod stats;

pub use http::{CacheKey, Headers, Method, Request, Response, ResponseSource};
pub use lifecycle::LifecycleState;
pub use messages::{
    ControlMessage, ControlReply, HostAction, NotificationAction, NotificationOptions, PushPayload,
};
pub use resource::{ResourceClass, Strategy, StrategyTable};
pub use security::{DenialReason, SecurityEvent, SecurityVerdict};
pub use stats::FetchStats;
