//! Host adapter: the service-worker style event surface

pub mod events;
pub mod worker;

pub use events::{
    EventCompletion, ExtendableEvent, MessageEvent, NotificationClickEvent, PushEvent, SyncEvent,
};
pub use worker::{activate_event, install_event, ServiceWorkerHost};
