//! Event dispatch onto the cache manager

use std::sync::Arc;

use chrono::Utc;
use lantern_core::{ActivationOutcome, CacheManager, InstallOutcome};
use lantern_domain::{
    HostAction, NotificationAction, NotificationOptions, PushPayload, Request, Response, Result,
};
use tracing::{debug, info, warn};

use crate::context::ClientRegistry;

use super::events::{
    EventCompletion, ExtendableEvent, MessageEvent, NotificationClickEvent, PushEvent, SyncEvent,
};

pub const DEFAULT_NOTIFICATION_TITLE: &str = "Lantern";
pub const DEFAULT_NOTIFICATION_BODY: &str = "New content available";
pub const NOTIFICATION_ICON: &str = "/assets/images/icons/icon-192x192.png";
pub const NOTIFICATION_BADGE: &str = "/assets/images/icons/icon-72x72.png";
pub const NOTIFICATION_VIBRATE: [u32; 3] = [100, 50, 100];
pub const BACKGROUND_SYNC_TAG: &str = "background-sync";

const EXPLORE_ACTION: &str = "explore";
const CLOSE_ACTION: &str = "close";
const APP_ROOT: &str = "/";

/// The event surface a host process drives.
///
/// Push, notification and sync handlers only compute [`HostAction`]s; they
/// never touch cache state.
pub struct ServiceWorkerHost {
    manager: Arc<CacheManager>,
    clients: Arc<ClientRegistry>,
}

impl ServiceWorkerHost {
    pub fn new(manager: Arc<CacheManager>, clients: Arc<ClientRegistry>) -> Self {
        Self { manager, clients }
    }

    pub fn manager(&self) -> &Arc<CacheManager> {
        &self.manager
    }

    /// Fire install, then activate when the install outcome asks for it.
    ///
    /// # Errors
    /// Returns the install or activation error; a failed install leaves the
    /// previously active generation serving.
    pub async fn start(&self) -> Result<(InstallOutcome, Option<ActivationOutcome>)> {
        let (event, completion) = install_event();
        let installed = self.on_install(event).await?;
        completion.wait().await?;

        if !installed.activate_now {
            info!(version = %installed.version, "installed generation is waiting to activate");
            return Ok((installed, None));
        }

        let (event, completion) = activate_event();
        let activated = self.on_activate(event).await?;
        completion.wait().await?;
        Ok((installed, Some(activated)))
    }

    pub async fn on_install(&self, event: ExtendableEvent) -> Result<InstallOutcome> {
        info!(version = %self.manager.version(), "install event");
        event.wait_until(self.manager.install()).await
    }

    pub async fn on_activate(&self, event: ExtendableEvent) -> Result<ActivationOutcome> {
        info!(version = %self.manager.version(), "activate event");
        event.wait_until(self.manager.activate()).await
    }

    /// `None` lets the request through to the network untouched.
    pub async fn on_fetch(&self, request: &Request) -> Option<Response> {
        self.manager.handle_fetch(request).await
    }

    /// Handle a control message, posting the reply (if any) back over the
    /// event's port.
    ///
    /// # Errors
    /// Returns the manager's error, e.g. a storage failure while clearing.
    pub async fn on_message(&self, event: MessageEvent) -> Result<()> {
        let message = event.data();
        debug!(message = ?message, "message event");
        if let Some(reply) = self.manager.handle_message(message).await? {
            if !event.respond(reply) {
                debug!(message = ?message, "reply dropped, no port");
            }
        }
        Ok(())
    }

    /// Build the notification for a push message.
    pub fn on_push(&self, event: &PushEvent) -> HostAction {
        let payload = match event.data.as_deref() {
            Some(data) => serde_json::from_str::<PushPayload>(data).unwrap_or_else(|err| {
                warn!(error = %err, "unparseable push payload");
                PushPayload::default()
            }),
            None => PushPayload::default(),
        };
        HostAction::ShowNotification(notification_for(payload))
    }

    pub fn on_notification_click(&self, event: &NotificationClickEvent) -> HostAction {
        match event.action.as_str() {
            EXPLORE_ACTION => HostAction::OpenWindow(APP_ROOT.to_string()),
            CLOSE_ACTION => {
                debug!("notification dismissed");
                HostAction::None
            }
            _ => match self.clients.find_by_url(APP_ROOT) {
                Some(client) => {
                    debug!(client = client.id, "focusing open client");
                    HostAction::FocusOrOpen(APP_ROOT.to_string())
                }
                None => HostAction::OpenWindow(APP_ROOT.to_string()),
            },
        }
    }

    /// Returns whether the tag was recognised.
    pub fn on_sync(&self, event: &SyncEvent) -> bool {
        if event.tag == BACKGROUND_SYNC_TAG {
            info!(tag = %event.tag, "background sync");
            true
        } else {
            debug!(tag = %event.tag, "ignoring sync tag");
            false
        }
    }
}

/// Install event plus its completion handle.
pub fn install_event() -> (ExtendableEvent, EventCompletion) {
    ExtendableEvent::new("install")
}

/// Activate event plus its completion handle.
pub fn activate_event() -> (ExtendableEvent, EventCompletion) {
    ExtendableEvent::new("activate")
}

fn notification_for(payload: PushPayload) -> NotificationOptions {
    let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    NotificationOptions {
        title: non_empty(payload.title).unwrap_or_else(|| DEFAULT_NOTIFICATION_TITLE.to_string()),
        body: non_empty(payload.body).unwrap_or_else(|| DEFAULT_NOTIFICATION_BODY.to_string()),
        icon: NOTIFICATION_ICON.to_string(),
        badge: NOTIFICATION_BADGE.to_string(),
        vibrate: NOTIFICATION_VIBRATE.to_vec(),
        actions: vec![
            NotificationAction {
                action: EXPLORE_ACTION.to_string(),
                title: "Open".to_string(),
                icon: "/assets/images/icons/view-icon.png".to_string(),
            },
            NotificationAction {
                action: CLOSE_ACTION.to_string(),
                title: "Close".to_string(),
                icon: "/assets/images/icons/close-icon.png".to_string(),
            },
        ],
        arrived_at: Utc::now(),
    }
}
