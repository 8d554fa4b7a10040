use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::model::NotifySettings;

const USER_AGENT: &str = concat!("ftpvault/", env!("CARGO_PKG_VERSION"));
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Start,
    Success,
    Failure,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Start => "start",
            EventKind::Success => "success",
            EventKind::Failure => "failure",
        }
    }
}

impl NotifySettings {
    pub fn allows(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::Start => self.notify_start,
            EventKind::Success => self.notify_success,
            EventKind::Failure => self.notify_failure,
        }
    }
}

/// Fire-and-forget delivery; implementations swallow their own errors.
pub trait Notifier {
    fn notify(&self, kind: EventKind, message: &str);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, kind: EventKind, message: &str) {
        debug!("notification ({}) not sent: {}", kind.as_str(), message);
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

pub struct WebhookNotifier {
    url: String,
    client: reqwest::blocking::Client,
}

impl WebhookNotifier {
    pub fn new(url: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            url: url.trim().to_string(),
            client,
        })
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, kind: EventKind, message: &str) {
        let result = self
            .client
            .post(&self.url)
            .json(&WebhookPayload { content: message })
            .send()
            .and_then(|res| res.error_for_status());
        if let Err(err) = result {
            warn!("webhook ({}) failed: {}", kind.as_str(), err);
        }
    }
}

/// Webhook notifier when a URL is configured, otherwise a no-op.
pub fn from_settings(settings: &NotifySettings) -> Box<dyn Notifier> {
    if settings.webhook_url.trim().is_empty() {
        return Box::new(NoopNotifier);
    }
    match WebhookNotifier::new(&settings.webhook_url) {
        Ok(notifier) => Box::new(notifier),
        Err(err) => {
            warn!("webhook disabled: {}", err);
            Box::new(NoopNotifier)
        }
    }
}

#[cfg(test)]
pub(crate) mod recording {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::{EventKind, Notifier};

    #[derive(Clone, Default)]
    pub struct RecordingNotifier {
        pub events: Rc<RefCell<Vec<(EventKind, String)>>>,
    }

    impl RecordingNotifier {
        pub fn kinds(&self) -> Vec<EventKind> {
            self.events.borrow().iter().map(|(kind, _)| *kind).collect()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, kind: EventKind, message: &str) {
            self.events.borrow_mut().push((kind, message.to_string()));
        }
    }
}
