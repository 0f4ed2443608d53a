use serde_json::Value;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
    Eof,
    Stop,
    Quit,
    Error,
    Redirect,
    Unknown(String),
}

impl From<&str> for EndReason {
    fn from(r: &str) -> Self {
        use EndReason::*;
        match r {
            "eof" => Eof,
            "stop" => Stop,
            "quit" => Quit,
            "error" => Error,
            "redirect" => Redirect,
            x => Unknown(x.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    StartFile,
    FileLoaded,
    EndFile(EndReason),
    PropertyChange { id: u64, name: String, data: Value },
    Shutdown,
    Other(String),
}

/// An event line as mpv sends it.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct RawEvent {
    event: String,
    #[serde(default)]
    id: u64,
    name: Option<String>,
    #[serde(default)]
    data: Value,
    reason: Option<String>,
}

impl From<RawEvent> for Event {
    fn from(raw: RawEvent) -> Self {
        match raw.event.as_str() {
            "start-file" => Event::StartFile,
            "file-loaded" => Event::FileLoaded,
            "end-file" => Event::EndFile(raw.reason.as_deref().unwrap_or("unknown").into()),
            "shutdown" => Event::Shutdown,
            "property-change" => Event::PropertyChange {
                id: raw.id,
                name: raw.name.unwrap_or_default(),
                data: raw.data,
            },
            _ => Event::Other(raw.event.clone()),
        }
    }
}

/// Everything mpv says that is not a reply to a request.
#[derive(Debug)]
pub struct Events {
    pub(crate) rx: mpsc::Receiver<Event>,
}

impl Events {
    /// The next event, or `None` when the connection is gone.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}
