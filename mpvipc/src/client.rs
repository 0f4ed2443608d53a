use std::{collections::HashMap, path::Path};

use serde_json::{json, Value};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
    net::UnixStream,
    select,
    sync::{mpsc, oneshot},
};

use crate::{events::RawEvent, Event, Events, IpcError, IpcResult, PropertyName};

const CHANNEL_SIZE: usize = 1000;
const SUCCESS: &str = "success";

type Responder = oneshot::Sender<IpcResult<Value>>;
type RequestSnd = mpsc::Sender<(Vec<Value>, Responder)>;
type RequestRcv = mpsc::Receiver<(Vec<Value>, Responder)>;
type EventSnd = mpsc::Sender<Event>;

/// A handle to a running mpv. Cheap to clone, all clones talk to the same connection.
#[derive(Debug, Clone)]
pub struct Client {
    tx: RequestSnd,
}

#[derive(Debug, serde::Serialize)]
struct Request<'a> {
    command: &'a [Value],
    request_id: u64,
}

#[derive(Debug, serde::Deserialize)]
struct Reply {
    #[serde(default)]
    data: Value,
    error: String,
    request_id: Option<u64>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
enum Incoming {
    Event(RawEvent),
    Reply(Reply),
}

/// Connects to the socket mpv opened with `--input-ipc-server`.
pub async fn connect(socket: impl AsRef<Path>) -> IpcResult<(Client, Events)> {
    let socket = socket.as_ref();
    log::debug!("Connecting to mpv at {:?}", socket);
    let stream = UnixStream::connect(socket).await?;
    Ok(from_stream(stream))
}

/// Speaks the ipc protocol over any stream. Spawns a task that owns the stream until
/// either mpv closes it or every handle is dropped.
pub fn from_stream<S>(stream: S) -> (Client, Events)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (req_tx, req_rx) = mpsc::channel(CHANNEL_SIZE);
    let (ev_tx, ev_rx) = mpsc::channel(CHANNEL_SIZE);
    tokio::spawn(actor(stream, req_rx, ev_tx));
    (Client { tx: req_tx }, Events { rx: ev_rx })
}

impl Client {
    /// Runs a raw mpv command and returns its `data`.
    pub async fn command(&self, args: Vec<Value>) -> IpcResult<Value> {
        let (tx, rx) = oneshot::channel();
        if self.tx.send((args, tx)).await.is_err() {
            return Err(IpcError::Exited);
        }
        match rx.await {
            Ok(res) => res,
            Err(_) => Err(IpcError::Exited),
        }
    }

    pub async fn get_property<P>(&self, prop: &P) -> IpcResult<Value>
    where
        P: PropertyName + ?Sized,
    {
        self.command(vec![json!("get_property"), json!(prop.name())])
            .await
    }

    pub async fn set_property<P>(&self, prop: &P, value: Value) -> IpcResult<()>
    where
        P: PropertyName + ?Sized,
    {
        log::debug!("Setting {} to {}", prop.name(), value);
        self.command(vec![json!("set_property"), json!(prop.name()), value])
            .await
            .map(|_| ())
    }

    /// Makes mpv send [Event::PropertyChange] with `id` every time `prop` changes.
    pub async fn observe_property<P>(&self, id: u64, prop: &P) -> IpcResult<()>
    where
        P: PropertyName + ?Sized,
    {
        self.command(vec![json!("observe_property"), json!(id), json!(prop.name())])
            .await
            .map(|_| ())
    }
}

async fn actor<S>(stream: S, mut req_rx: RequestRcv, ev_tx: EventSnd)
where
    S: AsyncRead + AsyncWrite,
{
    let (read, mut write) = tokio::io::split(stream);
    let mut lines = BufReader::new(read).lines();
    let mut pending: HashMap<u64, Responder> = HashMap::new();
    let mut next_id: u64 = 1;
    let mut clients_open = true;

    loop {
        select! {
            req = req_rx.recv(), if clients_open => match req {
                Some((args, resp)) => {
                    let id = next_id;
                    next_id += 1;
                    match send_request(&mut write, &args, id).await {
                        Ok(()) => {
                            pending.insert(id, resp);
                        }
                        Err(e) => {
                            resp.send(Err(e)).ok();
                        }
                    }
                }
                None => {
                    log::debug!("All mpv ipc clients are gone");
                    clients_open = false;
                }
            },
            _ = ev_tx.closed(), if !clients_open => break,
            line = lines.next_line() => match line {
                Ok(Some(line)) => dispatch(&line, &mut pending, &ev_tx),
                Ok(None) => {
                    log::debug!("Mpv closed the ipc socket");
                    break;
                }
                Err(e) => {
                    log::error!("Reading from the mpv ipc socket failed: {}", e);
                    break;
                }
            },
        }
    }

    // NOTE: dropping the pending responders makes the waiting clients see Exited
    log::debug!("Mpv ipc task shutting down with {} pending requests", pending.len());
}

async fn send_request<W>(write: &mut W, args: &[Value], id: u64) -> IpcResult<()>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_vec(&Request {
        command: args,
        request_id: id,
    })?;
    line.push(b'\n');
    log::trace!("mpv ipc request {}: {:?}", id, args);
    write.write_all(&line).await?;
    write.flush().await?;
    Ok(())
}

fn dispatch(line: &str, pending: &mut HashMap<u64, Responder>, ev_tx: &EventSnd) {
    match serde_json::from_str::<Incoming>(line) {
        Ok(Incoming::Event(raw)) => {
            let event = Event::from(raw);
            log::trace!("mpv event: {:?}", event);
            if let Err(mpsc::error::TrySendError::Full(event)) = ev_tx.try_send(event) {
                log::warn!("The event queue is full, dropping {:?}", event);
            }
        }
        Ok(Incoming::Reply(reply)) => {
            let Some(resp) = reply.request_id.and_then(|id| pending.remove(&id)) else {
                log::warn!("Mpv replied to an unknown request: {}", line);
                return;
            };
            let res = if reply.error == SUCCESS {
                Ok(reply.data)
            } else {
                Err(IpcError::Mpv(reply.error))
            };
            resp.send(res).ok();
        }
        Err(e) => log::warn!("Could not parse '{}' from mpv: {}", line, e),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{fake, Property, TrackField, TrackProperty};
    use tokio::io::{duplex, split};

    #[tokio::test]
    async fn properties_and_events() {
        let (client, mut events, _) = fake::mpv(&[("path", json!("/a.mkv"))]);

        assert_eq!(json!("/a.mkv"), client.get_property(&Property::Path).await.unwrap());

        client.observe_property(1, &Property::Sid).await.unwrap();
        client.set_property(&Property::Sid, json!(2)).await.unwrap();
        assert_eq!(
            Some(Event::PropertyChange {
                id: 1,
                name: "sid".into(),
                data: json!(2)
            }),
            events.next().await
        );
        assert_eq!(json!(2), client.get_property(&Property::Sid).await.unwrap());
    }

    #[tokio::test]
    async fn error_replies() {
        let (client, _events, _) = fake::mpv(&[]);
        let err = client
            .get_property(&TrackProperty::new(0, TrackField::Lang))
            .await
            .unwrap_err();
        assert!(err.is_unavailable(), "{err:?}");

        let err = client.command(vec![json!("frobnicate")]).await.unwrap_err();
        assert!(matches!(err, IpcError::Mpv(msg) if msg == "invalid parameter"));
    }

    #[tokio::test]
    async fn replies_are_matched_by_id() {
        let (ours, theirs) = duplex(4096);
        let (client, _events) = from_stream(ours);

        let server = tokio::spawn(async move {
            let (read, mut write) = split(theirs);
            let mut lines = BufReader::new(read).lines();
            let mut ids = Vec::new();
            for _ in 0..2 {
                let line = lines.next_line().await.unwrap().unwrap();
                let req: Value = serde_json::from_str(&line).unwrap();
                ids.push((req["request_id"].clone(), req["command"][1].clone()));
            }
            for (id, name) in ids.into_iter().rev() {
                let reply = json!({"data": name, "request_id": id, "error": "success"});
                write
                    .write_all(format!("{reply}\n").as_bytes())
                    .await
                    .unwrap();
            }
            lines
        });

        let (aid, sid) = tokio::join!(
            client.get_property(&Property::Aid),
            client.get_property(&Property::Sid)
        );
        assert_eq!(json!("aid"), aid.unwrap());
        assert_eq!(json!("sid"), sid.unwrap());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn exited_when_mpv_goes_away() {
        let (ours, theirs) = duplex(4096);
        let (client, mut events) = from_stream(ours);
        drop(theirs);

        assert_eq!(None, events.next().await);
        assert!(matches!(
            client.get_property(&Property::Path).await,
            Err(IpcError::Exited)
        ));
    }

    #[tokio::test]
    async fn garbage_is_skipped() {
        let (ours, theirs) = duplex(4096);
        let (_client, mut events) = from_stream(ours);
        let (_read, mut write) = split(theirs);
        write
            .write_all(b"not json\n{\"request_id\":99,\"error\":\"success\"}\n{\"event\":\"shutdown\"}\n")
            .await
            .unwrap();
        assert_eq!(Some(Event::Shutdown), events.next().await);
    }
}
