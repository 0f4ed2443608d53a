use std::collections::HashMap;

use serde_json::{json, Value};
use tokio::{
    io::{duplex, split, AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream},
    task::JoinHandle,
};

use crate::{from_stream, Client, Events};

type Props = HashMap<String, Value>;

/// An mpv that only knows about properties. Returns the final properties when the
/// connection closes.
pub fn mpv(props: &[(&str, Value)]) -> (Client, Events, JoinHandle<Props>) {
    let props = props
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    let (ours, theirs) = duplex(64 * 1024);
    let server = tokio::spawn(serve(theirs, props));
    let (client, events) = from_stream(ours);
    (client, events, server)
}

async fn serve(stream: DuplexStream, mut props: Props) -> Props {
    let (read, mut write) = split(stream);
    let mut lines = BufReader::new(read).lines();
    let mut observed: HashMap<String, Value> = HashMap::new();

    while let Ok(Some(line)) = lines.next_line().await {
        let req: Value = serde_json::from_str(&line).expect("client sends json");
        let id = req["request_id"].clone();
        let cmd = req["command"].as_array().cloned().unwrap_or_default();
        let name = |i: usize| cmd.get(i).and_then(Value::as_str).unwrap_or("").to_string();

        let mut events = Vec::new();
        let result = match name(0).as_str() {
            "get_property" => props
                .get(&name(1))
                .cloned()
                .ok_or("property unavailable"),
            "set_property" => {
                let prop = name(1);
                let value = match cmd.get(2) {
                    Some(Value::String(s)) if s == "no" => Value::Bool(false),
                    Some(v) => v.clone(),
                    None => Value::Null,
                };
                if let Some(obs) = observed.get(&prop) {
                    events.push(json!({
                        "event": "property-change",
                        "id": obs,
                        "name": prop,
                        "data": value,
                    }));
                }
                props.insert(prop, value);
                Ok(Value::Null)
            }
            "observe_property" => {
                observed.insert(name(2), cmd.get(1).cloned().unwrap_or_default());
                Ok(Value::Null)
            }
            _ => Err("invalid parameter"),
        };

        let reply = match result {
            Ok(data) => json!({"data": data, "request_id": id, "error": "success"}),
            Err(e) => json!({"request_id": id, "error": e}),
        };
        for msg in std::iter::once(reply).chain(events) {
            if write.write_all(format!("{msg}\n").as_bytes()).await.is_err() {
                return props;
            }
        }
    }

    props
}
