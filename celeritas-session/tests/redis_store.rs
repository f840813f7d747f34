//! Redis backend against an in-process RESP server: key layout, `PX` expiry,
//! and connection hygiene after a lookup times out.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use chrono::Utc;
use http::{header, Request};
use serde_json::json;

use celeritas_session::{Deadline, SessionConfig, SessionManager, SessionRecord, StoreParams};

const SLOW_REPLY: Duration = Duration::from_millis(300);

/// Minimal RESP2 server: GET/SET/DEL over a shared map, with replies for
/// keys containing `slow` held back by [`SLOW_REPLY`].
struct FakeRedis {
    addr: SocketAddr,
    data: Arc<Mutex<HashMap<String, String>>>,
    commands: Arc<Mutex<Vec<Vec<String>>>>,
}

impl FakeRedis {
    fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake redis");
        let addr = listener.local_addr().expect("local addr");
        let data = Arc::new(Mutex::new(HashMap::new()));
        let commands = Arc::new(Mutex::new(Vec::new()));

        let (d, c) = (Arc::clone(&data), Arc::clone(&commands));
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let (d, c) = (Arc::clone(&d), Arc::clone(&c));
                thread::spawn(move || serve(stream, d, c));
            }
        });
        Self {
            addr,
            data,
            commands,
        }
    }

    fn url(&self) -> String {
        format!("redis://{}/", self.addr)
    }

    fn seed(&self, key: &str, record: &SessionRecord) {
        let payload = serde_json::to_string(record).expect("encode record");
        self.data.lock().unwrap().insert(key.to_string(), payload);
    }

    fn sent(&self, name: &str) -> Vec<Vec<String>> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .filter(|args| args[0].eq_ignore_ascii_case(name))
            .cloned()
            .collect()
    }
}

fn serve(
    stream: TcpStream,
    data: Arc<Mutex<HashMap<String, String>>>,
    commands: Arc<Mutex<Vec<Vec<String>>>>,
) {
    let Ok(read_half) = stream.try_clone() else {
        return;
    };
    let mut reader = BufReader::new(read_half);
    let mut writer = stream;
    while let Some(args) = read_command(&mut reader) {
        if args.is_empty() {
            return;
        }
        commands.lock().unwrap().push(args.clone());
        let reply = match args[0].to_ascii_uppercase().as_str() {
            "PING" => "+PONG\r\n".to_string(),
            "GET" => {
                if args[1].contains("slow") {
                    thread::sleep(SLOW_REPLY);
                }
                match data.lock().unwrap().get(&args[1]) {
                    Some(value) => format!("${}\r\n{}\r\n", value.len(), value),
                    None => "$-1\r\n".to_string(),
                }
            }
            "SET" => {
                data.lock().unwrap().insert(args[1].clone(), args[2].clone());
                "+OK\r\n".to_string()
            }
            "DEL" => {
                let removed = data.lock().unwrap().remove(&args[1]).is_some();
                format!(":{}\r\n", u8::from(removed))
            }
            _ => "+OK\r\n".to_string(),
        };
        if writer.write_all(reply.as_bytes()).is_err() {
            return;
        }
    }
}

fn read_command(reader: &mut impl BufRead) -> Option<Vec<String>> {
    let mut line = String::new();
    if reader.read_line(&mut line).ok()? == 0 {
        return None;
    }
    let count: usize = line.trim_end().strip_prefix('*')?.parse().ok()?;
    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        line.clear();
        reader.read_line(&mut line).ok()?;
        let len: usize = line.trim_end().strip_prefix('$')?.parse().ok()?;
        let mut buf = vec![0; len + 2];
        reader.read_exact(&mut buf).ok()?;
        buf.truncate(len);
        args.push(String::from_utf8_lossy(&buf).into_owned());
    }
    Some(args)
}

fn manager(server: &FakeRedis) -> SessionManager {
    let cfg = SessionConfig {
        session_type: "redis".to_string(),
        cookie_lifetime: "30".to_string(),
        store: StoreParams {
            redis_url: Some(server.url()),
            connect_timeout: Duration::from_secs(2),
            ..StoreParams::default()
        },
        ..SessionConfig::default()
    };
    SessionManager::build(&cfg).expect("redis session manager")
}

fn request(token: &str, deadline: Option<Deadline>) -> Request<()> {
    let mut builder = Request::builder().header(header::COOKIE, format!("session={token}"));
    if let Some(deadline) = deadline {
        builder = builder.extension(deadline);
    }
    builder.body(()).expect("request")
}

fn signed_in_record() -> SessionRecord {
    let mut record = SessionRecord::new(Utc::now() + chrono::Duration::days(1));
    record.values.insert("userID".into(), json!(1));
    record
}

#[test]
fn put_writes_prefixed_key_with_px_expiry() {
    let server = FakeRedis::start();
    let mgr = manager(&server);

    let token = mgr.put(None, "userID", 7).expect("put");

    let sets = server.sent("SET");
    assert_eq!(sets.len(), 1);
    let set = &sets[0];
    assert_eq!(set[1], format!("scs:session:{token}"));
    assert_eq!(set[3].to_ascii_uppercase(), "PX");
    let ttl_ms: i64 = set[4].parse().expect("numeric ttl");
    let lifetime_ms = 30 * 60 * 1000;
    assert!(
        ttl_ms > lifetime_ms - 5_000 && ttl_ms <= lifetime_ms,
        "ttl {ttl_ms}ms outside the 30 minute lifetime"
    );

    assert_eq!(mgr.get(&token, "userID").expect("get"), Some(json!(7)));
    assert!(mgr.exists(&request(&token, None), "userID"));
}

#[test]
fn destroy_deletes_the_key() {
    let server = FakeRedis::start();
    let mgr = manager(&server);
    let token = mgr.put(None, "userID", "u-9").expect("put");

    mgr.destroy(&token).expect("destroy");

    assert_eq!(server.sent("DEL").len(), 1);
    assert!(mgr.load(&token).expect("load").is_none());
}

#[test]
fn timed_out_lookup_does_not_leak_into_the_next_request() {
    let server = FakeRedis::start();
    server.seed("scs:session:slow-victim", &signed_in_record());
    let mgr = manager(&server);

    let hurried = request("slow-victim", Some(Deadline::after(Duration::from_millis(100))));
    assert!(!mgr.exists(&hurried, "userID"));

    // Let the late reply reach whichever socket it was written to.
    thread::sleep(SLOW_REPLY + Duration::from_millis(100));

    let anonymous = request("anonymous-visitor", None);
    assert!(
        !mgr.exists(&anonymous, "userID"),
        "anonymous token received another session's record"
    );
    assert!(mgr.load("anonymous-visitor").expect("load").is_none());

    // Without a deadline the slow record is still served intact.
    assert!(mgr.exists(&request("slow-victim", None), "userID"));
}
