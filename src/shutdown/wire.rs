// src/shutdown/wire.rs

//! Minimal wire-protocol client: just enough to deliver
//! `{shutdown: 1, force: true}` to the `admin` database.
//!
//! The command goes out as a legacy `OP_QUERY` against `admin.$cmd`, which is
//! what the server generations launched with `--smallfiles` and
//! `--nohttpinterface` understand.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

const OP_QUERY: i32 = 2004;
const ADMIN_COMMAND_NAMESPACE: &str = "admin.$cmd";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const REPLY_TIMEOUT: Duration = Duration::from_secs(1);

static NEXT_REQUEST_ID: AtomicI32 = AtomicI32::new(1);

/// The subset of BSON element types the shutdown command needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BsonValue {
    Int32(i32),
    Boolean(bool),
}

/// Encode an ordered list of fields as a BSON document.
pub fn encode_document(fields: &[(&str, BsonValue)]) -> Vec<u8> {
    let mut elements = Vec::new();
    for (name, value) in fields {
        match value {
            BsonValue::Int32(v) => {
                elements.push(0x10);
                push_cstring(&mut elements, name);
                elements.extend_from_slice(&v.to_le_bytes());
            }
            BsonValue::Boolean(v) => {
                elements.push(0x08);
                push_cstring(&mut elements, name);
                elements.push(u8::from(*v));
            }
        }
    }

    // int32 total length + elements + trailing NUL
    let total = 4 + elements.len() + 1;
    let mut doc = Vec::with_capacity(total);
    doc.extend_from_slice(&(total as i32).to_le_bytes());
    doc.extend_from_slice(&elements);
    doc.push(0x00);
    doc
}

/// Full `OP_QUERY` message carrying `{shutdown: 1, force: true}`.
pub fn encode_shutdown_command(request_id: i32) -> Vec<u8> {
    let query = encode_document(&[
        ("shutdown", BsonValue::Int32(1)),
        ("force", BsonValue::Boolean(true)),
    ]);

    let mut body = Vec::with_capacity(32 + query.len());
    body.extend_from_slice(&0i32.to_le_bytes()); // flags
    push_cstring(&mut body, ADMIN_COMMAND_NAMESPACE);
    body.extend_from_slice(&0i32.to_le_bytes()); // numberToSkip
    body.extend_from_slice(&(-1i32).to_le_bytes()); // numberToReturn
    body.extend_from_slice(&query);

    let length = 16 + body.len();
    let mut message = Vec::with_capacity(length);
    message.extend_from_slice(&(length as i32).to_le_bytes());
    message.extend_from_slice(&request_id.to_le_bytes());
    message.extend_from_slice(&0i32.to_le_bytes()); // responseTo
    message.extend_from_slice(&OP_QUERY.to_le_bytes());
    message.extend_from_slice(&body);
    message
}

fn push_cstring(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(s.as_bytes());
    buf.push(0x00);
}

/// Resolve `localhost:port`, preferring an IPv4 loopback address.
pub async fn resolve_localhost(port: u16) -> Result<SocketAddr> {
    let addrs: Vec<SocketAddr> = lookup_host(("localhost", port))
        .await
        .context("resolving localhost")?
        .collect();

    addrs
        .iter()
        .find(|a| a.is_ipv4() && a.ip().is_loopback())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| anyhow!("localhost resolved to no addresses"))
}

/// Deliver the shutdown command to the server on `localhost:port`.
///
/// Returns `true` once the command was written. The server usually drops the
/// connection instead of replying, so a missing reply is not a failure.
/// Resolution, connect and write errors are logged and yield `false`.
pub async fn send_shutdown(port: u16) -> bool {
    let addr = match resolve_localhost(port).await {
        Ok(addr) => addr,
        Err(e) => {
            error!(port, error = %e, "cannot resolve localhost for shutdown command");
            return false;
        }
    };

    let mut stream = match timeout(CONNECT_TIMEOUT, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            warn!(%addr, error = %e, "connecting for shutdown command failed");
            return false;
        }
        Err(_) => {
            warn!(%addr, timeout = ?CONNECT_TIMEOUT, "connecting for shutdown command timed out");
            return false;
        }
    };

    let request_id = NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed);
    let message = encode_shutdown_command(request_id);
    if let Err(e) = stream.write_all(&message).await {
        warn!(%addr, error = %e, "writing shutdown command failed");
        return false;
    }
    info!(%addr, request_id, "shutdown command sent");

    let mut reply = [0u8; 512];
    match timeout(REPLY_TIMEOUT, stream.read(&mut reply)).await {
        Ok(Ok(0)) => debug!(%addr, "server closed the connection after shutdown"),
        Ok(Ok(n)) => debug!(%addr, bytes = n, "server replied to shutdown"),
        Ok(Err(e)) => debug!(%addr, error = %e, "connection dropped after shutdown"),
        Err(_) => debug!(%addr, "no reply to shutdown command"),
    }

    true
}
