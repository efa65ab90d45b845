//! The Wake-up Driver (§4.6): stateless UDP nudge for agents that have
//! dropped their socket but published a rendezvous.
use std::io;

use tokio::net::UdpSocket;

/// Literal payload sent to an agent's wake-up rendezvous. Preserved for
/// compatibility; the spec assigns it no meaning beyond "any datagram
/// wakes the agent" (spec.md §9 open question).
const WAKEUP_PAYLOAD: &[u8] = b"push";

/// Resolve `(ip, port)` as a UDPv4 rendezvous and send the wake-up
/// datagram. Failure is terminal for this attempt; callers log and move
/// on, per spec.md §4.6/§7 ("UDP wake-up errors: log only").
pub async fn send_wakeup(ip: &str, port: u16) -> io::Result<()> {
    let addr = format!("{ip}:{port}");
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket.send_to(WAKEUP_PAYLOAD, addr).await?;
    Ok(())
}
