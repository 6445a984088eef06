use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

/// Enough kernel buffering for a few hundred ms of a typical multiplex
const RECV_BUFFER_BYTES: usize = 4 * 1024 * 1024;

/// Bind a UDP socket for TS reception, joining the group when `addr` is multicast
pub fn open_udp(addr: SocketAddr) -> anyhow::Result<UdpSocket> {
    let ip = match addr.ip() {
        IpAddr::V4(v4) => v4,
        _ => anyhow::bail!("only IPv4 is supported"),
    };

    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    if let Err(e) = socket.set_recv_buffer_size(RECV_BUFFER_BYTES) {
        log::warn!("could not raise receive buffer: {e}");
    }
    socket.bind(&addr.into())?;

    if ip.is_multicast() {
        socket.join_multicast_v4(&ip, &Ipv4Addr::UNSPECIFIED)?;
        log::info!("joined multicast group {ip}");
    }

    socket.set_nonblocking(true)?;
    Ok(UdpSocket::from_std(socket.into())?)
}
