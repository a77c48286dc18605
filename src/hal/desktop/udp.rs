//! Non-blocking UDP transport to the command station.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use tracing::info;

use crate::config::Z21Config;
use crate::traits::Transport;

/// Receive buffer size; Z21 datagrams are far smaller.
const RECV_BUFFER: usize = 1024;

/// UDP socket bound to the station port on all interfaces.
///
/// The Z21 answers to the port it was addressed from, so the socket binds
/// the same port number it sends to.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    station: SocketAddr,
    buffer: Box<[u8; RECV_BUFFER]>,
}

impl UdpTransport {
    /// Bind locally and resolve the station address.
    pub fn connect(config: &Z21Config) -> io::Result<Self> {
        let station = (config.host.as_str(), config.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no address for {}", config.host),
                )
            })?;
        let socket = UdpSocket::bind(("0.0.0.0", config.port))?;
        socket.set_nonblocking(true)?;
        info!(%station, "UDP transport ready");
        Ok(Self {
            socket,
            station,
            buffer: Box::new([0u8; RECV_BUFFER]),
        })
    }

    /// Station address datagrams are sent to.
    pub fn station(&self) -> SocketAddr {
        self.station
    }
}

impl Transport for UdpTransport {
    type Error = io::Error;

    fn send(&mut self, datagram: &[u8]) -> io::Result<()> {
        self.socket.send_to(datagram, self.station)?;
        Ok(())
    }

    fn try_receive(&mut self) -> io::Result<Option<Vec<u8>>> {
        match self.socket.recv_from(&mut self.buffer[..]) {
            Ok((len, _from)) => Ok(Some(self.buffer[..len].to_vec())),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }
}
