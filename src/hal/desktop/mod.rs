//! Desktop implementations: UDP socket, system clock and a logging player.

mod audio;
mod clock;
mod udp;

pub use audio::LogPlayer;
pub use clock::SystemClock;
pub use udp::UdpTransport;
