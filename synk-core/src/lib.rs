//! Fleet discovery and resync protocol reference implementation.
//! No I/O here; the daemon owns sockets and passes time and datagrams in.

pub mod peers;
pub mod playlist;
pub mod resync;
pub mod wire;

pub use peers::{PeerRecord, PeerTable};
pub use playlist::{EmptyPlaylist, Playlist, PlaylistEntry};
pub use resync::ResyncScheduler;
pub use wire::{DecodeError, Message, MAX_DATAGRAM};
