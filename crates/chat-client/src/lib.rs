pub mod session;
pub mod transport;

pub use session::{
    ChatSession, Key, KeyOutcome, KeyPress, PendingSend, ResponseMode, SendOutcome,
};
pub use transport::{ChatTransport, ChunkSink, RelayClient, TransportError, TransportFuture};
