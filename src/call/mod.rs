//! Call negotiation: the session state machine, its candidate buffer, the
//! peer transport seam, and the per-room supervisor.

pub mod candidates;
pub mod session;
pub mod supervisor;
pub mod transport;

pub use candidates::CandidateQueue;
pub use session::{CallRole, CallSession, SessionNotice, SessionState};
pub use supervisor::{CallNotice, CaptureFactory, SessionSupervisor, SupervisorCommand};
pub use transport::{LocalPeerTransport, PeerTransport, TransportEvent, TransportFactory};
