//! Remote command sessions and payload streaming

mod remote;
mod stream;

pub use remote::{remote_exec, CommandSession, SessionOutcome, SessionState, StdinMode};
pub use stream::{copy_exact, TransferResult, ZeroSource};
