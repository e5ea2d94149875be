//! unreal-mcp-protocol: Wire definitions for the engine command channel
//!
//! This crate defines the command and reply types exchanged with the engine
//! plugin, and the newline-delimited JSON codec used to frame them over a
//! byte stream.

pub mod codec;
pub mod messages;

// Re-export main types at crate root
pub use codec::{CodecError, EngineCodec, MAX_MESSAGE_SIZE};
pub use messages::{Command, CommandError, RawReply};

/// Default TCP port the engine plugin listens on
pub const DEFAULT_ENGINE_PORT: u16 = 55557;
