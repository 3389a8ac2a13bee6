pub mod daemon;
pub mod disclose;
pub mod inbox;
pub mod init;
pub mod keygen;
pub mod recipients;
pub mod register;
pub mod version;

pub use daemon::Daemon;
pub use disclose::Disclose;
pub use inbox::Inbox;
pub use init::Init;
pub use keygen::Keygen;
pub use recipients::Recipients;
pub use register::Register;
pub use version::Version;
