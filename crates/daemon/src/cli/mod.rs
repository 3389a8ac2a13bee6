pub mod args;
pub mod op;
pub mod ops;

pub use ops::{Daemon, Disclose, Inbox, Init, Keygen, Recipients, Register, Version};
