pub mod message;
pub mod persona;
pub mod profile;
pub mod raw;
pub mod thread;

pub use message::{Message, Role};
pub use persona::Persona;
pub use profile::EtaProfile;
pub use raw::{RawMessage, RawThread};
pub use thread::Thread;
