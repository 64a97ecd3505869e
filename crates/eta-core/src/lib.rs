pub mod backend;
pub mod config;
pub mod constants;
pub mod models;
pub mod preview;
pub mod session;
pub mod speaking;
pub mod storage;
pub mod store;
pub mod tracing_setup;
pub mod voice;

pub use backend::{Backend, HttpBackend};
pub use config::CoreConfig;
pub use models::{EtaProfile, Message, Persona, Role, Thread};
pub use session::{ActionKind, SessionController};
pub use store::ThreadStore;
