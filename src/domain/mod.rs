//! Domain types shared across the accounting subsystem.

mod actor;
mod content;

pub use actor::{actor_key_from_ip, Actor, ActorKey};
pub use content::{ContentRef, ContentState, ContentStatus, ContentType};
