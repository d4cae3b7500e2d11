// Thin re-export module: header records, the chain-head events built from
// them, and the broadcast stream that carries those events to subscribers.

pub mod event;
pub mod header;
pub mod stream;

pub use event::Event;
pub use header::{BlockHeader, Sha256Hash};
pub use stream::{EventStream, Subscription, SubscriptionCloser};
