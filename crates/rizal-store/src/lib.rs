//! Storage layer for Rizal Quest.
//!
//! Everything the game remembers between launches lives in a flat
//! key-value store: two session records, a handful of legacy session keys,
//! and one progress blob per player. In the browser that store is
//! `localStorage`; here it is anything that implements [`KeyValueStore`].
//!
//! - **Backends** ([`KeyValueStore`] trait, [`MemoryStore`]) — where the
//!   string values physically live.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how typed records are
//!   turned into those strings and back.
//! - **Clocks** ([`Clock`] trait, [`SystemClock`], [`ManualClock`]) — where
//!   "now" and "today" come from, so expiry and streak logic can be tested
//!   without sleeping.
//! - **Errors** ([`StoreError`]) — what can go wrong reading or writing.
//!
//! # Architecture
//!
//! ```text
//! Session layer / Progress layer (above)  ← typed records
//!     ↕
//! Store layer (this crate)                ← strings keyed by name
//! ```

mod backend;
mod clock;
mod codec;
mod error;

pub use backend::{KeyValueStore, MemoryStore};
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::{JsonCodec, deep_merge};
pub use error::StoreError;
