//! Time-based, random, COMB and machine-derived UUID generation.
//!
//! Time-based identifiers carry a 60-bit count of 100 nsec intervals since
//! 1582-10-15T00:00:00Z, a clock sequence that keeps identifiers generated within
//! the same tick apart, and a node id. They can be decoded back into their
//! creation instant and, when the node is a real hardware address, into it.
//!
//! ## Quickstart
//!
//! Add the following to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! small_uuid = "0.1"
//! ```
//!
//! Use the library like this:
//!
//! ```
//! use small_uuid::{extract_instant, UuidGenerator};
//!
//! let generator = UuidGenerator::new().unwrap();
//! let uuid = generator.timestamp_uuid().unwrap();
//! println!("{}", uuid); // e.g. "5b4dcd18-8c1b-11ef-9a61-4f2e8d0c1a37"
//! assert!(extract_instant(uuid).is_some());
//! ```
//!
//! ## Identifier flavors
//!
//! | Method                                 | Version | Timestamp order | Node             |
//! | -------------------------------------- | ------- | --------------- | ---------------- |
//! | `timestamp_uuid`                       | 1       | standard        | synthetic        |
//! | `timestamp_and_machine_uuid`           | 1       | standard        | hardware address |
//! | `natural_timestamp_uuid`               | 4       | natural         | synthetic        |
//! | `natural_timestamp_and_machine_uuid`   | 4       | natural         | hardware address |
//! | `random_uuid`, `random_hash_uuid`      | 4       | -               | -                |
//! | `prefix_comb`, `short_prefix_comb`     | 4       | -               | -                |
//! | `machine_uuid`                         | 4       | -               | -                |
//!
//! A synthetic node id has its multicast bit set and is never reported by
//! [`extract_node_id`]. Natural-order identifiers cannot be told apart from
//! random ones by inspection.
//!
//! ## Concurrent use
//!
//! UuidGenerator is thread-safe. `clone` it before moving to another thread:
//! ```
//! use small_uuid::UuidGenerator;
//! use std::thread;
//!
//! let generator = UuidGenerator::new().unwrap();
//!
//! let mut children = Vec::new();
//! for _ in 0..10 {
//!     let thread_generator = generator.clone();
//!     children.push(thread::spawn(move || {
//!         println!("{}", thread_generator.timestamp_uuid().unwrap());
//!     }));
//! }
//!
//! for child in children {
//!     child.join().unwrap();
//! }
//! ```

mod builder;
mod clock;
pub mod codec;
mod comb;
mod error;
mod generator;
mod host;
pub mod machine;
mod node;
mod random;
mod sequence;
mod timestamp;
mod uuid;

pub use crate::uuid::Uuid;
pub use builder::*;
pub use clock::{
    from_gregorian_timestamp, from_unix_millis, to_gregorian_timestamp, to_unix_millis, Clock,
    SystemClock, MAX_TIMESTAMP,
};
pub use comb::{comb_uuid, extract_prefix, CombLayout, DEFAULT_COMB_INTERVAL_MILLIS};
pub use error::*;
pub use generator::*;
pub use host::{HostInfo, Interface, SystemHostInfo};
pub use node::{resolve_real_node_id, NodeId};
pub use random::{random_hash_uuid, random_uuid, VERSION_RANDOM};
pub use sequence::{ClockSequence, Tick};
pub use timestamp::*;
