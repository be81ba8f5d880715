//! reading-circle library crate
//!
//! Balances the voters of a reaction-based poll into groups that satisfy
//! minimum and (best-effort) maximum size constraints, and provides the
//! pure collaborator logic around that core: vote extraction from fetched
//! reaction payloads, message composition, persisted-record validation,
//! and presenter selection.
//!
//! The crate performs no I/O. The embedding handler fetches reactions and
//! sends messages; everything here is synchronous computation whose only
//! non-determinism is an injected [`rand::Rng`].
//!
//! ```
//! use rand::SeedableRng;
//! use reading_circle::model::{Group, SizeConstraints};
//! use reading_circle::balance_groups;
//!
//! let groups = vec![
//!     Group::new("Dune", vec!["u1".into(), "u2".into(), "u3".into()]),
//!     Group::new("Solaris", vec!["u4".into(), "u5".into(), "u6".into(), "u7".into()]),
//! ];
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let balanced = balance_groups(groups, SizeConstraints::at_least(4), &mut rng).unwrap();
//! // 7 voters cannot sustain two groups of 4: everything merges.
//! assert_eq!(balanced.len(), 1);
//! assert_eq!(balanced[0].size(), 7);
//! ```

pub mod balance;
pub mod error;
pub mod model;
pub mod poll;

pub use balance::balance_groups;
pub use error::{Error, Result};
pub use model::{Group, ParticipantId, SizeConstraints};
pub use poll::{PollOutcome, resolve_poll};
