// Library root for the match reconciliation core.
//
// Raw channel payloads are normalized (`update`), routed per channel
// (`channel`) into the `MatchStore` (`store`), which keeps one status-tagged
// record per match and the clock references (`clock`) used to show a
// running match time. Nothing here does I/O.

pub mod channel;
pub mod clock;
pub mod format;
pub mod log_entry;
pub mod model;
pub mod store;
pub mod update;

pub use channel::{Channel, ChannelRouter, Dispatch};
pub use model::{Match, MatchId, MatchStatus, Stamp};
pub use store::MatchStore;
pub use update::{MatchUpdate, PayloadError};
