pub mod classify;
pub mod coerce;
pub mod discovery;
pub mod leaderboard;
pub mod ledger;
pub mod pipeline;
pub mod review;
pub mod schema;
pub mod transcript;

pub use classify::*;
pub use coerce::*;
pub use discovery::*;
pub use leaderboard::*;
pub use ledger::*;
pub use pipeline::*;
pub use review::*;
pub use transcript::*;
