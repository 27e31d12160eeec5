mod error;
mod event;
mod transaction;

pub use error::DrawError;
pub use event::{DrawCompleted, DrawEvents};
pub use transaction::{
    DrawEngine, DrawOutcome, DrawRequest, DrawState, DrawnCard, MAX_HISTORY_LIMIT,
};
