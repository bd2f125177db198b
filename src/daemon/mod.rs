mod detach;
mod session;

pub use detach::{Detacher, ForkDetacher, Foreground};
pub use session::{Phase, Session, SessionOutcome};
