pub mod roster;
pub mod session;

pub use roster::{AttendanceStatus, MarkedBy, RosterCounts, RosterEntry, RosterSnapshot};
pub use session::{PeriodInfo, SessionDescriptor, SessionId, SessionPhase};
