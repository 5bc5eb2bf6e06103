mod model;
mod roster;
mod status;

pub use model::{
    generate_id, validate, Member, MemberCandidate, MemberFields, MemberId, MembershipType,
    DATE_FORMAT,
};
pub use roster::{MemberQuery, Roster, RosterSummary};
pub use status::{days_remaining, describe_remaining, end_of_day, status_of, Status};
