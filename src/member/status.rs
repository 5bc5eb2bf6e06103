use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::model::Member;
use crate::error::GymError;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Active,
    Expired,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Active => write!(f, "Active"),
            Status::Expired => write!(f, "Expired"),
        }
    }
}

impl FromStr for Status {
    type Err = GymError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Status::Active),
            "expired" => Ok(Status::Expired),
            other => Err(GymError::InvalidFilter(format!("unknown status '{other}'"))),
        }
    }
}

/// Last second of the given calendar day
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(23, 59, 59)
        .unwrap_or_else(|| date.and_time(NaiveTime::default()))
}

/// A membership stays active through the whole of its end date
pub fn status_of(member: &Member, now: NaiveDateTime) -> Status {
    if end_of_day(member.end) >= now {
        Status::Active
    } else {
        Status::Expired
    }
}

/// Whole days until the end of the membership, partial days rounded up.
///
/// Zero or negative once expired; the magnitude is then the number of days
/// since expiry. Uses a fixed 24-hour day.
pub fn days_remaining(member: &Member, now: NaiveDateTime) -> i64 {
    let millis = (end_of_day(member.end) - now).num_milliseconds();
    -(-millis).div_euclid(MILLIS_PER_DAY)
}

/// Human readable remaining time, e.g. "3 day(s) left" or "Expired 2 day(s) ago"
pub fn describe_remaining(member: &Member, now: NaiveDateTime) -> String {
    let days = days_remaining(member, now);
    match status_of(member, now) {
        Status::Active => format!("{days} day(s) left"),
        Status::Expired => format!("Expired {} day(s) ago", days.abs()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::model::{MemberId, MembershipType};
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, min, s).unwrap()
    }

    fn member_ending(end: NaiveDate) -> Member {
        Member {
            id: MemberId::from("m1"),
            name: "Jane".to_string(),
            phone: "555-1".to_string(),
            membership_type: MembershipType::Gym,
            amount_paid: 50.0,
            start: date(2024, 1, 1),
            end,
        }
    }

    #[test]
    fn test_end_of_day() {
        assert_eq!(end_of_day(date(2024, 3, 10)), at(2024, 3, 10, 23, 59, 59));
    }

    #[test]
    fn test_status_flips_after_end_of_day() {
        let member = member_ending(date(2024, 1, 31));
        let boundary = at(2024, 1, 31, 23, 59, 59);

        assert_eq!(status_of(&member, boundary), Status::Active);
        assert_eq!(
            status_of(&member, boundary + Duration::milliseconds(1)),
            Status::Expired
        );
    }

    #[test]
    fn test_end_today_is_active() {
        let member = member_ending(date(2024, 1, 31));
        let now = at(2024, 1, 31, 10, 0, 0);

        assert_eq!(status_of(&member, now), Status::Active);
        assert_eq!(days_remaining(&member, now), 1);
        assert_eq!(days_remaining(&member, at(2024, 1, 31, 23, 59, 59)), 0);
    }

    #[test]
    fn test_days_remaining_decreases_daily() {
        let member = member_ending(date(2024, 1, 31));
        let mut now = at(2024, 1, 28, 9, 30, 0);
        let mut previous = days_remaining(&member, now);
        assert_eq!(previous, 4);

        for _ in 0..6 {
            now += Duration::days(1);
            let current = days_remaining(&member, now);
            assert_eq!(current, previous - 1);
            previous = current;
        }
        // 2024-02-03 09:30, partial days round towards zero
        assert_eq!(previous, -2);
        assert_eq!(status_of(&member, now), Status::Expired);
    }

    #[test]
    fn test_describe_remaining() {
        let member = member_ending(date(2024, 1, 31));
        assert_eq!(
            describe_remaining(&member, at(2024, 1, 29, 12, 0, 0)),
            "3 day(s) left"
        );
        assert_eq!(
            describe_remaining(&member, at(2024, 2, 5, 12, 0, 0)),
            "Expired 4 day(s) ago"
        );
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("ACTIVE".parse::<Status>().unwrap(), Status::Active);
        assert_eq!("expired".parse::<Status>().unwrap(), Status::Expired);
        assert!("paused".parse::<Status>().is_err());
    }
}
