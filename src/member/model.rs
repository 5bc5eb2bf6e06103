use chrono::{NaiveDate, Utc};
use rand::Rng;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

use crate::error::{GymError, Result};

/// Date format used at every boundary (forms, CSV, storage)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Opaque member identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum MembershipType {
    #[default]
    Gym,
    #[serde(rename = "Muay Thai")]
    MuayThai,
    #[serde(rename = "Muay Thai Kids")]
    MuayThaiKids,
    Zumba,
}

impl MembershipType {
    pub const ALL: [MembershipType; 4] = [
        MembershipType::Gym,
        MembershipType::MuayThai,
        MembershipType::MuayThaiKids,
        MembershipType::Zumba,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipType::Gym => "Gym",
            MembershipType::MuayThai => "Muay Thai",
            MembershipType::MuayThaiKids => "Muay Thai Kids",
            MembershipType::Zumba => "Zumba",
        }
    }
}

impl fmt::Display for MembershipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MembershipType {
    type Err = GymError;

    /// Accepts "Muay Thai", "muay-thai", "MUAY_THAI" and so on.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace(['-', '_'], " ");
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().to_lowercase() == normalized)
            .ok_or_else(|| GymError::InvalidRecord(format!("unknown membership type '{}'", s.trim())))
    }
}

/// Stored blobs may spell the type in any case ("zumba", "Muay-Thai")
impl<'de> Deserialize<'de> for MembershipType {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Amounts saved straight from a form are strings ("50", "")
fn deserialize_amount<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Number(f64),
        Text(String),
    }

    Ok(match Amount::deserialize(deserializer)? {
        Amount::Number(n) if n.is_finite() && n > 0.0 => n,
        Amount::Number(_) => 0.0,
        Amount::Text(s) => parse_amount(&s),
    })
}

/// A stored membership record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub phone: String,
    #[serde(rename = "type")]
    pub membership_type: MembershipType,
    #[serde(rename = "amount", deserialize_with = "deserialize_amount")]
    pub amount_paid: f64,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Member {
    pub fn new(id: MemberId, fields: MemberFields) -> Self {
        Self {
            id,
            name: fields.name,
            phone: fields.phone,
            membership_type: fields.membership_type,
            amount_paid: fields.amount_paid,
            start: fields.start,
            end: fields.end,
        }
    }

    /// Replace every field except the id
    pub fn apply(&mut self, fields: MemberFields) {
        self.name = fields.name;
        self.phone = fields.phone;
        self.membership_type = fields.membership_type;
        self.amount_paid = fields.amount_paid;
        self.start = fields.start;
        self.end = fields.end;
    }

    pub fn fields(&self) -> MemberFields {
        MemberFields {
            name: self.name.clone(),
            phone: self.phone.clone(),
            membership_type: self.membership_type,
            amount_paid: self.amount_paid,
            start: self.start,
            end: self.end,
        }
    }

    /// Candidate form of this member, used as the base for partial edits
    pub fn to_candidate(&self) -> MemberCandidate {
        MemberCandidate {
            name: self.name.clone(),
            phone: self.phone.clone(),
            membership_type: self.membership_type.to_string(),
            amount: self.amount_paid.to_string(),
            start: self.start.format(DATE_FORMAT).to_string(),
            end: self.end.format(DATE_FORMAT).to_string(),
        }
    }
}

/// Unvalidated member input, as typed into a form or read from a CSV row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberCandidate {
    pub name: String,
    pub phone: String,
    pub membership_type: String,
    pub amount: String,
    pub start: String,
    pub end: String,
}

/// Validated member fields (everything but the id)
#[derive(Debug, Clone, PartialEq)]
pub struct MemberFields {
    pub name: String,
    pub phone: String,
    pub membership_type: MembershipType,
    pub amount_paid: f64,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Validate a candidate into normalized member fields.
///
/// Name and phone must be non-empty and both dates must be `YYYY-MM-DD`.
/// A blank type means Gym; a blank or unparseable amount means 0.
/// An end date before the start date is accepted with a warning.
pub fn validate(candidate: &MemberCandidate) -> Result<MemberFields> {
    let name = candidate.name.trim();
    if name.is_empty() {
        return Err(GymError::InvalidRecord("name is required".to_string()));
    }

    let phone = candidate.phone.trim();
    if phone.is_empty() {
        return Err(GymError::InvalidRecord("phone is required".to_string()));
    }

    let start = parse_date("start", &candidate.start)?;
    let end = parse_date("end", &candidate.end)?;

    let membership_type = if candidate.membership_type.trim().is_empty() {
        MembershipType::Gym
    } else {
        candidate.membership_type.parse()?
    };

    if end < start {
        warn!(member = name, %start, %end, "membership ends before it starts");
    }

    Ok(MemberFields {
        name: name.to_string(),
        phone: phone.to_string(),
        membership_type,
        amount_paid: parse_amount(&candidate.amount),
        start,
        end,
    })
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
        GymError::InvalidRecord(format!(
            "{field} date '{value}' is not a valid YYYY-MM-DD date"
        ))
    })
}

fn parse_amount(value: &str) -> f64 {
    match value.trim().parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount > 0.0 => amount,
        _ => 0.0,
    }
}

static LAST_ID_MILLIS: AtomicU64 = AtomicU64::new(0);

/// Generate a fresh member id: base-36 milliseconds plus a random suffix.
///
/// The time component is kept strictly increasing within the process, so
/// ids never repeat even when generated within the same millisecond.
pub fn generate_id() -> MemberId {
    let now = Utc::now().timestamp_millis().max(0) as u64;
    let previous = LAST_ID_MILLIS
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or(now);
    let millis = now.max(previous + 1);

    let mut rng = rand::thread_rng();
    let suffix: String = (0..5)
        .map(|_| std::char::from_digit(rng.gen_range(0..36), 36).unwrap_or('0'))
        .collect();

    MemberId(format!("{}{}", to_base36(millis), suffix))
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(std::char::from_digit((value % 36) as u32, 36).unwrap_or('0'));
        value /= 36;
    }
    digits.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn candidate() -> MemberCandidate {
        MemberCandidate {
            name: " Jane Doe ".to_string(),
            phone: "555-0101".to_string(),
            membership_type: "Muay Thai".to_string(),
            amount: "50".to_string(),
            start: "2024-01-01".to_string(),
            end: "2024-01-31".to_string(),
        }
    }

    #[test]
    fn test_validate_normalizes_fields() {
        let fields = validate(&candidate()).unwrap();
        assert_eq!(fields.name, "Jane Doe");
        assert_eq!(fields.membership_type, MembershipType::MuayThai);
        assert_eq!(fields.amount_paid, 50.0);
        assert_eq!(fields.start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(fields.end, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
    }

    #[test]
    fn test_validate_requires_name_and_phone() {
        let mut c = candidate();
        c.name = "   ".to_string();
        assert!(matches!(validate(&c), Err(GymError::InvalidRecord(_))));

        let mut c = candidate();
        c.phone = String::new();
        assert!(matches!(validate(&c), Err(GymError::InvalidRecord(_))));
    }

    #[test]
    fn test_validate_rejects_bad_dates() {
        let mut c = candidate();
        c.start = "2024-13-01".to_string();
        assert!(matches!(validate(&c), Err(GymError::InvalidRecord(_))));

        let mut c = candidate();
        c.end = String::new();
        assert!(matches!(validate(&c), Err(GymError::InvalidRecord(_))));
    }

    #[test]
    fn test_validate_amount_defaults_to_zero() {
        let mut c = candidate();
        c.amount = String::new();
        assert_eq!(validate(&c).unwrap().amount_paid, 0.0);

        c.amount = "abc".to_string();
        assert_eq!(validate(&c).unwrap().amount_paid, 0.0);

        c.amount = "-20".to_string();
        assert_eq!(validate(&c).unwrap().amount_paid, 0.0);
    }

    #[test]
    fn test_validate_type_defaults_and_rejects_unknown() {
        let mut c = candidate();
        c.membership_type = " ".to_string();
        assert_eq!(validate(&c).unwrap().membership_type, MembershipType::Gym);

        c.membership_type = "Yoga".to_string();
        assert!(matches!(validate(&c), Err(GymError::InvalidRecord(_))));
    }

    #[test]
    fn test_validate_allows_end_before_start() {
        let mut c = candidate();
        c.start = "2024-02-01".to_string();
        c.end = "2024-01-01".to_string();
        assert!(validate(&c).is_ok());
    }

    #[test]
    fn test_membership_type_parsing() {
        assert_eq!("zumba".parse::<MembershipType>().unwrap(), MembershipType::Zumba);
        assert_eq!(
            "muay-thai-kids".parse::<MembershipType>().unwrap(),
            MembershipType::MuayThaiKids
        );
        assert_eq!(MembershipType::MuayThaiKids.to_string(), "Muay Thai Kids");
    }

    #[test]
    fn test_member_json_layout() {
        let member = Member::new(MemberId::from("abc"), validate(&candidate()).unwrap());
        let json = serde_json::to_value(&member).unwrap();
        assert_eq!(json["type"], "Muay Thai");
        assert_eq!(json["amount"], 50.0);
        assert_eq!(json["start"], "2024-01-01");
        assert_eq!(json["id"], "abc");
    }

    #[test]
    fn test_member_from_form_strings() {
        let member: Member = serde_json::from_str(
            r#"{"id":"lx1","name":"Jane","phone":"555-1","type":"muay thai kids","amount":"45.5","start":"2024-01-01","end":"2024-01-31"}"#,
        )
        .unwrap();
        assert_eq!(member.amount_paid, 45.5);
        assert_eq!(member.membership_type, MembershipType::MuayThaiKids);

        let blank: Member = serde_json::from_str(
            r#"{"id":"lx2","name":"Bob","phone":"555-2","type":"Gym","amount":"","start":"2024-01-01","end":"2024-01-31"}"#,
        )
        .unwrap();
        assert_eq!(blank.amount_paid, 0.0);
    }

    #[test]
    fn test_member_unknown_type_fails_to_load() {
        let result: std::result::Result<Member, _> = serde_json::from_str(
            r#"{"id":"lx1","name":"Jane","phone":"555-1","type":"Yoga","amount":10,"start":"2024-01-01","end":"2024-01-31"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_generate_id_unique() {
        let ids: HashSet<MemberId> = (0..1000).map(|_| generate_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }
}
