use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ledger::FlatOffering;

/// Identifier wrapper for users (NRIC style identifiers in the source data).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.trim().to_string())
    }
}

/// Project names are unique ignoring case and surrounding whitespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectName(pub String);

impl ProjectName {
    pub fn as_str(&self) -> &str {
        self.0.trim()
    }

    fn normalized(&self) -> String {
        self.0.trim().to_ascii_lowercase()
    }
}

impl PartialEq for ProjectName {
    fn eq(&self, other: &Self) -> bool {
        self.0.trim().eq_ignore_ascii_case(other.0.trim())
    }
}

impl Eq for ProjectName {}

impl Hash for ProjectName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ProjectName {
    fn from(value: &str) -> Self {
        Self(value.trim().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(pub String);

macro_rules! display_id {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        })*
    };
}

display_id!(ApplicationId, RegistrationId, BookingId);

/// Flat types on offer, ordered from smallest to largest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlatType {
    TwoRoom,
    ThreeRoom,
}

impl FlatType {
    pub const fn ordered() -> [Self; 2] {
        [Self::TwoRoom, Self::ThreeRoom]
    }

    pub const fn smallest() -> Self {
        Self::TwoRoom
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::TwoRoom => "TWO_ROOM",
            Self::ThreeRoom => "THREE_ROOM",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::TwoRoom => "2-Room",
            Self::ThreeRoom => "3-Room",
        }
    }
}

impl fmt::Display for FlatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for FlatType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().replace(['-', ' '], "_").as_str() {
            "TWO_ROOM" | "2_ROOM" | "2" => Ok(Self::TwoRoom),
            "THREE_ROOM" | "3_ROOM" | "3" => Ok(Self::ThreeRoom),
            other => Err(format!("unknown flat type '{other}' (expected TWO_ROOM or THREE_ROOM)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaritalStatus {
    Single,
    Married,
}

impl MaritalStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Single => "SINGLE",
            Self::Married => "MARRIED",
        }
    }
}

impl FromStr for MaritalStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "SINGLE" => Ok(Self::Single),
            "MARRIED" => Ok(Self::Married),
            other => Err(format!("unknown marital status '{other}' (expected SINGLE or MARRIED)")),
        }
    }
}

/// Status tracked throughout the application lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Pending,
    Successful,
    Unsuccessful,
    Booked,
    PendingWithdrawn,
    Withdrawn,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Successful => "SUCCESSFUL",
            Self::Unsuccessful => "UNSUCCESSFUL",
            Self::Booked => "BOOKED",
            Self::PendingWithdrawn => "PENDING_WITHDRAWN",
            Self::Withdrawn => "WITHDRAWN",
        }
    }

    /// An applicant may hold at most one application in an active status.
    pub const fn is_active(self) -> bool {
        matches!(
            self,
            Self::Pending | Self::Successful | Self::Booked | Self::PendingWithdrawn
        )
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "SUCCESSFUL" => Ok(Self::Successful),
            "UNSUCCESSFUL" => Ok(Self::Unsuccessful),
            "BOOKED" => Ok(Self::Booked),
            "PENDING_WITHDRAWN" => Ok(Self::PendingWithdrawn),
            "WITHDRAWN" => Ok(Self::Withdrawn),
            other => Err(format!("unknown application status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationStatus {
    Pending,
    Approved,
    Rejected,
}

impl RegistrationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RegistrationStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            other => Err(format!("unknown registration status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Approved,
}

impl BookingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            other => Err(format!("unknown booking status '{other}'")),
        }
    }
}

/// Manager or officer verdict on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject,
}

impl FromStr for Decision {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "approve" | "approved" | "y" | "yes" => Ok(Self::Approve),
            "reject" | "rejected" | "n" | "no" => Ok(Self::Reject),
            other => Err(format!("unknown decision '{other}' (expected approve or reject)")),
        }
    }
}

/// The applicant capability shared by plain applicants and officers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantProfile {
    pub user_id: UserId,
    pub name: String,
    pub age: u8,
    pub marital_status: MaritalStatus,
}

/// An officer applies like any applicant and may additionally administer one
/// project at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Officer {
    pub profile: ApplicantProfile,
    pub assigned_project: Option<ProjectName>,
    pub registration: Option<RegistrationId>,
}

impl Officer {
    pub fn new(profile: ApplicantProfile) -> Self {
        Self {
            profile,
            assigned_project: None,
            registration: None,
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.profile.user_id
    }
}

/// Housing development with one or two flat type offerings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: ProjectName,
    pub neighborhood: String,
    pub offerings: Vec<FlatOffering>,
    pub opening_date: NaiveDate,
    pub closing_date: NaiveDate,
    pub manager: UserId,
    /// Remaining officer places; decremented as registrations are approved.
    pub officer_slots: u32,
    pub assigned_officers: Vec<UserId>,
    pub visible: bool,
}

impl Project {
    pub fn offering(&self, flat_type: FlatType) -> Option<&FlatOffering> {
        self.offerings
            .iter()
            .find(|offering| offering.flat_type() == flat_type)
    }

    pub fn offers(&self, flat_type: FlatType) -> bool {
        self.offering(flat_type).is_some()
    }

    pub fn flat_types(&self) -> Vec<FlatType> {
        self.offerings.iter().map(FlatOffering::flat_type).collect()
    }

    /// Applications are accepted up to and including the closing date.
    pub fn window_closed(&self, today: NaiveDate) -> bool {
        today > self.closing_date
    }

    pub fn has_officer(&self, officer: &UserId) -> bool {
        self.assigned_officers.iter().any(|assigned| assigned == officer)
    }

    pub fn total_units(&self) -> u64 {
        self.offerings
            .iter()
            .map(|offering| u64::from(offering.units_available()))
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub applicant: UserId,
    pub project: ProjectName,
    pub flat_type: FlatType,
    pub status: ApplicationStatus,
    pub submitted_on: NaiveDate,
    /// Status to restore when a withdrawal request is rejected.
    #[serde(default)]
    pub status_before_withdrawal: Option<ApplicationStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub id: RegistrationId,
    pub officer: UserId,
    pub project: ProjectName,
    pub status: RegistrationStatus,
    pub submitted_on: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatBooking {
    pub id: BookingId,
    pub applicant: UserId,
    pub flat_type: FlatType,
    pub project: ProjectName,
    pub status: BookingStatus,
    pub requested_on: NaiveDate,
    #[serde(default)]
    pub approved_on: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_names_compare_ignoring_case_and_padding() {
        assert_eq!(ProjectName::from("Acacia"), ProjectName(" acacia ".to_string()));
        assert_ne!(ProjectName::from("Acacia"), ProjectName::from("Acacia Breeze"));
    }

    #[test]
    fn flat_type_parses_common_spellings() {
        assert_eq!("two_room".parse::<FlatType>(), Ok(FlatType::TwoRoom));
        assert_eq!("3-Room".parse::<FlatType>(), Ok(FlatType::ThreeRoom));
        assert!("FOUR_ROOM".parse::<FlatType>().is_err());
    }

    #[test]
    fn total_units_does_not_wrap() {
        let project = Project {
            name: ProjectName::from("Acacia"),
            neighborhood: "Yishun".to_string(),
            offerings: vec![
                FlatOffering::new(FlatType::TwoRoom, u32::MAX, 1),
                FlatOffering::new(FlatType::ThreeRoom, u32::MAX, 1),
            ],
            opening_date: NaiveDate::from_ymd_opt(2025, 2, 1).expect("valid date"),
            closing_date: NaiveDate::from_ymd_opt(2025, 4, 30).expect("valid date"),
            manager: UserId::from("T1234567J"),
            officer_slots: 1,
            assigned_officers: Vec::new(),
            visible: true,
        };
        assert_eq!(project.total_units(), 2 * u64::from(u32::MAX));
    }

    #[test]
    fn active_statuses_exclude_terminal_outcomes() {
        assert!(ApplicationStatus::Pending.is_active());
        assert!(ApplicationStatus::PendingWithdrawn.is_active());
        assert!(ApplicationStatus::Booked.is_active());
        assert!(!ApplicationStatus::Unsuccessful.is_active());
        assert!(!ApplicationStatus::Withdrawn.is_active());
    }
}
