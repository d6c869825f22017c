use chrono::NaiveDate;

use super::super::domain::{
    Application, ApplicationStatus, FlatType, MaritalStatus, Project, Registration,
    RegistrationStatus,
};
use super::config::EligibilityPolicy;
use super::policy::{DenialReason, Eligibility};

/// What an officer currently holds, gathered by the caller before a request.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfficerStanding<'a> {
    /// The application still attached to the officer, if any.
    pub application: Option<&'a Application>,
    pub registration: Option<&'a Registration>,
    pub assigned_project: Option<&'a Project>,
}

impl<'a> OfficerStanding<'a> {
    fn live_assignment(&self, today: NaiveDate) -> Option<&'a Project> {
        self.assigned_project
            .filter(|project| !project.window_closed(today))
    }
}

/// Flat type eligibility by marital status and age. Whether the project
/// actually offers the flat type is checked separately.
pub fn can_apply(
    policy: &EligibilityPolicy,
    marital_status: MaritalStatus,
    age: u8,
    requested: FlatType,
) -> Eligibility {
    match marital_status {
        MaritalStatus::Single if age < policy.single_min_age => {
            Eligibility::Denied(DenialReason::SingleUnderAge {
                age,
                minimum: policy.single_min_age,
            })
        }
        MaritalStatus::Single if requested != FlatType::smallest() => {
            Eligibility::Denied(DenialReason::SingleRestrictedToSmallest { requested })
        }
        MaritalStatus::Single => Eligibility::Allowed,
        MaritalStatus::Married if age < policy.married_min_age => {
            Eligibility::Denied(DenialReason::MarriedUnderAge {
                age,
                minimum: policy.married_min_age,
            })
        }
        MaritalStatus::Married => Eligibility::Allowed,
    }
}

/// An officer may only register while holding no live application, no
/// registration other than a rejected one, and no assignment whose window
/// runs past the candidate's opening date.
pub fn can_register_as_officer(
    standing: &OfficerStanding<'_>,
    project: &Project,
    today: NaiveDate,
) -> Eligibility {
    if let Some(application) = standing.application {
        if application.status != ApplicationStatus::Unsuccessful {
            return Eligibility::Denied(DenialReason::HoldsApplication {
                application: application.id.clone(),
                status: application.status,
            });
        }
    }

    if let Some(registration) = standing.registration {
        if registration.status != RegistrationStatus::Rejected {
            return Eligibility::Denied(DenialReason::HoldsRegistration {
                registration: registration.id.clone(),
                status: registration.status,
            });
        }
    }

    if let Some(assigned) = standing.live_assignment(today) {
        if assigned.closing_date > project.opening_date {
            return Eligibility::Denied(DenialReason::OverlappingAssignment {
                assigned: assigned.name.clone(),
                assigned_closes: assigned.closing_date,
                candidate_opens: project.opening_date,
            });
        }
    }

    Eligibility::Allowed
}

/// Extra gate when the applicant is also an officer: no applying to a project
/// they administer or have asked to administer, nor to one whose window
/// overlaps their assignment.
pub fn can_apply_as_officer(
    standing: &OfficerStanding<'_>,
    project: &Project,
    today: NaiveDate,
) -> Eligibility {
    if let Some(assigned) = standing.live_assignment(today) {
        if assigned.name == project.name {
            return Eligibility::Denied(DenialReason::AssignedToProject {
                project: project.name.clone(),
            });
        }

        let overlaps = project.opening_date <= assigned.closing_date
            && assigned.opening_date <= project.closing_date;
        if overlaps {
            return Eligibility::Denied(DenialReason::OverlappingAssignment {
                assigned: assigned.name.clone(),
                assigned_closes: assigned.closing_date,
                candidate_opens: project.opening_date,
            });
        }
    }

    if let Some(registration) = standing.registration {
        if registration.status != RegistrationStatus::Rejected && registration.project == project.name
        {
            return Eligibility::Denied(DenialReason::RegisteredForProject {
                project: project.name.clone(),
            });
        }
    }

    Eligibility::Allowed
}
