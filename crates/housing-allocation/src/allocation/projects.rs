use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{
    ApplicantProfile, FlatType, MaritalStatus, Project, ProjectName, UserId,
};
use super::eligibility::EligibilityPolicy;
use super::error::{AllocationError, RecordKind, ValidationError};
use super::ledger::{normalize_offerings, FlatOffering};
use super::state::{AllocationState, Transaction};

/// Fields a manager supplies when listing a new project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDraft {
    pub name: String,
    pub neighborhood: String,
    pub offerings: Vec<FlatOffering>,
    pub opening_date: NaiveDate,
    pub closing_date: NaiveDate,
    pub officer_slots: u32,
    pub visible: bool,
}

/// Editable project attributes. The name is the project's identity and stays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEdit {
    pub neighborhood: String,
    pub offerings: Vec<FlatOffering>,
    pub opening_date: NaiveDate,
    pub closing_date: NaiveDate,
    /// Remaining officer places; zero is allowed once every place is taken.
    pub officer_slots: u32,
}

/// Optional narrowing applied to project listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    pub flat_type: Option<FlatType>,
    pub neighborhood: Option<String>,
}

impl ProjectFilter {
    pub fn matches(&self, project: &Project) -> bool {
        let flat_type_ok = self
            .flat_type
            .map_or(true, |flat_type| project.offers(flat_type));
        let neighborhood_ok = self.neighborhood.as_deref().map_or(true, |wanted| {
            project
                .neighborhood
                .trim()
                .eq_ignore_ascii_case(wanted.trim())
        });
        flat_type_ok && neighborhood_ok
    }
}

pub(crate) fn ensure_manager(project: &Project, manager: &UserId) -> Result<(), ValidationError> {
    if &project.manager == manager {
        Ok(())
    } else {
        Err(ValidationError::NotManagerInCharge {
            user: manager.clone(),
            project: project.name.clone(),
        })
    }
}

fn validate_window(opening: NaiveDate, closing: NaiveDate) -> Result<(), ValidationError> {
    if opening > closing {
        return Err(ValidationError::InvalidProject(format!(
            "opening date {opening} is after closing date {closing}"
        )));
    }
    Ok(())
}

fn validate_slots(officer_slots: u32) -> Result<(), ValidationError> {
    if officer_slots == 0 {
        return Err(ValidationError::InvalidProject(
            "a project needs at least one officer slot".to_string(),
        ));
    }
    Ok(())
}

impl AllocationState {
    /// Projects an applicant may browse today: visible, still open, and with
    /// at least one flat type the applicant could apply for.
    pub(crate) fn available_projects(
        &self,
        profile: &ApplicantProfile,
        filter: &ProjectFilter,
        policy: &EligibilityPolicy,
        today: NaiveDate,
    ) -> Vec<Project> {
        let eligible = |project: &Project| match profile.marital_status {
            MaritalStatus::Single => {
                profile.age >= policy.single_min_age && project.offers(FlatType::smallest())
            }
            MaritalStatus::Married => profile.age >= policy.married_min_age,
        };
        self.projects
            .iter()
            .filter(|project| project.visible && !project.window_closed(today))
            .filter(|project| eligible(project))
            .filter(|project| filter.matches(project))
            .cloned()
            .collect()
    }

    pub(crate) fn projects_for_officer(&self, officer: &UserId) -> Vec<Project> {
        self.projects
            .iter()
            .filter(|project| project.has_officer(officer))
            .cloned()
            .collect()
    }
}

impl Transaction {
    pub(crate) fn create_project(
        &mut self,
        manager: &UserId,
        draft: ProjectDraft,
    ) -> Result<Project, AllocationError> {
        let name = ProjectName::from(draft.name.as_str());
        if name.as_str().is_empty() {
            return Err(ValidationError::InvalidProject("project name is empty".to_string()).into());
        }
        if self.state.find_project(&name).is_some() {
            return Err(ValidationError::DuplicateProject(name).into());
        }
        validate_window(draft.opening_date, draft.closing_date)?;
        validate_slots(draft.officer_slots)?;

        let project = Project {
            name,
            neighborhood: draft.neighborhood.trim().to_string(),
            offerings: normalize_offerings(draft.offerings)?,
            opening_date: draft.opening_date,
            closing_date: draft.closing_date,
            manager: manager.clone(),
            officer_slots: draft.officer_slots,
            assigned_officers: Vec::new(),
            visible: draft.visible,
        };
        self.state.projects.push(project.clone());
        self.appended(RecordKind::Project);

        info!(project = %project.name, %manager, units = project.total_units(), "project created");
        Ok(project)
    }

    pub(crate) fn edit_project(
        &mut self,
        manager: &UserId,
        name: &ProjectName,
        edit: ProjectEdit,
    ) -> Result<Project, AllocationError> {
        ensure_manager(self.state.project(name)?, manager)?;
        validate_window(edit.opening_date, edit.closing_date)?;

        self.replace_offerings(name, edit.offerings)?;

        let project = self.state.project_mut(name)?;
        project.neighborhood = edit.neighborhood.trim().to_string();
        project.opening_date = edit.opening_date;
        project.closing_date = edit.closing_date;
        project.officer_slots = edit.officer_slots;
        let project = project.clone();
        self.overwritten(RecordKind::Project);

        info!(project = %project.name, %manager, "project edited");
        Ok(project)
    }

    pub(crate) fn set_visibility(
        &mut self,
        manager: &UserId,
        name: &ProjectName,
        visible: bool,
    ) -> Result<Project, AllocationError> {
        let project = self.state.project_mut(name)?;
        ensure_manager(project, manager)?;
        project.visible = visible;
        let project = project.clone();
        self.overwritten(RecordKind::Project);

        info!(project = %project.name, %manager, visible, "project visibility changed");
        Ok(project)
    }

    /// Removes a project together with its applications, registrations and
    /// bookings.
    pub(crate) fn delete_project(
        &mut self,
        manager: &UserId,
        name: &ProjectName,
    ) -> Result<Project, AllocationError> {
        let project = self.state.project(name)?.clone();
        ensure_manager(&project, manager)?;

        self.delete_applications_for_project(&project.name);
        self.delete_registrations_for_project(&project.name);
        self.delete_bookings_for_project(&project.name);
        self.state.projects.retain(|existing| existing.name != project.name);
        self.overwritten(RecordKind::Project);

        info!(project = %project.name, %manager, "project deleted");
        Ok(project)
    }
}
