use super::domain::{
    Application, ApplicationStatus, ProjectName, Registration, RegistrationStatus, UserId,
};

/// Listing filter for applications; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationFilter {
    pub project: Option<ProjectName>,
    pub status: Option<ApplicationStatus>,
    pub applicant: Option<UserId>,
}

impl ApplicationFilter {
    pub fn for_project(project: impl Into<ProjectName>) -> Self {
        Self {
            project: Some(project.into()),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: ApplicationStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, application: &Application) -> bool {
        self.project
            .as_ref()
            .map_or(true, |project| &application.project == project)
            && self.status.map_or(true, |status| application.status == status)
            && self
                .applicant
                .as_ref()
                .map_or(true, |applicant| &application.applicant == applicant)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationFilter {
    pub project: Option<ProjectName>,
    pub status: Option<RegistrationStatus>,
    pub officer: Option<UserId>,
}

impl RegistrationFilter {
    pub fn for_project(project: impl Into<ProjectName>) -> Self {
        Self {
            project: Some(project.into()),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: RegistrationStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, registration: &Registration) -> bool {
        self.project
            .as_ref()
            .map_or(true, |project| &registration.project == project)
            && self.status.map_or(true, |status| registration.status == status)
            && self
                .officer
                .as_ref()
                .map_or(true, |officer| &registration.officer == officer)
    }
}
