use housing_allocation::allocation::{
    ApplicantProfile, ApplicationFilter, ApplicationId, BookingId, BookingReportFilter,
    CsvStorage, HousingService, ProjectDraft, ProjectEdit, ProjectFilter, ProjectName,
    RegistrationFilter, RegistrationId, UserId,
};
use housing_allocation::error::AppError;
use tracing::info;

use crate::cli::{
    ApplicantArgs, ApplicationListArgs, ApplyArgs, ApproveBookingArgs, BookingCommand,
    DecideArgs, ProjectCommand, ProjectEditArgs, RegisterArgs, RegistrationListArgs, UserArgs,
    UserCommand,
};
use crate::infra::print_json;

type Service = HousingService<CsvStorage>;

pub(crate) fn projects(service: &Service, command: ProjectCommand) -> Result<(), AppError> {
    match command {
        ProjectCommand::List(args) => {
            let filter = ProjectFilter {
                flat_type: args.flat_type,
                neighborhood: args.neighborhood,
            };
            let projects = if let Some(applicant) = args.applicant {
                service.available_projects(&UserId::from(applicant.as_str()), &filter)?
            } else if let Some(manager) = args.manager {
                service.projects_for_manager(&UserId::from(manager.as_str()))
            } else if let Some(officer) = args.officer {
                service.projects_for_officer(&UserId::from(officer.as_str()))
            } else {
                service.projects()
            };
            let projects: Vec<_> = projects
                .into_iter()
                .filter(|project| filter.matches(project))
                .collect();
            print_json(&projects)
        }
        ProjectCommand::Create(args) => {
            let draft = ProjectDraft {
                name: args.name,
                neighborhood: args.neighborhood,
                offerings: args.offerings,
                opening_date: args.opens,
                closing_date: args.closes,
                officer_slots: args.officer_slots,
                visible: !args.hidden,
            };
            let project = service.create_project(&UserId::from(args.manager.as_str()), draft)?;
            print_json(&project)
        }
        ProjectCommand::Edit(args) => edit_project(service, args),
        ProjectCommand::Visibility(args) => {
            let project = service.set_visibility(
                &UserId::from(args.target.manager.as_str()),
                &ProjectName::from(args.target.project.as_str()),
                args.visible,
            )?;
            print_json(&project)
        }
        ProjectCommand::Delete(args) => {
            let project = service.delete_project(
                &UserId::from(args.manager.as_str()),
                &ProjectName::from(args.project.as_str()),
            )?;
            info!(project = %project.name, "project deleted");
            print_json(&project)
        }
    }
}

/// Unset flags keep the project's current values.
fn edit_project(service: &Service, args: ProjectEditArgs) -> Result<(), AppError> {
    let name = ProjectName::from(args.target.project.as_str());
    let current = service.project(&name)?;
    let edit = ProjectEdit {
        neighborhood: args.neighborhood.unwrap_or(current.neighborhood),
        offerings: if args.offerings.is_empty() {
            current.offerings
        } else {
            args.offerings
        },
        opening_date: args.opens.unwrap_or(current.opening_date),
        closing_date: args.closes.unwrap_or(current.closing_date),
        officer_slots: args.officer_slots.unwrap_or(current.officer_slots),
    };
    let project = service.edit_project(&UserId::from(args.target.manager.as_str()), &name, edit)?;
    print_json(&project)
}

pub(crate) fn users(service: &Service, command: UserCommand) -> Result<(), AppError> {
    let profile = |args: UserArgs| ApplicantProfile {
        user_id: UserId::from(args.id.as_str()),
        name: args.name,
        age: args.age,
        marital_status: args.marital_status,
    };
    match command {
        UserCommand::Applicant(args) => print_json(&service.register_applicant(profile(args))?),
        UserCommand::Officer(args) => print_json(&service.register_officer(profile(args))?),
    }
}

pub(crate) fn apply(service: &Service, args: ApplyArgs) -> Result<(), AppError> {
    let application = service.create_application(
        &UserId::from(args.applicant.as_str()),
        &ProjectName::from(args.project.as_str()),
        args.flat_type,
    )?;
    print_json(&application)
}

pub(crate) fn withdraw(service: &Service, args: ApplicantArgs) -> Result<(), AppError> {
    let application = service.request_withdrawal(&UserId::from(args.applicant.as_str()))?;
    print_json(&application)
}

pub(crate) fn decide_application(service: &Service, args: DecideArgs) -> Result<(), AppError> {
    let application = service.decide_application(
        &UserId::from(args.manager.as_str()),
        &ApplicationId(args.id),
        args.decision,
    )?;
    print_json(&application)
}

pub(crate) fn decide_withdrawal(service: &Service, args: DecideArgs) -> Result<(), AppError> {
    let application = service.decide_withdrawal(
        &UserId::from(args.manager.as_str()),
        &ApplicationId(args.id),
        args.decision,
    )?;
    print_json(&application)
}

pub(crate) fn applications(service: &Service, args: ApplicationListArgs) -> Result<(), AppError> {
    let filter = ApplicationFilter {
        project: args.project.as_deref().map(ProjectName::from),
        status: args.status,
        applicant: args.applicant.as_deref().map(UserId::from),
    };
    print_json(&service.applications(&filter))
}

pub(crate) fn register(service: &Service, args: RegisterArgs) -> Result<(), AppError> {
    let registration = service.create_registration(
        &UserId::from(args.officer.as_str()),
        &ProjectName::from(args.project.as_str()),
    )?;
    print_json(&registration)
}

pub(crate) fn decide_registration(service: &Service, args: DecideArgs) -> Result<(), AppError> {
    let registration = service.decide_registration(
        &UserId::from(args.manager.as_str()),
        &RegistrationId(args.id),
        args.decision,
    )?;
    print_json(&registration)
}

pub(crate) fn registrations(service: &Service, args: RegistrationListArgs) -> Result<(), AppError> {
    let filter = RegistrationFilter {
        project: args.project.as_deref().map(ProjectName::from),
        status: args.status,
        officer: args.officer.as_deref().map(UserId::from),
    };
    print_json(&service.registrations(&filter))
}

pub(crate) fn release_assignments(service: &Service) -> Result<(), AppError> {
    print_json(&service.release_expired_assignments()?)
}

pub(crate) fn book(service: &Service, args: ApplicantArgs) -> Result<(), AppError> {
    let booking = service.create_booking(&UserId::from(args.applicant.as_str()))?;
    print_json(&booking)
}

pub(crate) fn approve_booking(service: &Service, args: ApproveBookingArgs) -> Result<(), AppError> {
    let booking =
        service.approve_booking(&UserId::from(args.officer.as_str()), &BookingId(args.id))?;
    print_json(&booking)
}

pub(crate) fn bookings(service: &Service, command: BookingCommand) -> Result<(), AppError> {
    match command {
        BookingCommand::List(args) => print_json(&service.bookings(args.status)),
        BookingCommand::Report(args) => {
            let filter = BookingReportFilter {
                marital_status: args.marital_status,
                flat_type: args.flat_type,
                project: args.project.as_deref().map(ProjectName::from),
            };
            print_json(&service.booking_report(&filter))
        }
    }
}

pub(crate) fn receipt(service: &Service, args: ApplicantArgs) -> Result<(), AppError> {
    let receipt = service.receipt(&UserId::from(args.applicant.as_str()))?;
    println!("{receipt}");
    Ok(())
}
