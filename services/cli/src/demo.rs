use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use housing_allocation::allocation::{
    ApplicantProfile, BookingReportFilter, Decision, FixedClock, FlatOffering, FlatType,
    HousingService, MaritalStatus, MemoryStorage, ProjectDraft, ProjectName, UserId,
};
use housing_allocation::config::AppConfig;
use housing_allocation::error::AppError;

use crate::infra::print_json;

const MANAGER: &str = "T8765432F";
const OFFICER: &str = "T2109876H";
const SINGLE: &str = "S1234567A";
const MARRIED: &str = "S2345678B";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Two room units listed in the demo project
    #[arg(long, default_value_t = 1)]
    pub(crate) two_room_units: u32,
    /// Three room units listed in the demo project
    #[arg(long, default_value_t = 2)]
    pub(crate) three_room_units: u32,
}

pub(crate) fn run_demo(
    args: DemoArgs,
    config: &AppConfig,
    today: Option<NaiveDate>,
) -> Result<(), AppError> {
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let service = HousingService::load(
        Arc::new(MemoryStorage::default()),
        Arc::new(FixedClock(today)),
        config.eligibility,
    )?;
    let manager = UserId::from(MANAGER);
    let officer = UserId::from(OFFICER);
    let single = UserId::from(SINGLE);
    let married = UserId::from(MARRIED);
    let acacia = ProjectName::from("Acacia");

    println!("Housing allocation walkthrough ({today})");
    service.register_applicant(profile(SINGLE, "Mei Ling", 40, MaritalStatus::Single))?;
    service.register_applicant(profile(MARRIED, "Arjun", 29, MaritalStatus::Married))?;
    service.register_officer(profile(OFFICER, "Siti", 33, MaritalStatus::Married))?;

    let project = service.create_project(
        &manager,
        ProjectDraft {
            name: acacia.to_string(),
            neighborhood: "Yishun".to_string(),
            offerings: vec![
                FlatOffering::new(FlatType::TwoRoom, args.two_room_units, 350_000),
                FlatOffering::new(FlatType::ThreeRoom, args.three_room_units, 450_000),
            ],
            opening_date: today - Duration::days(7),
            closing_date: today + Duration::days(30),
            officer_slots: 2,
            visible: true,
        },
    )?;
    println!(
        "- {} listed in {}: {}",
        project.name,
        project.neighborhood,
        describe_units(&service, &acacia)?
    );

    let registration = service.create_registration(&officer, &acacia)?;
    service.decide_registration(&manager, &registration.id, Decision::Approve)?;
    println!("- Officer {officer} registered ({}) and approved", registration.id);

    match service.create_application(&single, &acacia, FlatType::ThreeRoom) {
        Ok(application) => println!("  Unexpected {} application accepted", application.flat_type),
        Err(err) => println!("- Single applicant asking for a 3-Room flat: {err}"),
    }
    let single_application = service.create_application(&single, &acacia, FlatType::TwoRoom)?;
    let married_application = service.create_application(&married, &acacia, FlatType::ThreeRoom)?;
    for application in [&single_application, &married_application] {
        let decided = service.decide_application(&manager, &application.id, Decision::Approve)?;
        println!(
            "- {} ({} {}) -> {}",
            decided.id,
            decided.applicant,
            decided.flat_type.label(),
            decided.status
        );
    }

    for applicant in [&single, &married] {
        let booking = service.create_booking(applicant)?;
        match service.approve_booking(&officer, &booking.id) {
            Ok(approved) => println!("- Booking {} approved for {applicant}", approved.id),
            Err(err) => println!("- Booking {} refused: {err}", booking.id),
        }
    }
    println!("  Units now: {}", describe_units(&service, &acacia)?);

    let withdrawal = service.request_withdrawal(&married)?;
    let withdrawn = service.decide_withdrawal(&manager, &withdrawal.id, Decision::Approve)?;
    println!(
        "- {} withdrawn after booking; units now: {}",
        withdrawn.id,
        describe_units(&service, &acacia)?
    );

    println!("\nApproved bookings report");
    print_json(&service.booking_report(&BookingReportFilter::default()))?;

    match service.receipt(&single) {
        Ok(receipt) => println!("\n{receipt}"),
        Err(err) => println!("\nNo receipt available: {err}"),
    }
    Ok(())
}

fn profile(id: &str, name: &str, age: u8, marital_status: MaritalStatus) -> ApplicantProfile {
    ApplicantProfile {
        user_id: UserId::from(id),
        name: name.to_string(),
        age,
        marital_status,
    }
}

fn describe_units(
    service: &HousingService<MemoryStorage>,
    project: &ProjectName,
) -> Result<String, AppError> {
    let mut parts = Vec::new();
    for flat_type in FlatType::ordered() {
        let units = service.units_available(project, flat_type)?;
        parts.push(format!("{} x{units}", flat_type.label()));
    }
    Ok(parts.join(", "))
}
