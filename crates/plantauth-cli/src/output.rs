use colored::Colorize;
use plantauth::claims::ClaimsPrincipal;
use plantauth::{AccessablePlant, Person, UserPlantPermissionData};
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Claims issued by `issuer`, one row per claim.
pub fn print_claims(
    principal: &ClaimsPrincipal,
    issuer: &str,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let claims: Vec<_> = principal
        .claims()
        .filter(|c| c.issuer.as_deref() == Some(issuer))
        .collect();

    match format {
        OutputFormat::Json => print_json(&claims),
        OutputFormat::Table => {
            if claims.is_empty() {
                println!("No claims added.");
                return Ok(());
            }
            let mut builder = Builder::default();
            builder.push_record(["Type", "Value"]);
            for claim in &claims {
                builder.push_record([short_type(claim.claim_type.as_str()), claim.value.as_str()]);
            }
            println!("{}", builder.build().with(Style::rounded()));
            Ok(())
        }
    }
}

pub fn print_person(person: Option<&Person>, format: OutputFormat) -> anyhow::Result<()> {
    match (person, format) {
        (_, OutputFormat::Json) => print_json(&person),
        (None, OutputFormat::Table) => {
            println!("Person not found.");
            Ok(())
        }
        (Some(person), OutputFormat::Table) => print_persons(std::slice::from_ref(person), format),
    }
}

pub fn print_persons(persons: &[Person], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(persons),
        OutputFormat::Table => {
            if persons.is_empty() {
                println!("No persons found.");
                return Ok(());
            }
            let mut builder = Builder::default();
            builder.push_record(["Oid", "Name", "UserName", "Superuser"]);
            for person in persons {
                builder.push_record([
                    person.azure_oid.to_string(),
                    person.display_name(),
                    person.user_name.clone().unwrap_or_else(|| "-".to_string()),
                    yes_no(person.is_superuser).to_string(),
                ]);
            }
            println!("{}", builder.build().with(Style::rounded()));
            println!("Total: {}", persons.len());
            Ok(())
        }
    }
}

pub fn print_plants(plants: &[AccessablePlant], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(plants),
        OutputFormat::Table => {
            let mut builder = Builder::default();
            builder.push_record(["Id", "Title", "Access"]);
            for plant in plants {
                builder.push_record([
                    plant.id.as_str(),
                    plant.title.as_str(),
                    yes_no(plant.has_access),
                ]);
            }
            println!("{}", builder.build().with(Style::rounded()));
            Ok(())
        }
    }
}

pub fn print_access(data: &UserPlantPermissionData, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(data),
        OutputFormat::Table => {
            println!(
                "{} {} in {} (access: {})",
                "User:".cyan(),
                data.user_oid,
                data.plant_id.cyan(),
                yes_no(data.has_access_to_plant(&data.plant_id))
            );

            let mut builder = Builder::default();
            builder.push_record(["Kind", "Value"]);
            for permission in &data.permissions {
                builder.push_record(["permission", permission.as_str()]);
            }
            for project in data.accessible_projects() {
                builder.push_record(["project".to_string(), format!("{} ({})", project.name, project.id)]);
            }
            for role in &data.restriction_roles {
                builder.push_record(["restriction role", role.as_str()]);
            }
            println!("{}", builder.build().with(Style::rounded()));
            Ok(())
        }
    }
}

fn short_type(claim_type: &str) -> &str {
    claim_type.rsplit('/').next().unwrap_or(claim_type)
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
