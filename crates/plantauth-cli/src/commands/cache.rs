use anyhow::Result;
use plantauth::PlantAuth;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::cli::{InvalidateArgs, OutputFormat};
use crate::output::{print_access, print_person, print_persons, print_plants, print_success};

pub async fn person(
    auth: &PlantAuth,
    user: Uuid,
    format: OutputFormat,
    cancel: &CancellationToken,
) -> Result<()> {
    let person = auth.person_cache.get(user, cancel).await?;
    print_person(person.as_ref(), format)
}

pub async fn persons(
    auth: &PlantAuth,
    plant: &str,
    format: OutputFormat,
    cancel: &CancellationToken,
) -> Result<()> {
    let persons = auth.person_cache.get_all_for_tenant(plant, cancel).await?;
    print_persons(&persons, format)
}

pub async fn plants(
    auth: &PlantAuth,
    user: Uuid,
    format: OutputFormat,
    cancel: &CancellationToken,
) -> Result<()> {
    let plants = auth.permission_cache.get_all_plants(user, cancel).await?;
    print_plants(&plants, format)
}

pub async fn access(
    auth: &PlantAuth,
    user: Uuid,
    plant: &str,
    format: OutputFormat,
    cancel: &CancellationToken,
) -> Result<()> {
    let data = auth
        .permission_cache
        .get_user_plant_permission_data(user, plant, cancel)
        .await?;
    print_access(&data, format)
}

pub async fn invalidate(
    auth: &PlantAuth,
    args: &InvalidateArgs,
    cancel: &CancellationToken,
) -> Result<()> {
    auth.permission_cache
        .invalidate_all(&args.plant, args.user, cancel)
        .await?;
    if args.person {
        auth.person_cache.invalidate(args.user, cancel).await?;
    }
    print_success(&format!(
        "Invalidated cached entries for {} in {}",
        args.user, args.plant
    ));
    Ok(())
}
