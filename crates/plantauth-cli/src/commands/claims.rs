use anyhow::Result;
use colored::Colorize;
use plantauth::{ClaimsPrincipal, PlantAuth, RequestPlant};
use tokio_util::sync::CancellationToken;

use crate::cli::{ClaimsArgs, OutputFormat};
use crate::output::print_claims;

/// Augment a fresh principal for the user, as after token validation.
pub async fn claims(
    auth: &PlantAuth,
    args: &ClaimsArgs,
    format: OutputFormat,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut principal = ClaimsPrincipal::with_oid(args.user);
    let plant = RequestPlant(args.plant.clone());

    auth.augmenter.augment(&mut principal, &plant, cancel).await?;

    if !principal.person_exists_locally(args.user, auth.augmenter.issuer()) {
        eprintln!("{} {} is not a known person", "!".yellow(), args.user);
    }
    print_claims(&principal, auth.augmenter.issuer(), format)
}
