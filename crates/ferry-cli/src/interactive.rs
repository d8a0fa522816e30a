//! Prompts used by `ferry add`.

use std::sync::Arc;

use anyhow::Result;
use console::style;
use dialoguer::{Confirm, Select, theme::ColorfulTheme};

use ferry_core::registry::ResolvedRegistry;
use ferry_core::resolve::{DependencyResolver, ItemRequest, ResolvedItem};

/// Whether prompts can be shown at all.
pub fn is_interactive(yes: bool) -> bool {
    !yes && console::Term::stderr().is_term()
}

/// Pin every ambiguous unqualified request to a registry the user picks.
///
/// Requests that match zero or one registry are left alone; the resolver
/// reports those.
pub fn disambiguate(
    resolver: &DependencyResolver<'_>,
    requests: Vec<ItemRequest>,
) -> Result<Vec<ItemRequest>> {
    let theme = ColorfulTheme::default();
    requests
        .into_iter()
        .map(|request| {
            if request.registry.is_some() {
                return Ok(request);
            }
            let candidates: Vec<&Arc<ResolvedRegistry>> = resolver.candidates(&request.item);
            if candidates.len() < 2 {
                return Ok(request);
            }
            let labels: Vec<&str> = candidates.iter().map(|r| r.url.as_str()).collect();
            let choice = Select::with_theme(&theme)
                .with_prompt(format!("{} is in several registries; install from", request.item))
                .items(&labels)
                .default(0)
                .interact()?;
            Ok(ItemRequest::qualified(
                candidates[choice].locator().as_str(),
                request.item,
            ))
        })
        .collect()
}

/// Print what is about to be installed and ask to proceed.
pub fn confirm_install(items: &[ResolvedItem], yes: bool) -> Result<bool> {
    eprintln!();
    eprintln!("{}", style("  Items").bold());
    eprintln!("  ───────────────────────────");
    for item in items {
        eprintln!(
            "  {} {}",
            style(item.id()).green(),
            style(format!("({} file(s) from {})", item.files.len(), item.registry.url)).dim()
        );
    }
    eprintln!();

    if yes || !console::Term::stderr().is_term() {
        return Ok(true);
    }

    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Proceed with installation?")
        .default(true)
        .interact()?)
}
