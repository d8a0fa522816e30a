//! Dependency graph resolution over resolved registries.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use super::request::ItemRequest;
use crate::error::{Error, Result};
use crate::manifest::{FileRole, Item, ItemFile, ItemRef};
use crate::provider::Locator;
use crate::registry::ResolvedRegistry;

/// An item selected for installation, with the files to fetch.
#[derive(Debug, Clone)]
pub struct ResolvedItem {
    /// Registry the item comes from
    pub registry: Arc<ResolvedRegistry>,
    pub item: Item,
    /// Primary files plus any requested soft-role files
    pub files: Vec<ItemFile>,
}

impl ResolvedItem {
    pub fn id(&self) -> ItemRef {
        self.item.id()
    }
}

enum Visit<'a> {
    Enter(usize, ItemRef),
    Exit(usize, &'a Item),
}

/// Walks local dependencies from the requested items.
///
/// The walk is an explicit stack with enter/exit frames: an item is emitted
/// on exit, after everything it depends on. Local dependencies resolve
/// against the registry their dependent came from. Each `(registry, item)`
/// pair is visited at most once, so cycles terminate.
#[derive(Debug)]
pub struct DependencyResolver<'a> {
    registries: &'a [Arc<ResolvedRegistry>],
    soft_roles: Vec<FileRole>,
    installed: HashSet<(Locator, ItemRef)>,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(registries: &'a [Arc<ResolvedRegistry>]) -> Self {
        Self {
            registries,
            soft_roles: Vec::new(),
            installed: HashSet::new(),
        }
    }

    /// Non-primary roles to include, e.g. tests or docs.
    pub fn with_soft_roles(mut self, roles: impl IntoIterator<Item = FileRole>) -> Self {
        self.soft_roles = roles.into_iter().collect();
        self
    }

    /// Items the consumer already has; they are neither emitted nor walked.
    pub fn with_installed(mut self, installed: impl IntoIterator<Item = (Locator, ItemRef)>) -> Self {
        self.installed = installed.into_iter().collect();
        self
    }

    /// Registries that can satisfy an unqualified request for `item`.
    pub fn candidates(&self, item: &ItemRef) -> Vec<&'a Arc<ResolvedRegistry>> {
        self.registries
            .iter()
            .filter(|r| r.manifest.contains(item))
            .collect()
    }

    /// Resolve `requests` into install order. An empty list means every
    /// listed item of every registry.
    pub fn resolve(&self, requests: &[ItemRequest]) -> Result<Vec<ResolvedItem>> {
        let roots = if requests.is_empty() {
            self.everything_listed()
        } else {
            requests
                .iter()
                .map(|r| self.root(r))
                .collect::<Result<Vec<_>>>()?
        };

        let registries: &'a [Arc<ResolvedRegistry>] = self.registries;
        let mut seen: HashSet<(Locator, ItemRef)> = HashSet::new();
        let mut resolved = Vec::new();
        let mut stack: Vec<Visit<'a>> = roots
            .into_iter()
            .rev()
            .map(|(registry, id)| Visit::Enter(registry, id))
            .collect();

        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Enter(index, id) => {
                    let registry = &registries[index];
                    let key = (registry.locator().clone(), id);
                    if self.installed.contains(&key) || !seen.insert(key.clone()) {
                        continue;
                    }
                    let (_, id) = key;

                    let item = registry.manifest.find(&id).ok_or_else(|| Error::ItemNotFound {
                        item: id.to_string(),
                        registry: registry.url.clone(),
                    })?;

                    stack.push(Visit::Exit(index, item));
                    for dependency in item.local_dependencies.iter().rev() {
                        stack.push(Visit::Enter(index, dependency.clone()));
                    }
                }
                Visit::Exit(index, item) => {
                    debug!("Resolved {} from {}", item.id(), registries[index].url);
                    resolved.push(ResolvedItem {
                        registry: Arc::clone(&registries[index]),
                        files: item.files_for_roles(&self.soft_roles).cloned().collect(),
                        item: item.clone(),
                    });
                }
            }
        }
        Ok(resolved)
    }

    fn root(&self, request: &ItemRequest) -> Result<(usize, ItemRef)> {
        if let Some(wanted) = &request.registry {
            let index = self
                .registries
                .iter()
                .position(|r| r.locator().as_str() == wanted || r.url == *wanted)
                .ok_or_else(|| Error::parse(wanted, "registry was not resolved"))?;
            return Ok((index, request.item.clone()));
        }

        let matching: Vec<usize> = self
            .registries
            .iter()
            .enumerate()
            .filter(|(_, r)| r.manifest.contains(&request.item))
            .map(|(i, _)| i)
            .collect();
        match matching.as_slice() {
            [index] => Ok((*index, request.item.clone())),
            [] => Err(Error::ItemNotFound {
                item: request.item.to_string(),
                registry: if self.registries.is_empty() {
                    "any configured registry".to_string()
                } else {
                    self.registries
                        .iter()
                        .map(|r| r.url.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                },
            }),
            _ => Err(Error::AmbiguousRegistry {
                item: request.item.to_string(),
                candidates: matching
                    .iter()
                    .map(|&i| self.registries[i].url.clone())
                    .collect(),
            }),
        }
    }

    fn everything_listed(&self) -> Vec<(usize, ItemRef)> {
        self.registries
            .iter()
            .enumerate()
            .flat_map(|(index, r)| r.manifest.listed_items().map(move |item| (index, item.id())))
            .collect()
    }
}
