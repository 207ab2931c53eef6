//! Reference resolution
//!
//! Entities point at each other by reference strings. After all entities of
//! a message exist, [`ReferenceIndex::build`] maps every key to the position
//! of its entity and reports keys that point nowhere. Unresolved references
//! stay in the model as written.

use super::{Deal, Party, Release, Resource};
use crate::core::error::ParseWarning;
use std::collections::HashMap;

/// Reference key to list position, per entity kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceIndex {
    resources: HashMap<String, usize>,
    releases: HashMap<String, usize>,
    parties: HashMap<String, usize>,
}

impl ReferenceIndex {
    /// Index the entities and check every reference between them
    ///
    /// Dangling references are only reported when `validate` is set; missing
    /// and duplicate keys always are.
    pub fn build(
        parties: &[Party],
        resources: &[Resource],
        releases: &[Release],
        deals: &[Deal],
        validate: bool,
    ) -> (Self, Vec<ParseWarning>) {
        let mut warnings = Vec::new();
        let index = Self {
            parties: keyed("Party", parties.iter().map(Party::reference), &mut warnings),
            resources: keyed(
                "Resource",
                resources.iter().map(Resource::reference),
                &mut warnings,
            ),
            releases: keyed(
                "Release",
                releases.iter().map(Release::reference),
                &mut warnings,
            ),
        };
        if !validate {
            return (index, warnings);
        }

        for release in releases {
            let from = describe("Release", release.reference());
            for reference in release.resource_references() {
                check(&index.resources, "Resource", reference, &from, &mut warnings);
            }
            for reference in release.artist_party_references() {
                check(&index.parties, "Party", reference, &from, &mut warnings);
            }
        }
        for resource in resources {
            let from = describe(resource.element().local_name.as_str(), resource.reference());
            for reference in resource.artist_party_references() {
                check(&index.parties, "Party", reference, &from, &mut warnings);
            }
        }
        for (i, deal) in deals.iter().enumerate() {
            let from = format!("ReleaseDeal #{}", i + 1);
            for reference in deal.release_references() {
                check(&index.releases, "Release", reference, &from, &mut warnings);
            }
        }
        (index, warnings)
    }

    /// Position of the resource keyed `reference`
    pub fn resource(&self, reference: &str) -> Option<usize> {
        self.resources.get(reference).copied()
    }

    /// Position of the release keyed `reference`
    pub fn release(&self, reference: &str) -> Option<usize> {
        self.releases.get(reference).copied()
    }

    /// Position of the party keyed `reference`
    pub fn party(&self, reference: &str) -> Option<usize> {
        self.parties.get(reference).copied()
    }
}

fn check(
    table: &HashMap<String, usize>,
    target: &str,
    reference: &str,
    from: &str,
    warnings: &mut Vec<ParseWarning>,
) {
    if table.contains_key(reference) {
        return;
    }
    tracing::warn!(target_kind = target, reference, from, "dangling reference");
    warnings.push(ParseWarning::DanglingReference {
        target: target.to_string(),
        reference: reference.to_string(),
        from: from.to_string(),
    });
}

fn describe(kind: &str, reference: Option<&str>) -> String {
    match reference {
        Some(reference) => format!("{} {}", kind, reference),
        None => kind.to_string(),
    }
}

/// Map keys to positions; the first entity with a key wins
fn keyed<'a>(
    kind: &str,
    references: impl Iterator<Item = Option<&'a str>>,
    warnings: &mut Vec<ParseWarning>,
) -> HashMap<String, usize> {
    let mut table: HashMap<String, usize> = HashMap::new();
    for (i, reference) in references.enumerate() {
        match reference {
            None => warnings.push(ParseWarning::MissingReference {
                entity: kind.to_string(),
                index: i,
            }),
            Some(reference) if table.contains_key(reference) => {
                warnings.push(ParseWarning::DuplicateReference {
                    target: kind.to_string(),
                    reference: reference.to_string(),
                })
            }
            Some(reference) => {
                table.insert(reference.to_string(), i);
            }
        }
    }
    table
}
