//! Name to region table written next to the atlas image.
//!
//! Sprite entries come straight from their placement. Join entries are
//! resolved against their parent's origin: `x = parent.x + join.x`,
//! `y = parent.y + join.y`, with no margin of their own.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AssetPackError, Result};
use crate::model::{JoinRef, NinePatch, Rect, Sprite};

/// One addressable region of the atlas.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestEntry {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ninepatch: Option<NinePatch>,
}

impl ManifestEntry {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }
}

/// Flat `{ name: { x, y, w, h, ninepatch? } }` map, ordered by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<String, ManifestEntry>,
}

impl Manifest {
    pub fn get(&self, name: &str) -> Option<&ManifestEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ManifestEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn to_json(&self) -> Result<Value> {
        serde_json::to_value(self)
            .map_err(|e| AssetPackError::InvalidInput(format!("manifest serialization: {}", e)))
    }

    pub fn to_json_string_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AssetPackError::InvalidInput(format!("manifest serialization: {}", e)))
    }
}

/// Where a manifest key came from, for duplicate reports.
#[derive(Debug, Clone)]
enum Source<'a> {
    Sprite(&'a str),
    Join { id: &'a str, parent: &'a str },
}

impl Source<'_> {
    fn describe(&self) -> String {
        match self {
            Source::Sprite(id) => format!("sprite '{}'", id),
            Source::Join { id, parent } => format!("join '{}' of '{}'", id, parent),
        }
    }
}

struct ManifestBuilder<'a> {
    entries: BTreeMap<String, (ManifestEntry, Source<'a>)>,
}

impl<'a> ManifestBuilder<'a> {
    fn insert(&mut self, name: &str, entry: ManifestEntry, source: Source<'a>) -> Result<()> {
        match self.entries.entry(name.to_string()) {
            Entry::Occupied(existing) => Err(AssetPackError::DuplicateName {
                name: name.to_string(),
                first: existing.get().1.describe(),
                second: source.describe(),
            }),
            Entry::Vacant(slot) => {
                slot.insert((entry, source));
                Ok(())
            }
        }
    }
}

/// Builds the manifest for packed `sprites` plus `joins` declared against them.
///
/// Fails on a sprite without an origin, a join whose parent is not among
/// `sprites` (`DanglingJoin`), a join exceeding its parent, or any name used
/// twice across sprites and joins (`DuplicateName`, naming both sources).
pub fn build_manifest(sprites: &[Sprite], joins: &[JoinRef]) -> Result<Manifest> {
    let mut builder = ManifestBuilder {
        entries: BTreeMap::new(),
    };
    let mut parents: BTreeMap<&str, &Sprite> = BTreeMap::new();

    for s in sprites {
        let frame = s.frame().ok_or_else(|| {
            AssetPackError::InvalidInput(format!("sprite '{}' has not been placed", s.id))
        })?;
        let entry = ManifestEntry {
            x: frame.x,
            y: frame.y,
            w: frame.w,
            h: frame.h,
            ninepatch: s.ninepatch,
        };
        builder.insert(&s.id, entry, Source::Sprite(&s.id))?;
        parents.insert(s.id.as_str(), s);
    }

    for jr in joins {
        let parent = parents
            .get(jr.parent.as_str())
            .ok_or_else(|| AssetPackError::DanglingJoin {
                join: jr.join.id.clone(),
                parent: jr.parent.clone(),
            })?;
        let join = &jr.join;
        join.validate(&parent.id, parent.width(), parent.height())?;
        // parents were all checked for an origin above
        let (px, py) = parent.origin.unwrap_or_default();
        let entry = ManifestEntry {
            x: px + join.x,
            y: py + join.y,
            w: join.w,
            h: join.h,
            ninepatch: join.ninepatch,
        };
        builder.insert(
            &join.id,
            entry,
            Source::Join {
                id: &join.id,
                parent: &jr.parent,
            },
        )?;
    }

    Ok(Manifest {
        entries: builder
            .entries
            .into_iter()
            .map(|(k, (entry, _))| (k, entry))
            .collect(),
    })
}

/// Checks names before any packing work: every join's parent must be one of
/// `sprites` and no name may appear twice across sprites and joins.
pub fn check_names(sprites: &[Sprite], joins: &[JoinRef]) -> Result<()> {
    let mut seen: BTreeMap<&str, Source<'_>> = BTreeMap::new();
    for s in sprites {
        if let Some(first) = seen.get(s.id.as_str()) {
            return Err(AssetPackError::DuplicateName {
                name: s.id.clone(),
                first: first.describe(),
                second: Source::Sprite(&s.id).describe(),
            });
        }
        seen.insert(&s.id, Source::Sprite(&s.id));
    }
    for jr in joins {
        if !matches!(seen.get(jr.parent.as_str()), Some(Source::Sprite(_))) {
            return Err(AssetPackError::DanglingJoin {
                join: jr.join.id.clone(),
                parent: jr.parent.clone(),
            });
        }
        let source = Source::Join {
            id: &jr.join.id,
            parent: &jr.parent,
        };
        if let Some(first) = seen.get(jr.join.id.as_str()) {
            return Err(AssetPackError::DuplicateName {
                name: jr.join.id.clone(),
                first: first.describe(),
                second: source.describe(),
            });
        }
        seen.insert(&jr.join.id, source);
    }
    Ok(())
}
