use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use super::error::CatalogLoadError;

/// Inclusive argument-count bounds; `max == None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: u32,
    pub max: Option<u32>,
}

impl Arity {
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    pub fn exactly(n: u32) -> Self {
        Self::new(n, Some(n))
    }

    pub fn unbounded() -> Self {
        Self::new(0, None)
    }

    /// An open count (star arguments at the call site) can only violate the upper bound.
    pub fn accepts(&self, count: ArgCount) -> bool {
        let known = count.known as u32;
        let below_max = self.max.map_or(true, |max| known <= max);
        if count.open {
            below_max
        } else {
            known >= self.min && below_max
        }
    }
}

/// Number of arguments seen at a call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArgCount {
    pub known: usize,
    pub open: bool,
}

impl ArgCount {
    pub fn exact(known: usize) -> Self {
        Self { known, open: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub owner_module: String,
    pub arity: Arity,
    /// Module whose surface the call's result belongs to, if chain-returning.
    pub returns: Option<String>,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, owner_module: impl Into<String>, arity: Arity) -> Self {
        Self {
            name: name.into(),
            owner_module: owner_module.into(),
            arity,
            returns: None,
        }
    }

    /// Mark the result as staying on the owner's surface.
    pub fn chain_returning(mut self) -> Self {
        self.returns = Some(self.owner_module.clone());
        self
    }

    pub fn is_chain_returning(&self) -> bool {
        self.returns.is_some()
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.owner_module, self.name)
    }
}

/// Immutable name -> candidate owners index, shared read-only by all workers.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: HashMap<String, Vec<CatalogEntry>>,
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// Load a catalog, picking the format from the extension and content.
    pub fn load(path: &Path) -> Result<Self, CatalogLoadError> {
        let text = fs::read_to_string(path).map_err(|source| CatalogLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_listing(text.lines())
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self, CatalogLoadError> {
        match serde_json::from_str::<CatalogFile>(text)? {
            CatalogFile::Listing { functions } => {
                Self::from_listing(functions.iter().map(String::as_str))
            }
            CatalogFile::Entries(map) => {
                let mut builder = Self::builder();
                for (name, raw_entries) in map {
                    for raw in raw_entries {
                        builder.insert(raw.into_entry(&name)?)?;
                    }
                }
                Ok(builder.build())
            }
        }
    }

    /// One qualified name per item; bare names carry no owner and are skipped.
    pub fn from_listing<'a>(lines: impl IntoIterator<Item = &'a str>) -> Result<Self, CatalogLoadError> {
        let mut builder = Self::builder();
        for line in lines {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((owner, name)) = line.rsplit_once('.') else {
                continue;
            };
            builder.insert(CatalogEntry::new(name, owner, Arity::unbounded()))?;
        }
        Ok(builder.build())
    }

    pub fn lookup(&self, name: &str) -> &[CatalogEntry] {
        self.entries.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get(&self, name: &str, owner_module: &str) -> Option<&CatalogEntry> {
        self.lookup(name)
            .iter()
            .find(|entry| entry.owner_module == owner_module)
    }

    pub fn contains(&self, name: &str, owner_module: &str) -> bool {
        self.get(name, owner_module).is_some()
    }

    /// Number of distinct `(name, owner)` pairs.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct CatalogBuilder {
    entries: HashMap<String, Vec<CatalogEntry>>,
}

impl CatalogBuilder {
    /// Duplicate `(name, owner)` pairs collapse, last one wins.
    pub fn insert(&mut self, entry: CatalogEntry) -> Result<&mut Self, CatalogLoadError> {
        if entry.name.trim().is_empty() {
            return Err(CatalogLoadError::MissingName {
                owner: entry.owner_module,
            });
        }
        if entry.owner_module.trim().is_empty() {
            return Err(CatalogLoadError::MissingModule { name: entry.name });
        }
        if let Some(max) = entry.arity.max {
            if entry.arity.min > max {
                return Err(CatalogLoadError::InvalidArity {
                    name: entry.name,
                    owner: entry.owner_module,
                    min: entry.arity.min,
                    max,
                });
            }
        }

        let slot = self.entries.entry(entry.name.clone()).or_default();
        match slot
            .iter_mut()
            .find(|existing| existing.owner_module == entry.owner_module)
        {
            Some(existing) => *existing = entry,
            None => slot.push(entry),
        }
        Ok(self)
    }

    pub fn entry(mut self, entry: CatalogEntry) -> Result<Self, CatalogLoadError> {
        self.insert(entry)?;
        Ok(self)
    }

    pub fn build(mut self) -> Catalog {
        for candidates in self.entries.values_mut() {
            candidates.sort_by(|a, b| a.owner_module.cmp(&b.owner_module));
        }
        Catalog {
            entries: self.entries,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Listing { functions: Vec<String> },
    Entries(BTreeMap<String, Vec<RawEntry>>),
}

#[derive(Deserialize)]
struct RawEntry {
    #[serde(default, alias = "module")]
    owner_module: Option<String>,
    #[serde(default)]
    min_arity: Option<u32>,
    #[serde(default)]
    max_arity: Option<u32>,
    #[serde(default)]
    chain_returning: bool,
    #[serde(default)]
    returns: Option<String>,
}

impl RawEntry {
    fn into_entry(self, name: &str) -> Result<CatalogEntry, CatalogLoadError> {
        let owner = self
            .owner_module
            .filter(|owner| !owner.trim().is_empty())
            .ok_or_else(|| CatalogLoadError::MissingModule {
                name: name.to_string(),
            })?;

        let returns = match self.returns {
            Some(module) => Some(module),
            None if self.chain_returning => Some(owner.clone()),
            None => None,
        };

        Ok(CatalogEntry {
            name: name.to_string(),
            owner_module: owner,
            arity: Arity::new(self.min_arity.unwrap_or(0), self.max_arity),
            returns,
        })
    }
}
