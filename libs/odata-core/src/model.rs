//! Resource model: the process-wide registry of addressable collections
//!
//! Built once at startup via [`ResourceModel::builder`], immutable and
//! `Send + Sync` afterwards, and passed explicitly into the path resolver —
//! never retrieved through ambient lookup. Per-request state lives in
//! [`CollectionInstance`](crate::collection::CollectionInstance), which is
//! created fresh from a registered definition for every request.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::pagination::DataSource;
use crate::value::{PrimitiveKind, PrimitiveValue};

/// A name uniquely identifying a resource, property, or type within the
/// registered model. Immutable once assigned.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key role of a property within its entity type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyKind {
    /// The primary identifying property. At most one per collection.
    Default,
    /// Additionally usable for keyed lookup.
    Alternate,
    None,
}

/// A named, typed field of an entity type.
#[derive(Clone, Debug, PartialEq)]
pub struct Property {
    pub name: String,
    pub kind: PrimitiveKind,
    pub key: KeyKind,
}

impl Property {
    pub fn new(name: impl Into<String>, kind: PrimitiveKind) -> Self {
        Self {
            name: name.into(),
            kind,
            key: KeyKind::None,
        }
    }

    pub fn default_key(name: impl Into<String>, kind: PrimitiveKind) -> Self {
        Self {
            name: name.into(),
            kind,
            key: KeyKind::Default,
        }
    }

    pub fn alternate_key(name: impl Into<String>, kind: PrimitiveKind) -> Self {
        Self {
            name: name.into(),
            kind,
            key: KeyKind::Alternate,
        }
    }
}

/// Immutable pair of a local property and the property it references on a
/// related collection. Used during navigation-key resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferentialConstraint {
    pub local: String,
    pub referenced: String,
}

impl ReferentialConstraint {
    pub fn new(local: impl Into<String>, referenced: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            referenced: referenced.into(),
        }
    }
}

impl fmt::Display for ReferentialConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.local, self.referenced)
    }
}

/// To-one navigation from an entity to a related collection, following a
/// referential constraint.
#[derive(Clone, Debug)]
pub struct NavigationBinding {
    pub name: String,
    pub target: Identifier,
    pub constraint: ReferentialConstraint,
}

/// A capability a collection declares at registration time. Checked once at
/// registration and again at request-validation time; never discovered by
/// run-time type inspection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    Count,
    Filter,
    OrderBy,
    Search,
    Skip,
    Top,
    Expand,
    ReadByKey,
    /// The data source can be asked for further pages past a short page.
    ServerDrivenPaging,
}

impl Capability {
    fn bit(self) -> u16 {
        match self {
            Capability::Count => 1 << 0,
            Capability::Filter => 1 << 1,
            Capability::OrderBy => 1 << 2,
            Capability::Search => 1 << 3,
            Capability::Skip => 1 << 4,
            Capability::Top => 1 << 5,
            Capability::Expand => 1 << 6,
            Capability::ReadByKey => 1 << 7,
            Capability::ServerDrivenPaging => 1 << 8,
        }
    }
}

/// Declared capability bitset of one collection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[must_use]
pub struct CapabilitySet(u16);

impl CapabilitySet {
    pub fn empty() -> Self {
        Self(0)
    }

    /// Everything except server-driven paging, which depends on the data
    /// source's contract and must be opted into.
    pub fn standard() -> Self {
        Self::empty()
            .with(Capability::Count)
            .with(Capability::Filter)
            .with(Capability::OrderBy)
            .with(Capability::Skip)
            .with(Capability::Top)
            .with(Capability::ReadByKey)
    }

    pub fn with(self, cap: Capability) -> Self {
        Self(self.0 | cap.bit())
    }

    #[must_use]
    pub fn supports(self, cap: Capability) -> bool {
        self.0 & cap.bit() != 0
    }
}

/// Describes one addressable set of entities. Shared and immutable after
/// registration.
#[derive(Clone, Debug)]
pub struct CollectionDefinition {
    name: Identifier,
    entity_type: String,
    properties: Vec<Property>,
    navigations: Vec<NavigationBinding>,
    max_page_size: Option<u64>,
    capabilities: CapabilitySet,
}

impl CollectionDefinition {
    pub fn builder(
        name: impl Into<Identifier>,
        entity_type: impl Into<String>,
    ) -> CollectionDefinitionBuilder {
        CollectionDefinitionBuilder {
            name: name.into(),
            entity_type: entity_type.into(),
            properties: Vec::new(),
            navigations: Vec::new(),
            max_page_size: None,
            capabilities: CapabilitySet::standard(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &Identifier {
        &self.name
    }

    #[must_use]
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// The primary identifying property, if one is declared.
    #[must_use]
    pub fn default_key(&self) -> Option<&Property> {
        self.properties.iter().find(|p| p.key == KeyKind::Default)
    }

    #[must_use]
    pub fn navigation(&self, name: &str) -> Option<&NavigationBinding> {
        self.navigations.iter().find(|n| n.name == name)
    }

    #[must_use]
    pub fn max_page_size(&self) -> Option<u64> {
        self.max_page_size
    }

    #[must_use]
    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }
}

pub struct CollectionDefinitionBuilder {
    name: Identifier,
    entity_type: String,
    properties: Vec<Property>,
    navigations: Vec<NavigationBinding>,
    max_page_size: Option<u64>,
    capabilities: CapabilitySet,
}

impl CollectionDefinitionBuilder {
    #[must_use]
    pub fn property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    #[must_use]
    pub fn navigation(
        mut self,
        name: impl Into<String>,
        target: impl Into<Identifier>,
        constraint: ReferentialConstraint,
    ) -> Self {
        self.navigations.push(NavigationBinding {
            name: name.into(),
            target: target.into(),
            constraint,
        });
        self
    }

    #[must_use]
    pub fn max_page_size(mut self, size: u64) -> Self {
        self.max_page_size = Some(size);
        self
    }

    #[must_use]
    pub fn capabilities(mut self, caps: CapabilitySet) -> Self {
        self.capabilities = caps;
        self
    }

    /// Validate and freeze the definition.
    ///
    /// # Errors
    /// `Error::InvalidModel` when more than one property is flagged as the
    /// default key, or a duplicate property name is declared.
    pub fn build(self) -> Result<CollectionDefinition, Error> {
        let defaults = self
            .properties
            .iter()
            .filter(|p| p.key == KeyKind::Default)
            .count();
        if defaults > 1 {
            return Err(Error::InvalidModel(format!(
                "collection '{}' declares {defaults} default keys, at most one is allowed",
                self.name
            )));
        }
        for (i, p) in self.properties.iter().enumerate() {
            if self.properties[..i].iter().any(|q| q.name == p.name) {
                return Err(Error::InvalidModel(format!(
                    "collection '{}' declares property '{}' twice",
                    self.name, p.name
                )));
            }
        }
        Ok(CollectionDefinition {
            name: self.name,
            entity_type: self.entity_type,
            properties: self.properties,
            navigations: self.navigations,
            max_page_size: self.max_page_size,
            capabilities: self.capabilities,
        })
    }
}

/// One resolved record: a set of property values. Materialized lazily when a
/// page is fetched, discarded when the page is replaced.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Entity {
    properties: BTreeMap<String, PrimitiveValue>,
}

impl Entity {
    pub fn new<K, I>(properties: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, PrimitiveValue)>,
    {
        Self {
            properties: properties
                .into_iter()
                .map(|(k, v)| (k.into(), v))
                .collect(),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PrimitiveValue> {
        self.properties.get(name)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &PrimitiveValue)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }
}

struct RegisteredCollection {
    definition: Arc<CollectionDefinition>,
    source: Arc<dyn DataSource>,
}

/// Process-wide, read-only registry of collection definitions and their data
/// sources.
pub struct ResourceModel {
    collections: BTreeMap<Identifier, RegisteredCollection>,
}

impl ResourceModel {
    pub fn builder() -> ResourceModelBuilder {
        ResourceModelBuilder {
            collections: BTreeMap::new(),
        }
    }

    /// Look up a registered collection by name.
    #[must_use]
    pub fn collection(
        &self,
        name: &str,
    ) -> Option<(&Arc<CollectionDefinition>, &Arc<dyn DataSource>)> {
        self.collections
            .get(name)
            .map(|reg| (&reg.definition, &reg.source))
    }

    pub fn collection_names(&self) -> impl Iterator<Item = &Identifier> {
        self.collections.keys()
    }
}

pub struct ResourceModelBuilder {
    collections: BTreeMap<Identifier, RegisteredCollection>,
}

impl ResourceModelBuilder {
    /// Register a collection definition together with the data source that
    /// serves it.
    ///
    /// # Errors
    /// `Error::InvalidModel` on a duplicate collection name.
    pub fn collection(
        mut self,
        definition: CollectionDefinition,
        source: Arc<dyn DataSource>,
    ) -> Result<Self, Error> {
        let name = definition.name().clone();
        if self.collections.contains_key(&name) {
            return Err(Error::InvalidModel(format!(
                "collection '{name}' is already registered"
            )));
        }
        self.collections.insert(
            name,
            RegisteredCollection {
                definition: Arc::new(definition),
                source,
            },
        );
        Ok(self)
    }

    #[must_use]
    pub fn build(self) -> ResourceModel {
        ResourceModel {
            collections: self.collections,
        }
    }
}
