use serde::{Deserialize, Serialize};

use crate::ids::ResourceId;
use super::product::MAX_OPTIONS;

/// Existing catalog product as returned by a handle lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteProduct {
    pub id: ResourceId,
    pub handle: String,
    /// Option names in position order.
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub variants: Vec<RemoteVariant>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteVariant {
    pub id: ResourceId,
    /// Selected option values by slot; unused slots are `None`.
    #[serde(default)]
    pub options: [Option<String>; MAX_OPTIONS],
    #[serde(default)]
    pub image_id: Option<ResourceId>,
}

impl RemoteVariant {
    pub fn option_tuple(&self) -> [Option<&str>; MAX_OPTIONS] {
        [self.options[0].as_deref(), self.options[1].as_deref(), self.options[2].as_deref()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertKind {
    Create,
    Update,
}

impl UpsertKind {
    pub fn mutation_name(&self) -> &'static str {
        match self {
            UpsertKind::Create => "productCreate",
            UpsertKind::Update => "productUpdate",
        }
    }
}

/// One row of the import response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub id: Option<u64>,
    pub handle: String,
    pub url: Option<String>,
    pub errors: Option<String>,
}
