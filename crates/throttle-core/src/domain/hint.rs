use serde::{Deserialize, Serialize};

/// Three-valued classification of a call's resource usage.
///
/// Only routing policies look at hints; the serial strategy carries them
/// through untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceHint {
    Intensive,
    NotIntensive,
    #[default]
    Unknown,
}

impl ResourceHint {
    pub fn is_known(self) -> bool {
        !matches!(self, ResourceHint::Unknown)
    }

    pub fn as_option(self) -> Option<bool> {
        match self {
            ResourceHint::Intensive => Some(true),
            ResourceHint::NotIntensive => Some(false),
            ResourceHint::Unknown => None,
        }
    }
}

impl From<Option<bool>> for ResourceHint {
    fn from(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => ResourceHint::Intensive,
            Some(false) => ResourceHint::NotIntensive,
            None => ResourceHint::Unknown,
        }
    }
}

/// IO and database hints of one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHints {
    pub io: ResourceHint,
    pub db: ResourceHint,
}

impl ResourceHints {
    pub fn new(io: impl Into<ResourceHint>, db: impl Into<ResourceHint>) -> Self {
        Self {
            io: io.into(),
            db: db.into(),
        }
    }
}
