//! The closed set of library types and their per-type properties.

use serde::{Deserialize, Serialize};

use crate::error::LibraryError;

/// Kind of library sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LibraryType {
    /// Block catalog (multi-sheet, with a style `options` table)
    Blocks,

    /// Page templates
    Templates,

    /// Icon set
    Icons,

    /// Placeholder strings
    Placeholders,
}

/// Storage properties of a library type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeProperties {
    pub is_multi_sheet: bool,
    pub has_options_default: bool,
    pub key_field: &'static str,
}

impl LibraryType {
    pub const ALL: [LibraryType; 4] = [
        LibraryType::Blocks,
        LibraryType::Templates,
        LibraryType::Icons,
        LibraryType::Placeholders,
    ];

    pub fn properties(self) -> TypeProperties {
        match self {
            LibraryType::Blocks => TypeProperties {
                is_multi_sheet: true,
                has_options_default: true,
                key_field: "name",
            },
            LibraryType::Templates => TypeProperties {
                is_multi_sheet: false,
                has_options_default: false,
                key_field: "name",
            },
            LibraryType::Icons => TypeProperties {
                is_multi_sheet: false,
                has_options_default: false,
                key_field: "key",
            },
            LibraryType::Placeholders => TypeProperties {
                is_multi_sheet: false,
                has_options_default: false,
                key_field: "Key",
            },
        }
    }

    pub fn key_field(self) -> &'static str {
        self.properties().key_field
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LibraryType::Blocks => "blocks",
            LibraryType::Templates => "templates",
            LibraryType::Icons => "icons",
            LibraryType::Placeholders => "placeholders",
        }
    }
}

impl std::fmt::Display for LibraryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LibraryType {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blocks" => Ok(LibraryType::Blocks),
            "templates" => Ok(LibraryType::Templates),
            "icons" => Ok(LibraryType::Icons),
            "placeholders" => Ok(LibraryType::Placeholders),
            _ => Err(LibraryError::UnknownLibraryType(s.to_string())),
        }
    }
}
