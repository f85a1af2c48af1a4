use serde::{Deserialize, Serialize};

/// Server versions that change which operators a translation may emit.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy, Default, Hash, Serialize, Deserialize)]
pub enum ServerVersion {
    #[serde(rename = "4.2")]
    V4_2,
    #[serde(rename = "4.4")]
    V4_4,
    #[serde(rename = "5.0")]
    V5_0,
    #[serde(rename = "6.0")]
    V6_0,
    #[default]
    #[serde(rename = "7.0")]
    V7_0,
}

impl std::fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let version = match self {
            ServerVersion::V4_2 => "4.2",
            ServerVersion::V4_4 => "4.4",
            ServerVersion::V5_0 => "5.0",
            ServerVersion::V6_0 => "6.0",
            ServerVersion::V7_0 => "7.0",
        };
        write!(f, "{version}")
    }
}

/// Options passed in for translation, used throughout the translator and the
/// simplifier.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TranslationOptions {
    /// Operators introduced after this version are not emitted.
    pub compatibility_level: ServerVersion,
    pub hoist_common_subexpressions: bool,
    pub simplify: bool,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self {
            compatibility_level: ServerVersion::default(),
            hoist_common_subexpressions: true,
            simplify: true,
        }
    }
}
