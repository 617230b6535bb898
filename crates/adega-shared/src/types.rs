use serde::{Deserialize, Serialize};

// User identity = opaque uid issued by the identity provider
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct UserId(pub String);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Document id = key assigned by the document store
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct WineId(pub String);

impl WineId {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for WineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wine categories as stored in the shared collection. The serialized
/// labels are the Portuguese ones the store holds, accent included.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum WineType {
    #[default]
    Tinto,
    Branco,
    #[serde(rename = "Rosé")]
    Rose,
    Espumante,
    Sobremesa,
}

impl WineType {
    /// Every category, in the order the filter chips present them.
    pub const ALL: [WineType; 5] = [
        WineType::Tinto,
        WineType::Branco,
        WineType::Rose,
        WineType::Espumante,
        WineType::Sobremesa,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            WineType::Tinto => "Tinto",
            WineType::Branco => "Branco",
            WineType::Rose => "Rosé",
            WineType::Espumante => "Espumante",
            WineType::Sobremesa => "Sobremesa",
        }
    }
}

impl std::fmt::Display for WineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for WineType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Tinto" => Ok(WineType::Tinto),
            "Branco" => Ok(WineType::Branco),
            "Rosé" | "Rose" => Ok(WineType::Rose),
            "Espumante" => Ok(WineType::Espumante),
            "Sobremesa" => Ok(WineType::Sobremesa),
            other => Err(format!("unknown wine type: {other}")),
        }
    }
}

/// The currently authenticated identity as delivered by the provider's
/// session-change stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: UserId,
    pub display_name: String,
}
