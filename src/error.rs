//! Faults raised while building a room. Once a room exists nothing in the core fails: a missing
//! tile just means nothing to collide with.

/// Error constructing a room from level data or settings.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomError {
    /// A tile layer whose identifier maps to no tile kind.
    UnknownLayer(String),
    /// An entity the level format does not know how to build.
    UnknownObject { layer: String, identifier: String },
    /// No spawn with this name exists in the room.
    MissingSpawn(String),
    /// The level project has no room with this identifier.
    UnknownRoom(String),
    InvalidSetting { name: &'static str, reason: String },
}

impl std::fmt::Display for RoomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownLayer(layer) => write!(f, "invalid tile layer type: '{}'", layer),
            Self::UnknownObject { layer, identifier } => {
                write!(f, "invalid object '{}' in layer '{}'", identifier, layer)
            }
            Self::MissingSpawn(name) => write!(f, "no spawn named '{}'", name),
            Self::UnknownRoom(name) => write!(f, "no room named '{}'", name),
            Self::InvalidSetting { name, reason } => write!(f, "setting '{}' {}", name, reason),
        }
    }
}

impl std::error::Error for RoomError {}
