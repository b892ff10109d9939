//! The fixed set of supported catalog platforms.
//!
//! Each platform maps a stable local identifier to the RAWG numeric platform
//! id used when scoping remote searches and top lists.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Ps2,
    Ps1,
    Gamecube,
    N64,
    Snes,
    Nes,
    Gba,
    Megadrive,
    Saturn,
    Dreamcast,
    /// Remote games on platforms outside the supported set are still storable.
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Manufacturer {
    Sony,
    Nintendo,
    Sega,
    Other,
}

impl Platform {
    pub const ALL: [Platform; 10] = [
        Platform::Ps2,
        Platform::Ps1,
        Platform::Gamecube,
        Platform::N64,
        Platform::Snes,
        Platform::Nes,
        Platform::Gba,
        Platform::Megadrive,
        Platform::Saturn,
        Platform::Dreamcast,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ps2 => "ps2",
            Platform::Ps1 => "ps1",
            Platform::Gamecube => "gamecube",
            Platform::N64 => "n64",
            Platform::Snes => "snes",
            Platform::Nes => "nes",
            Platform::Gba => "gba",
            Platform::Megadrive => "megadrive",
            Platform::Saturn => "saturn",
            Platform::Dreamcast => "dreamcast",
            Platform::Unknown => "unknown",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "ps2" => Platform::Ps2,
            "ps1" => Platform::Ps1,
            "gamecube" => Platform::Gamecube,
            "n64" => Platform::N64,
            "snes" => Platform::Snes,
            "nes" => Platform::Nes,
            "gba" => Platform::Gba,
            "megadrive" => Platform::Megadrive,
            "saturn" => Platform::Saturn,
            "dreamcast" => Platform::Dreamcast,
            _ => Platform::Unknown,
        }
    }

    /// RAWG numeric platform id, used for `platforms=` query parameters.
    pub fn rawg_id(&self) -> Option<u32> {
        match self {
            Platform::Ps2 => Some(15),
            Platform::Ps1 => Some(27),
            Platform::Gamecube => Some(105),
            Platform::N64 => Some(83),
            Platform::Snes => Some(79),
            Platform::Nes => Some(49),
            Platform::Gba => Some(24),
            Platform::Megadrive => Some(167),
            Platform::Saturn => Some(107),
            Platform::Dreamcast => Some(106),
            Platform::Unknown => None,
        }
    }

    /// Map a RAWG numeric platform id back to a supported platform.
    pub fn from_rawg_id(id: u32) -> Option<Self> {
        Platform::ALL.iter().copied().find(|p| p.rawg_id() == Some(id))
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Ps2 => "PlayStation 2",
            Platform::Ps1 => "PlayStation",
            Platform::Gamecube => "GameCube",
            Platform::N64 => "Nintendo 64",
            Platform::Snes => "Super Nintendo",
            Platform::Nes => "Nintendo Entertainment System",
            Platform::Gba => "Game Boy Advance",
            Platform::Megadrive => "Mega Drive / Genesis",
            Platform::Saturn => "Sega Saturn",
            Platform::Dreamcast => "Sega Dreamcast",
            Platform::Unknown => "Unknown",
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            Platform::Ps2 => "PS2",
            Platform::Ps1 => "PS1",
            Platform::Gamecube => "GCN",
            Platform::N64 => "N64",
            Platform::Snes => "SNES",
            Platform::Nes => "NES",
            Platform::Gba => "GBA",
            Platform::Megadrive => "MD",
            Platform::Saturn => "SAT",
            Platform::Dreamcast => "DC",
            Platform::Unknown => "?",
        }
    }

    pub fn manufacturer(&self) -> Manufacturer {
        match self {
            Platform::Ps2 | Platform::Ps1 => Manufacturer::Sony,
            Platform::Gamecube
            | Platform::N64
            | Platform::Snes
            | Platform::Nes
            | Platform::Gba => Manufacturer::Nintendo,
            Platform::Megadrive | Platform::Saturn | Platform::Dreamcast => Manufacturer::Sega,
            Platform::Unknown => Manufacturer::Other,
        }
    }
}
