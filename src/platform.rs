//! VGChartz platform codes and their Metacritic URL slugs.
//!
//! VGChartz tracks sales for nearly every platform ever released, Metacritic
//! only covers a subset. Codes missing here have no ratings page and their
//! rows are written with blank Metacritic columns.

/// Metacritic slug for a VGChartz platform code. Matching is exact.
pub fn translate(code: &str) -> Option<&'static str> {
    match code {
        // Sony
        "PS" => Some("playstation"),
        "PS2" => Some("playstation-2"),
        "PS3" => Some("playstation-3"),
        "PSP" => Some("psp"),
        "PSV" => Some("playstation-vita"),

        // Microsoft
        "XB" => Some("xbox"),
        "X360" => Some("xbox-360"),

        // Nintendo
        "GC" => Some("gamecube"),
        "Wii" => Some("wii"),
        "WiiU" => Some("wii-u"),
        "GBA" => Some("game-boy-advance"),
        "DS" => Some("ds"),
        "3DS" => Some("3ds"),

        // Sega
        "DC" => Some("dreamcast"),

        "PC" => Some("pc"),
        "iOS" => Some("ios"),

        _ => None,
    }
}
