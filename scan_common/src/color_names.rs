//! Named color palette and hex/RGB helpers.
//!
//! Names are grouped by family with a numeric suffix (`blue12`, `cream3`) so
//! that the reducer can fold them into coarse buckets; a handful of colors
//! that fit no family keep a plain name.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::{Result, ScanError};

pub type Rgb8 = [u8; 3];

/// `(name, hex)` in lookup priority order.
pub static NAMED_COLORS: &[(&str, &str)] = &[
    ("blue1", "#00ffff"),
    ("blue2", "#f0f8ff"),
    ("blue3", "#faebd7"),
    ("blue4", "#00ffff"),
    ("blue5", "#7fffd4"),
    ("blue6", "#f0ffff"),
    ("cream1", "#f5f5dc"),
    ("cream2", "#ffe4c4"),
    ("black2", "#000000"),
    ("cream3", "#ffebcd"),
    ("blue7", "#0000ff"),
    ("blue8", "#8a2be2"),
    ("brown1", "#a52a2a"),
    ("cream4", "#deb887"),
    ("blue9", "#5f9ea0"),
    ("green3", "#7fff00"),
    ("brown2", "#d2691e"),
    ("coral", "#ff7f50"),
    ("blue10", "#6495ed"),
    ("white2", "#fff8dc"),
    ("red2", "#dc143c"),
    ("blue11", "#00ffff"),
    ("blue12", "#00008b"),
    ("blue13", "#008b8b"),
    ("brown3", "#b8860b"),
    ("gray3", "#a9a9a9"),
    ("green4", "#006400"),
    ("darkkhaki", "#bdb76b"),
    ("pink2", "#8b008b"),
    ("green5", "#556b2f"),
    ("orange2", "#ff8c00"),
    ("purple2", "#9932cc"),
    ("red3", "#8b0000"),
    ("darksalmon", "#e9967a"),
    ("green6", "#8fbc8f"),
    ("blue14", "#483d8b"),
    ("gray4", "#2f4f4f"),
    ("blue15", "#00ced1"),
    ("violet3", "#9400d3"),
    ("pink3", "#ff1493"),
    ("blue16", "#00bfff"),
    ("gray5", "#696969"),
    ("blue17", "#1e90ff"),
    ("red4", "#b22222"),
    ("white3", "#fffaf0"),
    ("green7", "#228b22"),
    ("pink4", "#ff00ff"),
    ("gray6", "#dcdcdc"),
    ("white4", "#f8f8ff"),
    ("yellow3", "#ffd700"),
    ("yellow4", "#daa520"),
    ("gray7", "#808080"),
    ("green8", "#008000"),
    ("green9", "#adff2f"),
    ("green10", "#f0fff0"),
    ("pink5", "#ff69b4"),
    ("red5", "#cd5c5c"),
    ("indigo", "#4b0082"),
    ("white5", "#fffff0"),
    ("yellow5", "#f0e68c"),
    ("violet1", "#e6e6fa"),
    ("pink6", "#fff0f5"),
    ("green11", "#7cfc00"),
    ("yellow6", "#fffacd"),
    ("blue18", "#add8e6"),
    ("lightcoral", "#f08080"),
    ("blue19", "#e0ffff"),
    ("yellow7", "#fafad2"),
    ("gray8", "#d3d3d3"),
    ("green12", "#90ee90"),
    ("pink7", "#ffb6c1"),
    ("orange3", "#ffa07a"),
    ("green13", "#20b2aa"),
    ("blue20", "#87cefa"),
    ("gray9", "#778899"),
    ("gray10", "#b0c4de"),
    ("cream5", "#ffffe0"),
    ("green14", "#00ff00"),
    ("green15", "#32cd32"),
    ("cream6", "#faf0e6"),
    ("red6", "#ff00ff"),
    ("maroon", "#800000"),
    ("green16", "#66cdaa"),
    ("blue21", "#0000cd"),
    ("purple3", "#ba55d3"),
    ("purple4", "#9370d8"),
    ("purple5", "#9370db"),
    ("green17", "#3cb371"),
    ("blue22", "#7b68ee"),
    ("green18", "#00fa9a"),
    ("blue23", "#48d1cc"),
    ("pink8", "#c71585"),
    ("blue24", "#191970"),
    ("green19", "#f5fffa"),
    ("cream7", "#ffe4e1"),
    ("cream8", "#ffe4b5"),
    ("cream9", "#ffdead"),
    ("blue25", "#000080"),
    ("cream10", "#fdf5e6"),
    ("green20", "#808000"),
    ("green21", "#6b8e23"),
    ("orange4", "#ffa500"),
    ("orange5", "#ff4500"),
    ("purple6", "#da70d6"),
    ("yellow8", "#eee8aa"),
    ("green22", "#98fb98"),
    ("blue26", "#afeeee"),
    ("pink9", "#d87093"),
    ("cream11", "#ffefd5"),
    ("cream12", "#ffdab9"),
    ("brown4", "#cd853f"),
    ("pink10", "#ffc0cb"),
    ("purple7", "#dda0dd"),
    ("blue27", "#b0e0e6"),
    ("purple8", "#800080"),
    ("red7", "#ff0000"),
    ("brown5", "#bc8f8f"),
    ("blue28", "#4169e1"),
    ("brown6", "#8b4513"),
    ("orange6", "#fa8072"),
    ("brown7", "#f4a460"),
    ("green23", "#2e8b57"),
    ("cream13", "#fff5ee"),
    ("brown8", "#a0522d"),
    ("gray11", "#c0c0c0"),
    ("blue29", "#87ceeb"),
    ("blue30", "#6a5acd"),
    ("gray12", "#708090"),
    ("white6", "#fffafa"),
    ("green24", "#00ff7f"),
    ("blue31", "#4682b4"),
    ("brown9", "#d2b48c"),
    ("blue32", "#008080"),
    ("purple9", "#d8bfd8"),
    ("orange7", "#ff6347"),
    ("blue33", "#40e0d0"),
    ("violet2", "#ee82ee"),
    ("cream14", "#f5deb3"),
    ("white7", "#ffffff"),
    ("white8", "#f5f5f5"),
    ("yellow9", "#ffff00"),
    ("green25", "#9acd32"),
];

static HEX_TO_NAME: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = HashMap::with_capacity(NAMED_COLORS.len());
    for &(name, hex) in NAMED_COLORS {
        map.entry(hex).or_insert(name);
    }
    map
});

/// Table colors decoded once, in table order.
static NAMED_RGB: LazyLock<Vec<(&'static str, Rgb8)>> = LazyLock::new(|| {
    NAMED_COLORS
        .iter()
        .filter_map(|&(name, hex)| hex_to_rgb(hex).ok().map(|rgb| (name, rgb)))
        .collect()
});

/// Lower-cased six digit form of `#rgb` or `#rrggbb`.
pub fn normalize_hex(hex: &str) -> Result<String> {
    let invalid = || ScanError::InvalidHex(hex.to_string());
    let digits = hex.strip_prefix('#').ok_or_else(invalid)?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let digits = digits.to_ascii_lowercase();
    match digits.len() {
        6 => Ok(format!("#{digits}")),
        3 => Ok(digits.chars().fold(String::from("#"), |mut acc, c| {
            acc.push(c);
            acc.push(c);
            acc
        })),
        _ => Err(invalid()),
    }
}

pub fn hex_to_rgb(hex: &str) -> Result<Rgb8> {
    let normalized = normalize_hex(hex)?;
    let channel = |i: usize| {
        u8::from_str_radix(&normalized[i..i + 2], 16)
            .map_err(|_| ScanError::InvalidHex(hex.to_string()))
    };
    Ok([channel(1)?, channel(3)?, channel(5)?])
}

pub fn rgb_to_hex([r, g, b]: Rgb8) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Exact lookup. When several names share a hex value the first one in the table wins.
pub fn hex_to_name(hex: &str) -> Option<&'static str> {
    let normalized = normalize_hex(hex).ok()?;
    HEX_TO_NAME.get(normalized.as_str()).copied()
}

pub fn rgb_to_name(rgb: Rgb8) -> Option<&'static str> {
    HEX_TO_NAME.get(rgb_to_hex(rgb).as_str()).copied()
}

pub fn name_to_hex(name: &str) -> Option<&'static str> {
    let name = name.to_ascii_lowercase();
    NAMED_COLORS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|&(_, hex)| hex)
}

pub fn name_to_rgb(name: &str) -> Option<Rgb8> {
    name_to_hex(name).and_then(|hex| hex_to_rgb(hex).ok())
}

/// Nearest table color by squared Euclidean distance in RGB.
/// Ties go to the entry that comes first in the table.
pub fn closest_name(rgb: Rgb8) -> &'static str {
    let mut best = ("", u32::MAX);
    for &(name, candidate) in NAMED_RGB.iter() {
        let dist: u32 = (0..3)
            .map(|c| {
                let d = i32::from(candidate[c]) - i32::from(rgb[c]);
                (d * d) as u32
            })
            .sum();
        if dist < best.1 {
            best = (name, dist);
        }
    }
    best.0
}

/// `(exact name if any, closest name)`. The closest name equals the exact
/// one whenever an exact match exists.
pub fn color_name(rgb: Rgb8) -> (Option<&'static str>, &'static str) {
    match rgb_to_name(rgb) {
        Some(name) => (Some(name), name),
        None => (None, closest_name(rgb)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        for r in (0..=255u8).step_by(5) {
            for g in (0..=255u8).step_by(15) {
                for b in [0u8, 1, 127, 128, 254, 255] {
                    assert_eq!(hex_to_rgb(&rgb_to_hex([r, g, b])).unwrap(), [r, g, b]);
                }
            }
        }
    }

    #[test]
    fn short_and_mixed_case_hex() {
        assert_eq!(normalize_hex("#FfF").unwrap(), "#ffffff");
        assert_eq!(hex_to_rgb("#000080").unwrap(), [0, 0, 128]);
        assert_eq!(hex_to_rgb("#ABC").unwrap(), [0xaa, 0xbb, 0xcc]);
    }

    #[test]
    fn malformed_hex_is_rejected() {
        for bad in ["ffffff", "#ffff", "#gggggg", "#", "#1234567"] {
            assert!(
                matches!(hex_to_rgb(bad), Err(ScanError::InvalidHex(_))),
                "{bad} should be invalid"
            );
        }
    }

    #[test]
    fn every_table_entry_is_valid_hex() {
        assert_eq!(NAMED_RGB.len(), NAMED_COLORS.len());
    }

    #[test]
    fn exact_lookup_prefers_first_entry() {
        assert_eq!(rgb_to_name([255, 0, 0]), Some("red7"));
        assert_eq!(rgb_to_name([255, 255, 255]), Some("white7"));
        // Shared by blue1, blue4 and blue11.
        assert_eq!(hex_to_name("#0ff"), Some("blue1"));
        assert_eq!(rgb_to_name([1, 2, 3]), None);
    }

    #[test]
    fn reverse_lookup_by_name() {
        assert_eq!(name_to_hex("Coral"), Some("#ff7f50"));
        assert_eq!(name_to_rgb("maroon"), Some([128, 0, 0]));
        assert_eq!(name_to_rgb("chartreuse"), None);
    }

    #[test]
    fn nearest_name_fallback() {
        assert_eq!(closest_name([250, 2, 3]), "red7");
        assert_eq!(closest_name([1, 1, 1]), "black2");
        let (actual, closest) = color_name([250, 250, 250]);
        assert_eq!(actual, None);
        assert!(closest.starts_with("white"));
    }

    #[test]
    fn exact_match_reports_both_names() {
        assert_eq!(color_name([0, 0, 128]), (Some("blue25"), "blue25"));
    }
}
