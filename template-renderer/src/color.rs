//! Color sanitization for export.
//!
//! The rasterizer only understands a conservative color syntax. Every color
//! written into a snapshot goes through [`safe_color`], which never fails.

/// What a color is used for; decides the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRole {
    /// Foreground text and strokes.
    Text,
    /// Page, cell and block backgrounds.
    Surface,
}

impl ColorRole {
    /// Color used when the input cannot be understood.
    #[must_use]
    pub const fn fallback(self) -> &'static str {
        match self {
            Self::Text => "#000000",
            Self::Surface => "#ffffff",
        }
    }
}

const NAMED_COLORS: [(&str, &str); 9] = [
    ("transparent", "rgba(0,0,0,0)"),
    ("currentcolor", "#000000"),
    ("black", "#000000"),
    ("white", "#ffffff"),
    ("red", "#ff0000"),
    ("green", "#00ff00"),
    ("blue", "#0000ff"),
    ("gray", "#808080"),
    ("grey", "#808080"),
];

/// Map any color string to one the rasterizer accepts.
///
/// Hex (`#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`) and `rgb()`/`rgba()` pass
/// through, a few names map to hex, everything else becomes the role's
/// fallback.
#[must_use]
pub fn safe_color(color: &str, role: ColorRole) -> String {
    let color = color.trim();
    if is_hex_color(color) || is_rgb_function(color) {
        return color.to_string();
    }
    let lower = color.to_ascii_lowercase();
    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == lower)
        .map_or_else(|| role.fallback().to_string(), |(_, hex)| (*hex).to_string())
}

fn is_hex_color(color: &str) -> bool {
    color.strip_prefix('#').is_some_and(|digits| {
        matches!(digits.len(), 3 | 4 | 6 | 8) && digits.chars().all(|c| c.is_ascii_hexdigit())
    })
}

fn is_rgb_function(color: &str) -> bool {
    let lower = color.to_ascii_lowercase();
    let (args, expected) = if let Some(rest) = lower.strip_prefix("rgba(") {
        (rest, 4)
    } else if let Some(rest) = lower.strip_prefix("rgb(") {
        (rest, 3)
    } else {
        return false;
    };
    let Some(args) = args.strip_suffix(')') else {
        return false;
    };

    let parts: Vec<&str> = args
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    (parts.len() == expected || (expected == 3 && parts.len() == 4))
        && parts.into_iter().all(|p| {
            p.strip_suffix('%')
                .unwrap_or(p)
                .parse::<f32>()
                .is_ok_and(f32::is_finite)
        })
}
