use serde::{Deserialize, Serialize};

/// Straight-alpha RGBA8 color used for caption text.
///
/// Deserializes from a CSS-style name (`"white"`), a hex string (`"#RRGGBB"` / `"#RRGGBBAA"`), or
/// an `[r, g, b]` / `[r, g, b, a]` array of 0-255 integers. Serializes as a hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextColor {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl TextColor {
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Opaque color from RGB channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse a color name or hex string.
    pub fn parse(s: &str) -> Result<Self, String> {
        let t = s.trim();
        if t.starts_with('#') {
            return parse_hex(t);
        }
        named(t).ok_or_else(|| format!("unknown color name \"{t}\""))
    }

    /// Hex form `#rrggbb` (or `#rrggbbaa` when not opaque).
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Default for TextColor {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Serialize for TextColor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for TextColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Str(String),
            Arr(Vec<u8>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Str(s) => Self::parse(&s).map_err(serde::de::Error::custom),
            Repr::Arr(v) => match v.as_slice() {
                [r, g, b] => Ok(Self::rgb(*r, *g, *b)),
                [r, g, b, a] => Ok(Self {
                    r: *r,
                    g: *g,
                    b: *b,
                    a: *a,
                }),
                _ => Err(serde::de::Error::custom(
                    "color array must have len 3 ([r,g,b]) or 4 ([r,g,b,a])",
                )),
            },
        }
    }
}

fn named(name: &str) -> Option<TextColor> {
    let c = match name.to_ascii_lowercase().as_str() {
        "white" => TextColor::rgb(255, 255, 255),
        "black" => TextColor::rgb(0, 0, 0),
        "red" => TextColor::rgb(255, 0, 0),
        "green" => TextColor::rgb(0, 128, 0),
        "blue" => TextColor::rgb(0, 0, 255),
        "yellow" => TextColor::rgb(255, 255, 0),
        "gold" => TextColor::rgb(255, 215, 0),
        "pink" => TextColor::rgb(255, 192, 203),
        "hotpink" => TextColor::rgb(255, 105, 180),
        "orange" => TextColor::rgb(255, 165, 0),
        "purple" => TextColor::rgb(128, 0, 128),
        "transparent" => TextColor {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        },
        _ => return None,
    };
    Some(c)
}

fn parse_hex(s: &str) -> Result<TextColor, String> {
    let s = s.strip_prefix('#').unwrap_or(s);

    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    if !s.is_ascii() {
        return Err("hex color must be ASCII".to_owned());
    }
    match s.len() {
        6 => Ok(TextColor::rgb(
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
        )),
        8 => Ok(TextColor {
            r: hex_byte(&s[0..2])?,
            g: hex_byte(&s[2..4])?,
            b: hex_byte(&s[4..6])?,
            a: hex_byte(&s[6..8])?,
        }),
        _ => Err("hex color must be #RRGGBB or #RRGGBBAA (case-insensitive)".to_owned()),
    }
}
