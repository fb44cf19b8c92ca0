use std::convert::TryInto;

use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(#[serde(deserialize_with = "deserialize_color")] u32);

impl Color {
    pub const fn from_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(u32::from_be_bytes([r, g, b, a]))
    }

    pub const fn to_rgba(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

fn deserialize_color<'de, D: serde::Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    struct ColorVisitor;

    impl<'de> serde::de::Visitor<'de> for ColorVisitor {
        type Value = u32;

        fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("an RGBA integer or a \"#RGB\", \"#RRGGBB\" or \"#RRGGBBAA\" string")
        }

        fn visit_i64<E: serde::de::Error>(self, value: i64) -> Result<u32, E> {
            value.try_into().map_err(E::custom)
        }

        fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<u32, E> {
            parse_hex(value).ok_or_else(|| E::invalid_value(serde::de::Unexpected::Str(value), &self))
        }
    }

    d.deserialize_any(ColorVisitor)
}

/// `#RGB` and `#RRGGBB` get an opaque alpha.
fn parse_hex(value: &str) -> Option<u32> {
    let digits = value.strip_prefix('#')?;
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let raw = u32::from_str_radix(digits, 16).ok()?;
    match digits.len() {
        3 => {
            let [_, _, hi, lo] = raw.to_be_bytes();
            let (r, g, b) = (hi & 0xf, lo >> 4, lo & 0xf);
            Some(u32::from_be_bytes([r * 0x11, g * 0x11, b * 0x11, 0xff]))
        }
        6 => Some(raw << 8 | 0xff),
        8 => Some(raw),
        _ => None,
    }
}
