#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const PERSON: Color = Color::rgb(0xFF, 0x0F, 0x0F);
    pub const OBJECT: Color = Color::rgb(0x00, 0xB6, 0x12);
    pub const FACE: Color = Color::rgb(0x1E, 0x90, 0xFF);
    pub const FACE_KEYPOINT: Color = Color::rgb(0xFF, 0xD7, 0x00);
    pub const HAND_CONNECTION: Color = Color::rgb(0x00, 0xFF, 0x00);
    pub const HAND_LANDMARK: Color = Color::rgb(0xFF, 0x00, 0x00);
    pub const FACE_MESH: Color = Color::rgb(0xC0, 0xC0, 0x70);
    pub const LABEL_TEXT: Color = Color::rgb(0xFF, 0xFF, 0xFF);
    pub const LABEL_BACKGROUND: Color = Color::rgb(0x20, 0x20, 0x20);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#RRGGBB` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
        Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}
