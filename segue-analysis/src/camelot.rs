//! Camelot wheel notation for harmonic mixing
//!
//! Maps musical keys to Camelot notation (1A-12B) and measures how far apart
//! two keys sit on the wheel.

use std::fmt;

/// Musical key (24 possible: 12 major + 12 minor)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MusicalKey {
    CMajor,
    DbMajor,
    DMajor,
    EbMajor,
    EMajor,
    FMajor,
    GbMajor,
    GMajor,
    AbMajor,
    AMajor,
    BbMajor,
    BMajor,
    CMinor,
    DbMinor,
    DMinor,
    EbMinor,
    EMinor,
    FMinor,
    GbMinor,
    GMinor,
    AbMinor,
    AMinor,
    BbMinor,
    BMinor,
}

const MAJOR_KEYS: [MusicalKey; 12] = [
    MusicalKey::CMajor,
    MusicalKey::DbMajor,
    MusicalKey::DMajor,
    MusicalKey::EbMajor,
    MusicalKey::EMajor,
    MusicalKey::FMajor,
    MusicalKey::GbMajor,
    MusicalKey::GMajor,
    MusicalKey::AbMajor,
    MusicalKey::AMajor,
    MusicalKey::BbMajor,
    MusicalKey::BMajor,
];

const MINOR_KEYS: [MusicalKey; 12] = [
    MusicalKey::CMinor,
    MusicalKey::DbMinor,
    MusicalKey::DMinor,
    MusicalKey::EbMinor,
    MusicalKey::EMinor,
    MusicalKey::FMinor,
    MusicalKey::GbMinor,
    MusicalKey::GMinor,
    MusicalKey::AbMinor,
    MusicalKey::AMinor,
    MusicalKey::BbMinor,
    MusicalKey::BMinor,
];

/// Flat spelling of each pitch class, index 0 = C
const ROOT_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

impl MusicalKey {
    /// Pitch class (0-11, where 0=C) of this key's root
    pub fn root_pitch_class(&self) -> u8 {
        let idx = *self as u8;
        idx % 12
    }

    pub fn is_major(&self) -> bool {
        (*self as u8) < 12
    }

    /// Major key from pitch class (0-11)
    pub fn major_from_pitch_class(pc: u8) -> Self {
        MAJOR_KEYS[(pc % 12) as usize]
    }

    /// Minor key from pitch class (0-11)
    pub fn minor_from_pitch_class(pc: u8) -> Self {
        MINOR_KEYS[(pc % 12) as usize]
    }

    /// Long name, e.g. "C Major", "Bb Minor"
    pub fn name(&self) -> String {
        let mode = if self.is_major() { "Major" } else { "Minor" };
        format!("{} {}", ROOT_NAMES[self.root_pitch_class() as usize], mode)
    }

    /// Parse a key name
    ///
    /// Accepts long names ("C Major", "F# minor") and short names
    /// ("Am", "Eb", "C#m"). Sharps are folded onto the flat spelling.
    pub fn parse_name(s: &str) -> Option<Self> {
        let s = s.trim();
        let mut chars = s.chars();
        let letter = chars.next()?.to_ascii_uppercase();
        let base: i8 = match letter {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return None,
        };

        let rest = chars.as_str();
        let (offset, rest) = if let Some(r) = rest.strip_prefix('#') {
            (1, r)
        } else if let Some(r) = rest.strip_prefix('b') {
            (-1, r)
        } else {
            (0, rest)
        };
        let pc = (base + offset).rem_euclid(12) as u8;

        let mode = rest.trim().to_ascii_lowercase();
        match mode.as_str() {
            "" | "maj" | "major" => Some(Self::major_from_pitch_class(pc)),
            "m" | "min" | "minor" => Some(Self::minor_from_pitch_class(pc)),
            _ => None,
        }
    }
}

impl fmt::Display for MusicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let root = ROOT_NAMES[self.root_pitch_class() as usize];
        if self.is_major() {
            write!(f, "{}", root)
        } else {
            write!(f, "{}m", root)
        }
    }
}

/// Camelot wheel notation (1A-12B)
///
/// - Numbers 1-12 are positions on the wheel (circle of fifths)
/// - 'A' suffix = minor keys
/// - 'B' suffix = major keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CamelotKey {
    /// Position on the wheel (1-12)
    pub number: u8,
    /// true = B (major), false = A (minor)
    pub is_major: bool,
}

impl CamelotKey {
    pub fn new(number: u8, is_major: bool) -> Option<Self> {
        if (1..=12).contains(&number) {
            Some(Self { number, is_major })
        } else {
            None
        }
    }

    /// Convert from musical key to Camelot notation
    ///
    /// One step on the wheel is a fifth (7 semitones). C major sits at 8B
    /// and A minor at 8A; relative major/minor pairs share a number.
    pub fn from_musical_key(key: MusicalKey) -> Self {
        let pc = key.root_pitch_class() as u32;
        let offset = if key.is_major() { 7 } else { 4 };
        Self {
            number: ((pc * 7 + offset) % 12) as u8 + 1,
            is_major: key.is_major(),
        }
    }

    pub fn to_musical_key(&self) -> MusicalKey {
        // 7 is its own inverse mod 12
        let anchor: i32 = if self.is_major { 8 } else { 5 };
        let pc = (7 * (self.number as i32 - anchor)).rem_euclid(12) as u8;
        if self.is_major {
            MusicalKey::major_from_pitch_class(pc)
        } else {
            MusicalKey::minor_from_pitch_class(pc)
        }
    }

    /// Display string (e.g., "8A", "12B")
    pub fn display(&self) -> String {
        format!("{}{}", self.number, if self.is_major { 'B' } else { 'A' })
    }

    /// Parse from string (e.g., "8A", "12B")
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.len() < 2 {
            return None;
        }

        let last = s.chars().last()?;
        let is_major = match last.to_ascii_uppercase() {
            'B' => true,
            'A' => false,
            _ => return None,
        };

        let number: u8 = s[..s.len() - 1].parse().ok()?;
        Self::new(number, is_major)
    }

    /// Same key, relative major/minor, or adjacent number with the same letter
    pub fn is_compatible(&self, other: &CamelotKey) -> bool {
        self.wheel_distance(other) <= 1
    }

    /// How far apart two keys are on the wheel
    ///
    /// - 0: same key
    /// - 1: adjacent (±1) or relative major/minor
    /// - 2+: less compatible
    pub fn wheel_distance(&self, other: &CamelotKey) -> u8 {
        let d = (self.number as i8 - other.number as i8).unsigned_abs();
        let num_diff = d.min(12 - d);
        let mode_diff = u8::from(self.is_major != other.is_major);
        num_diff + mode_diff
    }

    /// All keys that mix cleanly with this one, self included
    pub fn compatible_keys(&self) -> Vec<CamelotKey> {
        let prev = if self.number == 1 { 12 } else { self.number - 1 };
        let next = if self.number == 12 { 1 } else { self.number + 1 };

        vec![
            *self,
            CamelotKey {
                number: self.number,
                is_major: !self.is_major,
            },
            CamelotKey {
                number: prev,
                is_major: self.is_major,
            },
            CamelotKey {
                number: next,
                is_major: self.is_major,
            },
        ]
    }
}

impl fmt::Display for CamelotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(number: u8, is_major: bool) -> CamelotKey {
        CamelotKey { number, is_major }
    }

    #[test]
    fn test_camelot_from_musical_key() {
        assert_eq!(CamelotKey::from_musical_key(MusicalKey::CMajor), key(8, true));
        assert_eq!(CamelotKey::from_musical_key(MusicalKey::AMinor), key(8, false));
        assert_eq!(CamelotKey::from_musical_key(MusicalKey::GMajor), key(9, true));
        assert_eq!(CamelotKey::from_musical_key(MusicalKey::EMinor), key(9, false));
        assert_eq!(CamelotKey::from_musical_key(MusicalKey::AbMinor), key(1, false));
        assert_eq!(CamelotKey::from_musical_key(MusicalKey::BMajor), key(1, true));
        assert_eq!(CamelotKey::from_musical_key(MusicalKey::EMajor), key(12, true));
    }

    #[test]
    fn test_roundtrip_all_keys() {
        for key in MAJOR_KEYS.iter().chain(MINOR_KEYS.iter()) {
            let camelot = CamelotKey::from_musical_key(*key);
            assert_eq!(camelot.to_musical_key(), *key, "{}", camelot);
        }
    }

    #[test]
    fn test_camelot_parse() {
        assert_eq!(CamelotKey::parse("8B"), Some(key(8, true)));
        assert_eq!(CamelotKey::parse("12a"), Some(key(12, false)));
        assert_eq!(CamelotKey::parse("13A"), None);
        assert_eq!(CamelotKey::parse("0B"), None);
        assert_eq!(CamelotKey::parse("invalid"), None);
    }

    #[test]
    fn test_key_names() {
        assert_eq!(MusicalKey::CMajor.name(), "C Major");
        assert_eq!(MusicalKey::BbMinor.name(), "Bb Minor");
        assert_eq!(MusicalKey::AMinor.to_string(), "Am");
        assert_eq!(MusicalKey::parse_name("C Major"), Some(MusicalKey::CMajor));
        assert_eq!(MusicalKey::parse_name("F# minor"), Some(MusicalKey::GbMinor));
        assert_eq!(MusicalKey::parse_name("Am"), Some(MusicalKey::AMinor));
        assert_eq!(MusicalKey::parse_name("Eb"), Some(MusicalKey::EbMajor));
        assert_eq!(MusicalKey::parse_name("H dur"), None);
    }

    #[test]
    fn test_compatibility() {
        let a8 = key(8, false);
        assert!(a8.is_compatible(&a8));
        assert!(a8.is_compatible(&key(8, true)));
        assert!(a8.is_compatible(&key(7, false)));
        assert!(a8.is_compatible(&key(9, false)));
        assert!(key(1, false).is_compatible(&key(12, false)));
        assert!(!a8.is_compatible(&key(3, false)));
        assert!(!a8.is_compatible(&key(3, true)));
        assert!(!a8.is_compatible(&key(9, true)));
    }

    #[test]
    fn test_wheel_distance() {
        let a8 = key(8, false);
        assert_eq!(a8.wheel_distance(&a8), 0);
        assert_eq!(a8.wheel_distance(&key(8, true)), 1);
        assert_eq!(a8.wheel_distance(&key(10, false)), 2);
        assert_eq!(a8.wheel_distance(&key(3, false)), 5);
    }

    #[test]
    fn test_compatible_keys_list() {
        let compatible = key(12, true).compatible_keys();
        assert_eq!(compatible.len(), 4);
        assert!(compatible.contains(&key(12, false)));
        assert!(compatible.contains(&key(11, true)));
        assert!(compatible.contains(&key(1, true)));
    }
}
