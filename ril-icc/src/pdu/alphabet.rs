//! GSM 03.38 national language tables
//!
//! Each language has a locking shift table (what a septet means by default)
//! and a single shift table (what a septet means right after an escape).

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Septet that switches the next unit to the single shift table
pub const ESCAPE: u8 = 0x1B;

/// Placeholder for the escape position inside a table
pub const ESCAPE_CHAR: char = '\u{FFFF}';

/// Reserved control slot in single shift tables (page break on some
/// terminals); never produced by encoding
pub const RESERVED_CONTROL: u8 = 0x0D;
pub const RESERVED_CONTROL_CHAR: char = '\u{FFFE}';

const DEFAULT_LOCKING_CHARS: &str = concat!(
    "@£$¥èéùìòÇ\nØø\rÅå",
    "Δ_ΦΓΛΩΠΨΣΘΞ\u{FFFF}ÆæßÉ",
    " !\"#¤%&'()*+,-./",
    "0123456789:;<=>?",
    "¡ABCDEFGHIJKLMNO",
    "PQRSTUVWXYZÄÖÑÜ§",
    "¿abcdefghijklmno",
    "pqrstuvwxyzäöñüà",
);

const TURKISH_LOCKING_CHARS: &str = concat!(
    "@£$¥€éùıòÇ\nĞğ\rÅå",
    "Δ_ΦΓΛΩΠΨΣΘΞ\u{FFFF}ŞşßÉ",
    " !\"#¤%&'()*+,-./",
    "0123456789:;<=>?",
    "İABCDEFGHIJKLMNO",
    "PQRSTUVWXYZÄÖÑÜ§",
    "çabcdefghijklmno",
    "pqrstuvwxyzäöñüà",
);

const COMMON_SHIFT_ENTRIES: &[(u8, char)] = &[
    (0x0A, '\u{000C}'),
    (0x14, '^'),
    (0x28, '{'),
    (0x29, '}'),
    (0x2F, '\\'),
    (0x3C, '['),
    (0x3D, '~'),
    (0x3E, ']'),
    (0x40, '|'),
    (0x65, '€'),
];

const TURKISH_SHIFT_ENTRIES: &[(u8, char)] = &[
    (0x47, 'Ğ'),
    (0x49, 'İ'),
    (0x53, 'Ş'),
    (0x63, 'ç'),
    (0x67, 'ğ'),
    (0x69, 'ı'),
    (0x73, 'ş'),
];

const SPANISH_SHIFT_ENTRIES: &[(u8, char)] = &[
    (0x09, 'ç'),
    (0x41, 'Á'),
    (0x49, 'Í'),
    (0x4F, 'Ó'),
    (0x55, 'Ú'),
    (0x61, 'á'),
    (0x69, 'í'),
    (0x6F, 'ó'),
    (0x75, 'ú'),
];

pub type Table = [char; 128];

fn locking_table(chars: &str) -> Table {
    let mut table = [' '; 128];
    for (slot, ch) in table.iter_mut().zip(chars.chars()) {
        *slot = ch;
    }
    table
}

fn shift_table(extra: &[(u8, char)]) -> Table {
    let mut table = [' '; 128];
    for &(septet, ch) in COMMON_SHIFT_ENTRIES.iter().chain(extra) {
        table[septet as usize] = ch;
    }
    table[RESERVED_CONTROL as usize] = RESERVED_CONTROL_CHAR;
    table[ESCAPE as usize] = ESCAPE_CHAR;
    table
}

static DEFAULT_LOCKING: Lazy<Table> = Lazy::new(|| locking_table(DEFAULT_LOCKING_CHARS));
static TURKISH_LOCKING: Lazy<Table> = Lazy::new(|| locking_table(TURKISH_LOCKING_CHARS));
static DEFAULT_SHIFT: Lazy<Table> = Lazy::new(|| shift_table(&[]));
static TURKISH_SHIFT: Lazy<Table> = Lazy::new(|| shift_table(TURKISH_SHIFT_ENTRIES));
static SPANISH_SHIFT: Lazy<Table> = Lazy::new(|| shift_table(SPANISH_SHIFT_ENTRIES));

/// National language identifier (TS 23.038 section 6.2.1.2.4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NationalLanguage {
    #[default]
    Default,
    Turkish,
    /// Spanish defines only a single shift table; its locking table is the
    /// default one.
    Spanish,
}

impl NationalLanguage {
    pub fn from_identifier(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::Default),
            1 => Some(Self::Turkish),
            2 => Some(Self::Spanish),
            _ => None,
        }
    }

    pub fn identifier(self) -> u8 {
        match self {
            Self::Default => 0,
            Self::Turkish => 1,
            Self::Spanish => 2,
        }
    }

    pub fn locking_table(self) -> &'static Table {
        match self {
            Self::Default | Self::Spanish => &DEFAULT_LOCKING,
            Self::Turkish => &TURKISH_LOCKING,
        }
    }

    pub fn single_shift_table(self) -> &'static Table {
        match self {
            Self::Default => &DEFAULT_SHIFT,
            Self::Turkish => &TURKISH_SHIFT,
            Self::Spanish => &SPANISH_SHIFT,
        }
    }

    /// Septet of `ch` in the locking table; the escape slot never matches
    pub fn locking_septet(self, ch: char) -> Option<u8> {
        if ch == ESCAPE_CHAR {
            return None;
        }
        self.locking_table()
            .iter()
            .position(|&c| c == ch)
            .map(|i| i as u8)
    }

    /// Septet of `ch` in the single shift table, to be sent after an escape
    pub fn shift_septet(self, ch: char) -> Option<u8> {
        if ch == ESCAPE_CHAR || ch == RESERVED_CONTROL_CHAR {
            return None;
        }
        self.single_shift_table()
            .iter()
            .position(|&c| c == ch)
            .map(|i| i as u8)
    }
}

/// Map one septet to its character, honouring a preceding escape.
///
/// An escape followed by another escape or by the reserved control decodes
/// to a space.
pub(crate) fn decode_septet(septet: u8, escaped: bool, lang: NationalLanguage, shift: NationalLanguage) -> char {
    let septet = (septet & 0x7F) as usize;
    if escaped {
        let ch = shift.single_shift_table()[septet];
        if ch == ESCAPE_CHAR || ch == RESERVED_CONTROL_CHAR {
            ' '
        } else {
            ch
        }
    } else {
        lang.locking_table()[septet]
    }
}

/// True when every character of `text` has a default-alphabet encoding
pub fn is_gsm_8bit_alphabet(text: &str) -> bool {
    let locking = NationalLanguage::Default.locking_table();
    let shift = NationalLanguage::Default.single_shift_table();
    text.chars().all(|c| locking.contains(&c) || shift.contains(&c))
}
