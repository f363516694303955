//! SIM status words (TS 51.011 section 9.4)

/// Status Word constants
pub struct SW;

impl SW {
    // Normal ending
    pub const SUCCESS: u16 = 0x9000;

    // Memory management (92xx)
    pub const MEMORY_PROBLEM: u16 = 0x9240;

    // Referencing management (94xx)
    pub const NO_EF_SELECTED: u16 = 0x9400;
    pub const OUT_OF_RANGE: u16 = 0x9402;
    pub const FILE_NOT_FOUND: u16 = 0x9404;
    pub const FILE_INCONSISTENT: u16 = 0x9408;

    // Security management (98xx)
    pub const NO_CHV_INITIALIZED: u16 = 0x9802;
    pub const ACCESS_CONDITION_NOT_FULFILLED: u16 = 0x9804;
    pub const CONTRADICTION_WITH_CHV: u16 = 0x9808;
    pub const CONTRADICTION_WITH_INVALIDATION: u16 = 0x9810;
    pub const CHV_BLOCKED: u16 = 0x9840;
    pub const MAX_VALUE_REACHED: u16 = 0x9850;

    // Application independent errors
    pub const WRONG_LENGTH: u16 = 0x6700;
    pub const WRONG_P1_P2: u16 = 0x6B00;
    pub const INS_NOT_SUPPORTED: u16 = 0x6D00;
    pub const CLA_NOT_SUPPORTED: u16 = 0x6E00;
    pub const TECHNICAL_PROBLEM: u16 = 0x6F00;

    #[inline]
    pub fn from_parts(sw1: u8, sw2: u8) -> u16 {
        ((sw1 as u16) << 8) | (sw2 as u16)
    }

    /// Normal ending, with or without a pending proactive command or
    /// response data
    #[inline]
    pub fn is_success(sw: u16) -> bool {
        matches!(sw >> 8, 0x90 | 0x91 | 0x9F)
    }

    /// Normal ending with a proactive command waiting (91xx); the low byte is
    /// its length
    #[inline]
    pub fn proactive_command_length(sw: u16) -> Option<u8> {
        if sw >> 8 == 0x91 {
            Some(sw as u8)
        } else {
            None
        }
    }

    /// Response data available (9Fxx); the low byte is the length
    #[inline]
    pub fn response_length(sw: u16) -> Option<u8> {
        if sw >> 8 == 0x9F {
            Some(sw as u8)
        } else {
            None
        }
    }

    /// Short description for logs
    pub fn describe(sw: u16) -> &'static str {
        match sw {
            Self::SUCCESS => "normal ending",
            Self::NO_EF_SELECTED => "no EF selected",
            Self::OUT_OF_RANGE => "out of range",
            Self::FILE_NOT_FOUND => "file or pattern not found",
            Self::FILE_INCONSISTENT => "file inconsistent with command",
            Self::NO_CHV_INITIALIZED => "no CHV initialized",
            Self::ACCESS_CONDITION_NOT_FULFILLED => "access condition not fulfilled",
            Self::CONTRADICTION_WITH_CHV => "in contradiction with CHV status",
            Self::CONTRADICTION_WITH_INVALIDATION => "in contradiction with invalidation status",
            Self::CHV_BLOCKED => "CHV blocked",
            Self::MAX_VALUE_REACHED => "increase cannot be performed",
            _ if Self::is_success(sw) => "normal ending",
            _ => match sw >> 8 {
                0x92 => "memory problem",
                0x67 => "incorrect parameter P3",
                0x6B => "incorrect parameter P1 or P2",
                0x6D => "unknown instruction code",
                0x6E => "wrong instruction class",
                0x6F => "technical problem",
                _ => "unknown status",
            },
        }
    }
}
