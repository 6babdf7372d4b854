//! Number bases and calculator modes.
//!
//! All per-base behaviour (radix, accepted digits, digit grouping) lives in a
//! single table instead of being spread over per-base types.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeral system radix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Base {
    Bin,
    Oct,
    #[default]
    Dec,
    Hex,
}

/// Static description of a base.
#[derive(Debug)]
pub struct BaseSpec {
    pub radix: u32,
    /// Characters accepted as digits (uppercase).
    pub digits: &'static str,
    /// Number of digits per group when grouping is enabled.
    pub group_width: usize,
    /// Separator inserted between digit groups.
    pub group_separator: char,
    /// Left-pad the leading group with zeros to a full group.
    pub pad_groups: bool,
    pub prefix: &'static str,
}

const BIN: BaseSpec = BaseSpec {
    radix: 2,
    digits: "01",
    group_width: 4,
    group_separator: ' ',
    pad_groups: true,
    prefix: "0b",
};

const OCT: BaseSpec = BaseSpec {
    radix: 8,
    digits: "01234567",
    group_width: 3,
    group_separator: ' ',
    pad_groups: false,
    prefix: "0o",
};

const DEC: BaseSpec = BaseSpec {
    radix: 10,
    digits: "0123456789",
    group_width: 3,
    group_separator: ',',
    pad_groups: false,
    prefix: "",
};

const HEX: BaseSpec = BaseSpec {
    radix: 16,
    digits: "0123456789ABCDEF",
    group_width: 2,
    group_separator: ' ',
    pad_groups: false,
    prefix: "0x",
};

impl Base {
    pub const ALL: [Base; 4] = [Base::Bin, Base::Oct, Base::Dec, Base::Hex];

    pub fn spec(self) -> &'static BaseSpec {
        match self {
            Self::Bin => &BIN,
            Self::Oct => &OCT,
            Self::Dec => &DEC,
            Self::Hex => &HEX,
        }
    }

    pub fn radix(self) -> u32 {
        self.spec().radix
    }

    /// Check if `c` is a digit of this base. Hex letters are accepted in either case.
    pub fn is_digit(self, c: char) -> bool {
        self.spec().digits.contains(c.to_ascii_uppercase())
    }

    pub fn is_decimal(self) -> bool {
        self == Self::Dec
    }
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bin => "BIN",
            Self::Oct => "OCT",
            Self::Dec => "DEC",
            Self::Hex => "HEX",
        };
        write!(f, "{name}")
    }
}

/// Calculator mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Standard,
    Programmer,
    Scientific,
}

impl Mode {
    pub fn is_programmer(self) -> bool {
        self == Self::Programmer
    }

    /// Input length limit used when settings do not override it.
    pub fn default_max_length(self) -> usize {
        match self {
            Self::Standard => 50,
            Self::Programmer => 64,
            Self::Scientific => 100,
        }
    }
}
