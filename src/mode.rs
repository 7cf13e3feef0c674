//! Mode bitfield: address-of / value / pointee read-write triples, plus
//! the `DEF` bit. Bit layout is a persisted, external contract
//! and must not change.

use anyhow::{bail, Result};

pub const U_R_AOF: u32 = 1 << 0;
pub const U_W_AOF: u32 = 1 << 1;
pub const U_R_VAL: u32 = 1 << 2;
pub const U_W_VAL: u32 = 1 << 3;
pub const U_R_PTR: u32 = 1 << 4;
pub const U_W_PTR: u32 = 1 << 5;

/// `0x100 << U_SHIFT` with `U_SHIFT = 0`; sits above the six RW bits.
pub const DEF: u32 = 0x100;

pub const ALL_RW_BITS: u32 = U_R_AOF | U_W_AOF | U_R_VAL | U_W_VAL | U_R_PTR | U_W_PTR;

/// One of the three (address-of, value, pointee) triples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Triple {
    Aof,
    Val,
    Ptr,
}

impl Triple {
    fn bits(self) -> (u32, u32) {
        match self {
            Triple::Aof => (U_R_AOF, U_W_AOF),
            Triple::Val => (U_R_VAL, U_W_VAL),
            Triple::Ptr => (U_R_PTR, U_W_PTR),
        }
    }
}

/// Read, write, or modify (read+write) a triple. Never OR'd with `DEF`
/// in one record (defs are emitted via a separate callback).
pub fn mode_bits(triple: Triple, read: bool, write: bool) -> u32 {
    let (r, w) = triple.bits();
    (if read { r } else { 0 }) | (if write { w } else { 0 })
}

/// Pretty-print one triple's two bits: `0->-, 1->r, 2->w, 3->m`.
pub fn triple_char(mode: u32, triple: Triple) -> char {
    let (r, w) = triple.bits();
    match ((mode & r != 0) as u8) | (((mode & w != 0) as u8) << 1) {
        0 => '-',
        1 => 'r',
        2 => 'w',
        3 => 'm',
        _ => unreachable!(),
    }
}

/// Pretty-print a full mode value: `"def"` for the `DEF` bit, else three
/// characters over AOF/VAL/PTR.
pub fn pretty(mode: u32) -> String {
    if mode == DEF {
        return "def".to_string();
    }
    [
        triple_char(mode, Triple::Aof),
        triple_char(mode, Triple::Val),
        triple_char(mode, Triple::Ptr),
    ]
    .iter()
    .collect()
}

/// A compiled `-m` mode-mask query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeQuery {
    /// `mode == 0`
    ExactZero,
    /// `mode == DEF`
    ExactDef,
    /// `(mode & mask) != 0`
    AnyBit(u32),
}

/// Parse a user-supplied `-m` argument into a `ModeQuery`.
///
/// 1-char shorthands expand to 3-char forms *exactly* as specified
/// (`w` -> `"ww-"`, not `"www"`). `"def"` is a dedicated exact-match
/// case. Otherwise exactly three characters, each one of `r w m -`,
/// select the corresponding AOF/VAL/PTR triple's R bit, W bit, both, or
/// neither.
pub fn parse_mode_query(input: &str) -> Result<ModeQuery> {
    if input == "def" {
        return Ok(ModeQuery::ExactDef);
    }

    let expanded = match input {
        "r" => "rrr".to_string(),
        "w" => "ww-".to_string(),
        "m" => "mmm".to_string(),
        "-" => "---".to_string(),
        other => other.to_string(),
    };

    let chars: Vec<char> = expanded.chars().collect();
    if chars.len() != 3 {
        bail!("invalid mode mask `{input}`: expected one of r w m -, or three characters each r/w/m/-");
    }

    let mut mask = 0u32;
    for (triple, ch) in [Triple::Aof, Triple::Val, Triple::Ptr].into_iter().zip(chars) {
        let (r, w) = triple.bits();
        mask |= match ch {
            'r' => r,
            'w' => w,
            'm' => r | w,
            '-' => 0,
            other => bail!("invalid mode mask character `{other}` in `{input}`"),
        };
    }

    if mask == 0 {
        Ok(ModeQuery::ExactZero)
    } else {
        Ok(ModeQuery::AnyBit(mask))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_explicit_three_char_forms() {
        for aof in ['-', 'r', 'w', 'm'] {
            for val in ['-', 'r', 'w', 'm'] {
                for ptr in ['-', 'r', 'w', 'm'] {
                    let s: String = [aof, val, ptr].iter().collect();
                    let q = parse_mode_query(&s).unwrap();
                    let mask = match q {
                        ModeQuery::ExactZero => 0,
                        ModeQuery::AnyBit(m) => m,
                        ModeQuery::ExactDef => panic!("unexpected def"),
                    };
                    assert_eq!(pretty(mask), s, "round trip failed for {s}");
                }
            }
        }
    }

    #[test]
    fn def_pretty_prints_as_def() {
        assert_eq!(pretty(DEF), "def");
        assert_eq!(parse_mode_query("def").unwrap(), ModeQuery::ExactDef);
    }

    #[test]
    fn shorthand_w_expands_to_ww_dash_per_spec() {
        assert_eq!(
            parse_mode_query("w").unwrap(),
            ModeQuery::AnyBit(U_W_AOF | U_W_VAL)
        );
    }

    #[test]
    fn shorthand_r_and_m_and_dash() {
        assert_eq!(
            parse_mode_query("r").unwrap(),
            ModeQuery::AnyBit(U_R_AOF | U_R_VAL | U_R_PTR)
        );
        assert_eq!(
            parse_mode_query("m").unwrap(),
            ModeQuery::AnyBit(ALL_RW_BITS)
        );
        assert_eq!(parse_mode_query("-").unwrap(), ModeQuery::ExactZero);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_mode_query("xyz").is_err());
        assert!(parse_mode_query("rw").is_err());
    }
}
