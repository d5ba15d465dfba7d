//! A parser for compact schematic signal lists.
//!
//! Terminal names and net labels in a schematic are written as
//! comma-separated lists. Each element of a list expands to one or more
//! single-bit signal names:
//!
//! | Syntax      | Expansion                              |
//! |-------------|----------------------------------------|
//! | `a`         | `a`                                    |
//! | `d[3:0]`    | `d[3]`, `d[2]`, `d[1]`, `d[0]`         |
//! | `d[0:6:2]`  | `d[0]`, `d[2]`, `d[4]`, `d[6]`         |
//! | `a#3`       | `a`, `a`, `a`                          |
//! | `5'3`       | `vdd`, `gnd`, `vdd`                    |
//!
//! Suffixes compose from left to right, so `a[1:0]#2` expands to
//! `a[1]`, `a[0]`, `a[1]`, `a[0]`. Constants take suffixes too:
//! `1'1#3` ties three bits to `vdd`.
//! Names are canonicalized to lower case.
//!
//! # Examples
//!
//! ```
//! let bits = siglist::parse_signal("clk, d[1:0]").unwrap();
//! assert_eq!(bits, vec!["clk", "d[1]", "d[0]"]);
//! ```
#![warn(missing_docs)]

use arcstr::ArcStr;
use nom::branch::alt;
use nom::bytes::complete::{tag, take_while, take_while1};
use nom::character::complete::{char, digit1, hex_digit1, multispace0, oct_digit1, one_of, satisfy};
use nom::combinator::{all_consuming, map, map_res, opt, recognize};
use nom::multi::many0;
use nom::sequence::{delimited, pair, preceded, separated_pair, tuple};
use nom::IResult;
use thiserror::Error;

#[cfg(test)]
mod tests;

/// The signal that `1` bits of a numeric constant expand to.
pub const VDD: &str = "vdd";
/// The signal that `0` bits of a numeric constant expand to.
pub const GND: &str = "gnd";

/// A signal list parsing result.
pub type Result<T> = std::result::Result<T, ParseError>;

/// An error parsing a signal list.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("invalid signal `{item}` in signal list `{text}`")]
pub struct ParseError {
    text: String,
    item: String,
}

impl ParseError {
    /// The full signal list that failed to parse.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The list element that could not be parsed.
    #[inline]
    pub fn item(&self) -> &str {
        &self.item
    }
}

/// Expands a signal list into its single-bit signal names, in order.
///
/// Empty list elements are skipped, so an empty string yields an empty list.
pub fn parse_signal(text: &str) -> Result<Vec<ArcStr>> {
    let mut signals = Vec::new();
    for item in text.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        match all_consuming(signal)(item) {
            Ok((_, expansion)) => signals.extend(expansion),
            Err(_) => {
                return Err(ParseError {
                    text: text.to_string(),
                    item: item.to_string(),
                })
            }
        }
    }
    Ok(signals)
}

/// The number of single-bit signals in the given signal list.
#[inline]
pub fn width(text: &str) -> Result<usize> {
    parse_signal(text).map(|signals| signals.len())
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Suffix {
    /// A constant index, e.g. `a[3]`.
    Index(u64),
    /// An iterated index, e.g. `a[3:0]`.
    ///
    /// `step` is never zero and its sign matches the iteration direction.
    Range { start: i64, stop: i64, step: i64 },
    /// A replication count, e.g. `a#4`.
    Repeat(usize),
}

impl Suffix {
    fn apply(self, expansion: Vec<ArcStr>) -> Vec<ArcStr> {
        match self {
            Self::Index(idx) => expansion
                .iter()
                .map(|name| arcstr::format!("{}[{}]", name, idx))
                .collect(),
            Self::Range { start, stop, step } => {
                let mut out = Vec::new();
                let mut idx = start;
                loop {
                    out.extend(
                        expansion
                            .iter()
                            .map(|name| arcstr::format!("{}[{}]", name, idx)),
                    );
                    idx = match idx.checked_add(step) {
                        Some(next) => next,
                        None => break,
                    };
                    if (step > 0 && idx > stop) || (step < 0 && idx < stop) {
                        break;
                    }
                }
                out
            }
            Self::Repeat(count) => (0..count)
                .flat_map(|_| expansion.iter().cloned())
                .collect(),
        }
    }
}

/// A base signal followed by any number of suffixes, applied left to right.
fn signal(input: &str) -> IResult<&str, Vec<ArcStr>> {
    let (input, base) = alt((constant, name))(input)?;
    let (input, suffixes) = many0(suffix)(input)?;
    let expansion = suffixes
        .into_iter()
        .fold(base, |expansion, suffix| suffix.apply(expansion));
    Ok((input, expansion))
}

/// A numeric constant of the form `number'size`, expanded MSB first.
fn constant(input: &str) -> IResult<&str, Vec<ArcStr>> {
    map(separated_pair(number, char('\''), size), |(value, size)| {
        (0..size)
            .rev()
            .map(|bit| {
                if (value >> bit.min(63)) & 1 == 1 {
                    ArcStr::from(VDD)
                } else {
                    ArcStr::from(GND)
                }
            })
            .collect()
    })(input)
}

fn number(input: &str) -> IResult<&str, i64> {
    let (input, sign) = opt(one_of("+-"))(input)?;
    let (input, magnitude) = alt((
        map_res(preceded(tag("0x"), hex_digit1), |digits: &str| {
            i64::from_str_radix(digits, 16)
        }),
        map_res(
            preceded(tag("0b"), take_while1(|c: char| c == '0' || c == '1')),
            |digits: &str| i64::from_str_radix(digits, 2),
        ),
        map_res(preceded(char('0'), oct_digit1), |digits: &str| {
            i64::from_str_radix(digits, 8)
        }),
        map_res(digit1, |digits: &str| digits.parse::<i64>()),
    ))(input)?;
    let value = if sign == Some('-') {
        -magnitude
    } else {
        magnitude
    };
    Ok((input, value))
}

fn size(input: &str) -> IResult<&str, u32> {
    map_res(
        recognize(pair(
            one_of("123456789"),
            take_while(|c: char| c.is_ascii_digit()),
        )),
        |digits: &str| digits.parse::<u32>(),
    )(input)
}

/// An identifier, canonicalized to lower case.
fn name(input: &str) -> IResult<&str, Vec<ArcStr>> {
    map(
        recognize(pair(
            satisfy(|c| c.is_ascii_alphabetic() || c == '_' || c == '/'),
            take_while(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '/'),
        )),
        |name: &str| vec![ArcStr::from(name.to_lowercase())],
    )(input)
}

fn suffix(input: &str) -> IResult<&str, Suffix> {
    alt((range, index, repeat))(input)
}

fn integer(input: &str) -> IResult<&str, i64> {
    delimited(
        multispace0,
        map_res(recognize(pair(opt(char('-')), digit1)), |digits: &str| {
            digits.parse::<i64>()
        }),
        multispace0,
    )(input)
}

fn range(input: &str) -> IResult<&str, Suffix> {
    map(
        delimited(
            char('['),
            tuple((
                integer,
                preceded(char(':'), integer),
                opt(preceded(char(':'), integer)),
            )),
            char(']'),
        ),
        |(start, stop, step)| {
            let step = step
                .map(i64::saturating_abs)
                .filter(|step| *step != 0)
                .unwrap_or(1);
            Suffix::Range {
                start,
                stop,
                step: if stop < start { -step } else { step },
            }
        },
    )(input)
}

fn index(input: &str) -> IResult<&str, Suffix> {
    map_res(
        delimited(
            char('['),
            delimited(multispace0, digit1, multispace0),
            char(']'),
        ),
        |digits: &str| digits.parse::<u64>().map(Suffix::Index),
    )(input)
}

fn repeat(input: &str) -> IResult<&str, Suffix> {
    map_res(
        preceded(
            pair(multispace0, char('#')),
            preceded(multispace0, digit1),
        ),
        |digits: &str| digits.parse::<usize>().map(Suffix::Repeat),
    )(input)
}
