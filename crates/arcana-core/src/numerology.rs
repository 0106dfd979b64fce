//! Pythagorean numerology calculator. Pure, deterministic, no I/O.
//!
//! Letters map to 1–9 on the repeating table (A,J,S→1 … I,R→9). Reduction
//! sums decimal digits until the value is a single digit, except the master
//! numbers 11 and 22, which are preserved as soon as they appear.

use serde::{Deserialize, Serialize};

/// Derived numbers for one (name, date-of-birth) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumerologyProfile {
    pub life_path: u32,
    pub expression: u32,
    pub personality: u32,
    pub soul_urge: u32,
    pub maturity: u32,
    /// Four pinnacle numbers from the birth-date components.
    pub pinnacles: [u32; 4],
    /// Four challenge numbers (always single-digit).
    pub challenges: [u32; 4],
}

/// Digit-sum reduction preserving master numbers. `reduce(0) = 0`:
/// the loop condition is false for 0 and it returns unchanged.
pub fn reduce(mut n: u32) -> u32 {
    while n > 9 {
        if n == 11 || n == 22 {
            return n;
        }
        n = digit_sum(n);
    }
    n
}

/// Reduction to a strict single digit; masters are not exempt. Used for
/// challenge numbers, which by convention are never master numbers.
fn reduce_single(mut n: u32) -> u32 {
    while n > 9 {
        n = digit_sum(n);
    }
    n
}

fn digit_sum(mut n: u32) -> u32 {
    let mut sum = 0;
    while n > 0 {
        sum += n % 10;
        n /= 10;
    }
    sum
}

/// Letter value on the repeating 1–9 table; non A–Z characters are 0.
pub fn letter_value(c: char) -> u32 {
    let c = c.to_ascii_uppercase();
    if c.is_ascii_uppercase() {
        (c as u32 - 'A' as u32) % 9 + 1
    } else {
        0
    }
}

fn is_vowel(c: char) -> bool {
    matches!(c.to_ascii_uppercase(), 'A' | 'E' | 'I' | 'O' | 'U' | 'Y')
}

fn name_sum<F: Fn(char) -> bool>(name: &str, keep: F) -> u32 {
    name.chars()
        .filter(|c| c.is_ascii_alphabetic() && keep(*c))
        .map(letter_value)
        .sum()
}

/// Life path: reduce the sum of every digit of the date-of-birth, ignoring
/// non-digit characters.
pub fn life_path(date_of_birth: &str) -> u32 {
    reduce(date_of_birth.chars().filter_map(|c| c.to_digit(10)).sum())
}

/// (year, month, day) pulled from the first three digit runs of an ISO-ish
/// date string. Missing components come back as 0.
fn date_components(date_of_birth: &str) -> (u32, u32, u32) {
    let mut parts = date_of_birth
        .split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<u32>().ok());
    let year = parts.next().unwrap_or(0);
    let month = parts.next().unwrap_or(0);
    let day = parts.next().unwrap_or(0);
    (year, month, day)
}

/// Full profile for (fullName, dateOfBirth). Empty name => the name-derived
/// numbers are all `reduce(0) = 0`.
pub fn profile(full_name: &str, date_of_birth: &str) -> NumerologyProfile {
    let lp = life_path(date_of_birth);
    let expression = reduce(name_sum(full_name, |_| true));
    let soul_urge = reduce(name_sum(full_name, is_vowel));
    let personality = reduce(name_sum(full_name, |c| !is_vowel(c)));
    let maturity = reduce(lp + expression);

    let (year, month, day) = date_components(date_of_birth);
    let (ry, rm, rd) = (reduce(year), reduce(month), reduce(day));
    let p1 = reduce(rm + rd);
    let p2 = reduce(rd + ry);
    let p3 = reduce(p1 + p2);
    let p4 = reduce(rm + ry);

    let c1 = reduce_single(rm.abs_diff(rd));
    let c2 = reduce_single(rd.abs_diff(ry));
    let c3 = c1.abs_diff(c2);
    let c4 = reduce_single(rm.abs_diff(ry));

    NumerologyProfile {
        life_path: lp,
        expression,
        personality,
        soul_urge,
        maturity,
        pinnacles: [p1, p2, p3, p4],
        challenges: [c1, c2, c3, c4],
    }
}
