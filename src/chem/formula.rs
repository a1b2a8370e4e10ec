//! Chemical formula parser.
//!
//! Accepts element symbols with optional integer or decimal counts, nested
//! `()` / `[]` groups with multipliers, and hydrate parts joined by `·` or
//! `*` with an optional leading multiplier (`CuSO4·5H2O`). Offsets in errors
//! are byte offsets into the caller's string.

use crate::chem::periodic::{self, Element};
use crate::error::DeriveError;

/// Deepest accepted bracket nesting.
pub const MAX_NESTING: usize = 16;

/// Element amounts of a parsed formula, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Composition {
    amounts: Vec<(Element, f64)>,
}

impl Composition {
    /// Elements in order of first appearance.
    pub fn elements(&self) -> impl Iterator<Item = Element> + '_ {
        self.amounts.iter().map(|(el, _)| *el)
    }

    /// Total amount of `symbol`, if present.
    pub fn amount(&self, symbol: &str) -> Option<f64> {
        self.amounts
            .iter()
            .find(|(el, _)| el.symbol == symbol)
            .map(|(_, n)| *n)
    }

    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    fn add(&mut self, element: Element, amount: f64) {
        match self.amounts.iter_mut().find(|(el, _)| *el == element) {
            Some((_, n)) => *n += amount,
            None => self.amounts.push((element, amount)),
        }
    }

    fn merge(&mut self, other: Composition, factor: f64) {
        for (el, n) in other.amounts {
            self.add(el, n * factor);
        }
    }
}

/// Parse a chemical formula such as `Fe2(SO4)3` or `CuSO4·5H2O`.
pub fn parse_formula(input: &str) -> Result<Composition, DeriveError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DeriveError::Empty);
    }
    let base = input.len() - input.trim_start().len();
    let mut parser = Parser {
        chars: trimmed.char_indices().map(|(i, c)| (i + base, c)).collect(),
        pos: 0,
        end: base + trimmed.len(),
        depth: 0,
    };

    let mut composition = Composition::default();
    loop {
        let multiplier = parser.count()?.unwrap_or(1.0);
        let part_start = parser.offset();
        let part = parser.sequence()?;
        if part.is_empty() {
            return Err(parser.unexpected_or(DeriveError::Unexpected {
                found: '·',
                offset: part_start,
            }));
        }
        composition.merge(part, multiplier);

        match parser.peek() {
            None => break,
            Some((_, '·' | '*')) => {
                parser.bump();
            }
            Some((offset, ')' | ']')) => return Err(DeriveError::Unbalanced { offset }),
            Some((offset, found)) => return Err(DeriveError::Unexpected { found, offset }),
        }
    }
    Ok(composition)
}

struct Parser {
    chars: Vec<(usize, char)>,
    pos: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<(usize, char)> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        let next = self.peek();
        if next.is_some() {
            self.pos += 1;
        }
        next
    }

    fn offset(&self) -> usize {
        self.peek().map_or(self.end, |(i, _)| i)
    }

    /// The error for the current character, or `fallback` at end of input.
    fn unexpected_or(&self, fallback: DeriveError) -> DeriveError {
        match self.peek() {
            Some((offset, ')' | ']')) => DeriveError::Unbalanced { offset },
            Some((offset, found)) => DeriveError::Unexpected { found, offset },
            None => fallback,
        }
    }

    /// Parse units until a closing bracket, a hydrate separator, or the end.
    fn sequence(&mut self) -> Result<Composition, DeriveError> {
        let mut composition = Composition::default();
        while let Some((offset, c)) = self.peek() {
            match c {
                'A'..='Z' => {
                    let element = self.element()?;
                    let count = self.count()?.unwrap_or(1.0);
                    composition.add(element, count);
                }
                '(' | '[' => {
                    if self.depth == MAX_NESTING {
                        return Err(DeriveError::TooDeep {
                            limit: MAX_NESTING,
                            offset,
                        });
                    }
                    self.bump();
                    let close = if c == '(' { ')' } else { ']' };
                    self.depth += 1;
                    let inner = self.sequence();
                    self.depth -= 1;
                    let inner = inner?;
                    match self.bump() {
                        Some((_, found)) if found == close && !inner.is_empty() => {}
                        Some((_, found)) if found == close => {
                            return Err(DeriveError::Unexpected { found, offset });
                        }
                        _ => return Err(DeriveError::Unbalanced { offset }),
                    }
                    let count = self.count()?.unwrap_or(1.0);
                    composition.merge(inner, count);
                }
                _ => break,
            }
        }
        Ok(composition)
    }

    fn element(&mut self) -> Result<Element, DeriveError> {
        let Some((offset, first)) = self.bump() else {
            return Err(DeriveError::Empty);
        };
        let mut symbol = String::from(first);
        if let Some((_, c)) = self.peek() {
            if c.is_ascii_lowercase() {
                symbol.push(c);
                self.bump();
            }
        }
        periodic::lookup(&symbol).ok_or(DeriveError::UnknownElement { symbol, offset })
    }

    /// Optional positive count: digits, optionally followed by `.` and digits.
    fn count(&mut self) -> Result<Option<f64>, DeriveError> {
        let offset = self.offset();
        let mut text = String::new();
        while let Some((_, c)) = self.peek().filter(|(_, c)| c.is_ascii_digit()) {
            text.push(c);
            self.bump();
        }
        if text.is_empty() {
            return Ok(None);
        }
        if let Some((_, '.')) = self.peek() {
            self.bump();
            text.push('.');
            let before = text.len();
            while let Some((_, c)) = self.peek().filter(|(_, c)| c.is_ascii_digit()) {
                text.push(c);
                self.bump();
            }
            if text.len() == before {
                return Err(DeriveError::BadCount { count: text, offset });
            }
        }
        match text.parse::<f64>() {
            Ok(n) if n > 0.0 => Ok(Some(n)),
            _ => Err(DeriveError::BadCount { count: text, offset }),
        }
    }
}
