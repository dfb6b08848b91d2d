//! Scan chemical formulas (e.g. `C6H12O6`) into element counts and compute formula weights

use indexmap::IndexMap;
use thiserror::Error;

/// Element symbols used by genome scale models for generic or placeholder groups
/// (R groups, unspecified X residues). Metabolites containing them have no physical weight.
pub const NONEXISTENT_ELEMENTS: [&str; 2] = ["R", "X"];

/// Standard atomic weights in g/mol
const ATOMIC_WEIGHTS: &[(&str, f64)] = &[
    ("H", 1.008),
    ("He", 4.002602),
    ("Li", 6.94),
    ("Be", 9.0121831),
    ("B", 10.81),
    ("C", 12.011),
    ("N", 14.007),
    ("O", 15.999),
    ("F", 18.998403163),
    ("Ne", 20.1797),
    ("Na", 22.98976928),
    ("Mg", 24.305),
    ("Al", 26.9815385),
    ("Si", 28.085),
    ("P", 30.973761998),
    ("S", 32.06),
    ("Cl", 35.45),
    ("Ar", 39.948),
    ("K", 39.0983),
    ("Ca", 40.078),
    ("Sc", 44.955908),
    ("Ti", 47.867),
    ("V", 50.9415),
    ("Cr", 51.9961),
    ("Mn", 54.938044),
    ("Fe", 55.845),
    ("Co", 58.933194),
    ("Ni", 58.6934),
    ("Cu", 63.546),
    ("Zn", 65.38),
    ("Ga", 69.723),
    ("Ge", 72.630),
    ("As", 74.921595),
    ("Se", 78.971),
    ("Br", 79.904),
    ("Kr", 83.798),
    ("Rb", 85.4678),
    ("Sr", 87.62),
    ("Y", 88.90584),
    ("Zr", 91.224),
    ("Nb", 92.90637),
    ("Mo", 95.95),
    ("Ru", 101.07),
    ("Rh", 102.90550),
    ("Pd", 106.42),
    ("Ag", 107.8682),
    ("Cd", 112.414),
    ("In", 114.818),
    ("Sn", 118.710),
    ("Sb", 121.760),
    ("Te", 127.60),
    ("I", 126.90447),
    ("Xe", 131.293),
    ("Cs", 132.90545196),
    ("Ba", 137.327),
    ("W", 183.84),
    ("Pt", 195.084),
    ("Au", 196.966569),
    ("Hg", 200.592),
    ("Pb", 207.2),
    ("Bi", 208.98040),
    ("U", 238.02891),
];

/// Look up the standard atomic weight of an element symbol
pub fn atomic_weight(symbol: &str) -> Option<f64> {
    ATOMIC_WEIGHTS
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, w)| *w)
}

/// Element counts of a chemical formula
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    elements: IndexMap<String, f64>,
}

impl Formula {
    /// Parse a formula string into element counts
    ///
    /// Repeated elements are summed, a missing count means 1, and counts may be fractional.
    ///
    /// # Examples
    /// ```rust
    /// use fbars_core::metabolic_model::formula::Formula;
    /// let water = Formula::parse("H2O").unwrap();
    /// assert_eq!(water.count("H"), 2.0);
    /// ```
    pub fn parse(source: &str) -> Result<Formula, FormulaError> {
        let mut scanner = Scanner::new(source);
        let elements = scanner.scan_elements()?;
        Ok(Formula { elements })
    }

    /// Element symbol to count
    pub fn elements(&self) -> &IndexMap<String, f64> {
        &self.elements
    }

    /// Number of atoms of `symbol` in the formula
    pub fn count(&self, symbol: &str) -> f64 {
        self.elements.get(symbol).copied().unwrap_or(0.)
    }

    /// Whether any of the given element symbols appear in the formula
    pub fn contains_any(&self, symbols: &[&str]) -> bool {
        symbols.iter().any(|s| self.elements.contains_key(*s))
    }

    /// Whether the formula includes a placeholder element (see [`NONEXISTENT_ELEMENTS`])
    pub fn is_placeholder(&self) -> bool {
        self.contains_any(&NONEXISTENT_ELEMENTS)
    }

    /// Formula weight in g/mol, `None` if any element has no known atomic weight
    pub fn weight(&self) -> Option<f64> {
        self.elements
            .iter()
            .map(|(symbol, count)| atomic_weight(symbol).map(|w| w * count))
            .sum()
    }
}

struct Scanner {
    source: Vec<char>,
    start: usize,
    current: usize,
}

impl Scanner {
    fn new(source: &str) -> Self {
        Scanner {
            source: source.chars().collect(),
            start: 0,
            current: 0,
        }
    }

    fn scan_elements(&mut self) -> Result<IndexMap<String, f64>, FormulaError> {
        let mut elements: IndexMap<String, f64> = IndexMap::new();
        while !self.is_at_end() {
            self.start = self.current;
            let c = self.advance();
            match c {
                'A'..='Z' => {
                    let symbol = self.read_symbol();
                    let count = self.read_count()?;
                    *elements.entry(symbol).or_insert(0.) += count;
                }
                ' ' | '\t' | '*' => {}
                _ => {
                    return Err(FormulaError::InvalidCharacter {
                        character: c,
                        position: self.start,
                    })
                }
            }
        }
        Ok(elements)
    }

    fn read_symbol(&mut self) -> String {
        while self.peek().is_ascii_lowercase() {
            self.advance();
        }
        self.source[self.start..self.current].iter().collect()
    }

    fn read_count(&mut self) -> Result<f64, FormulaError> {
        let count_start = self.current;
        while self.peek().is_ascii_digit() || self.peek() == '.' {
            self.advance();
        }
        if count_start == self.current {
            return Ok(1.);
        }
        let text: String = self.source[count_start..self.current].iter().collect();
        text.parse::<f64>()
            .map_err(|_| FormulaError::MalformedCount(text.clone()))
    }

    fn advance(&mut self) -> char {
        let char_at_current = self.source[self.current];
        self.current += 1;
        char_at_current
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            return '\0';
        }
        self.source[self.current]
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }
}

/// Errors raised while scanning a chemical formula
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    #[error("Invalid character {character:?} at position {position} of formula")]
    InvalidCharacter { character: char, position: usize },
    #[error("Malformed element count {0:?}")]
    MalformedCount(String),
}
