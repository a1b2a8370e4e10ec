//! Periodic table lookup: symbol → atomic number, period, group.
//!
//! Lanthanides and actinides are reported as group 3.

/// One element of the periodic table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element {
    pub symbol: &'static str,
    pub number: u8,
    pub period: u8,
    pub group: u8,
}

// (symbol, period, group), indexed by atomic number - 1.
const TABLE: [(&str, u8, u8); 118] = [
    ("H", 1, 1), ("He", 1, 18),
    ("Li", 2, 1), ("Be", 2, 2), ("B", 2, 13), ("C", 2, 14),
    ("N", 2, 15), ("O", 2, 16), ("F", 2, 17), ("Ne", 2, 18),
    ("Na", 3, 1), ("Mg", 3, 2), ("Al", 3, 13), ("Si", 3, 14),
    ("P", 3, 15), ("S", 3, 16), ("Cl", 3, 17), ("Ar", 3, 18),
    ("K", 4, 1), ("Ca", 4, 2), ("Sc", 4, 3), ("Ti", 4, 4), ("V", 4, 5),
    ("Cr", 4, 6), ("Mn", 4, 7), ("Fe", 4, 8), ("Co", 4, 9), ("Ni", 4, 10),
    ("Cu", 4, 11), ("Zn", 4, 12), ("Ga", 4, 13), ("Ge", 4, 14), ("As", 4, 15),
    ("Se", 4, 16), ("Br", 4, 17), ("Kr", 4, 18),
    ("Rb", 5, 1), ("Sr", 5, 2), ("Y", 5, 3), ("Zr", 5, 4), ("Nb", 5, 5),
    ("Mo", 5, 6), ("Tc", 5, 7), ("Ru", 5, 8), ("Rh", 5, 9), ("Pd", 5, 10),
    ("Ag", 5, 11), ("Cd", 5, 12), ("In", 5, 13), ("Sn", 5, 14), ("Sb", 5, 15),
    ("Te", 5, 16), ("I", 5, 17), ("Xe", 5, 18),
    ("Cs", 6, 1), ("Ba", 6, 2), ("La", 6, 3),
    ("Ce", 6, 3), ("Pr", 6, 3), ("Nd", 6, 3), ("Pm", 6, 3), ("Sm", 6, 3),
    ("Eu", 6, 3), ("Gd", 6, 3), ("Tb", 6, 3), ("Dy", 6, 3), ("Ho", 6, 3),
    ("Er", 6, 3), ("Tm", 6, 3), ("Yb", 6, 3), ("Lu", 6, 3),
    ("Hf", 6, 4), ("Ta", 6, 5), ("W", 6, 6), ("Re", 6, 7), ("Os", 6, 8),
    ("Ir", 6, 9), ("Pt", 6, 10), ("Au", 6, 11), ("Hg", 6, 12), ("Tl", 6, 13),
    ("Pb", 6, 14), ("Bi", 6, 15), ("Po", 6, 16), ("At", 6, 17), ("Rn", 6, 18),
    ("Fr", 7, 1), ("Ra", 7, 2), ("Ac", 7, 3),
    ("Th", 7, 3), ("Pa", 7, 3), ("U", 7, 3), ("Np", 7, 3), ("Pu", 7, 3),
    ("Am", 7, 3), ("Cm", 7, 3), ("Bk", 7, 3), ("Cf", 7, 3), ("Es", 7, 3),
    ("Fm", 7, 3), ("Md", 7, 3), ("No", 7, 3), ("Lr", 7, 3),
    ("Rf", 7, 4), ("Db", 7, 5), ("Sg", 7, 6), ("Bh", 7, 7), ("Hs", 7, 8),
    ("Mt", 7, 9), ("Ds", 7, 10), ("Rg", 7, 11), ("Cn", 7, 12), ("Nh", 7, 13),
    ("Fl", 7, 14), ("Mc", 7, 15), ("Lv", 7, 16), ("Ts", 7, 17), ("Og", 7, 18),
];

/// Look up an element by its exact (case-sensitive) symbol.
pub fn lookup(symbol: &str) -> Option<Element> {
    TABLE
        .iter()
        .position(|(s, _, _)| *s == symbol)
        .map(|idx| element(idx))
}

/// Look up an element by atomic number.
pub fn by_number(number: u8) -> Option<Element> {
    let idx = usize::from(number).checked_sub(1)?;
    (idx < TABLE.len()).then(|| element(idx))
}

fn element(idx: usize) -> Element {
    let (symbol, period, group) = TABLE[idx];
    Element {
        symbol,
        number: idx as u8 + 1,
        period,
        group,
    }
}
