#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Element symbol, 1-2 letters. Case is normalized at the codec boundary;
    /// symbols the codec does not recognize fall back to carbon on encode.
    pub symbol: String,
    pub position: [f64; 3],
    /// Formal charge. Kept in the model, not transmitted by any wire version.
    pub charge: i8,
}

impl Atom {
    pub fn new(symbol: impl Into<String>, position: [f64; 3]) -> Self {
        Self {
            symbol: symbol.into(),
            position,
            charge: 0,
        }
    }
}
