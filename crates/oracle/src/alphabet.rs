use std::collections::BTreeMap;
use std::fmt::Display;

use crate::error::{Error, Result};

/// Identifier of a protocol symbol such as `CONNECT` or `OK`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The finite set of protocol symbols together with their byte-level encodings. The mapping is
/// bijective so that bytes observed on an intercepted write can be mapped back to a symbol.
#[derive(Clone, Debug, Default)]
pub struct Alphabet {
    encodings: BTreeMap<Symbol, Vec<u8>>,
    symbols: BTreeMap<Vec<u8>, Symbol>,
}

impl Alphabet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct an alphabet from `(symbol, encoding)` pairs.
    pub fn from_pairs<S, B>(pairs: impl IntoIterator<Item = (S, B)>) -> Result<Self>
    where
        S: Into<Symbol>,
        B: Into<Vec<u8>>,
    {
        let mut alphabet = Self::new();
        for (symbol, encoding) in pairs {
            alphabet.insert(symbol, encoding)?;
        }

        Ok(alphabet)
    }

    /// Insert a symbol, replacing any previous encoding of the same symbol. Fails if the
    /// encoding is empty or already belongs to a different symbol.
    pub fn insert(
        &mut self,
        symbol: impl Into<Symbol>,
        encoding: impl Into<Vec<u8>>,
    ) -> Result<()> {
        let symbol = symbol.into();
        let encoding = encoding.into();

        if encoding.is_empty() {
            return Err(Error::EmptyEncoding(symbol));
        }

        if let Some(existing) = self.symbols.get(&encoding) {
            if *existing != symbol {
                return Err(Error::AmbiguousEncoding {
                    first: existing.clone(),
                    second: symbol,
                });
            }
        }

        if let Some(previous) = self.encodings.insert(symbol.clone(), encoding.clone()) {
            self.symbols.remove(&previous);
        }
        self.symbols.insert(encoding, symbol);

        Ok(())
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.encodings.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.encodings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encodings.is_empty()
    }

    /// Symbols in sorted order
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.encodings.keys()
    }

    pub fn encode(&self, symbol: &Symbol) -> Option<&[u8]> {
        self.encodings.get(symbol).map(Vec::as_slice)
    }

    /// Exact reverse lookup of an encoding.
    pub fn decode(&self, bytes: &[u8]) -> Option<&Symbol> {
        self.symbols.get(bytes)
    }

    /// Returns true if the bytes are a strict prefix of at least one encoding, meaning the
    /// output observed so far may still complete into a symbol.
    pub fn is_partial(&self, bytes: &[u8]) -> bool {
        self.symbols
            .keys()
            .any(|encoding| encoding.len() > bytes.len() && encoding.starts_with(bytes))
    }

    /// Best-effort decoding of output that was cut short or overran a symbol boundary.
    ///
    /// An exact match wins. Otherwise the bytes are accepted as the start of a symbol if exactly
    /// one encoding begins with them. Failing that, the longest encoding that the bytes begin
    /// with is used.
    pub fn recover(&self, bytes: &[u8]) -> Option<&Symbol> {
        if bytes.is_empty() {
            return None;
        }

        if let Some(symbol) = self.decode(bytes) {
            return Some(symbol);
        }

        let mut truncated = self
            .symbols
            .iter()
            .filter(|(encoding, _)| encoding.starts_with(bytes));
        if let (Some((_, symbol)), None) = (truncated.next(), truncated.next()) {
            return Some(symbol);
        }

        self.longest_prefix(bytes)
    }

    /// Symbol with the longest encoding that `bytes` begins with. Used when output runs past
    /// the end of a symbol.
    pub fn longest_prefix(&self, bytes: &[u8]) -> Option<&Symbol> {
        self.symbols
            .iter()
            .filter(|(encoding, _)| bytes.starts_with(encoding))
            .max_by_key(|(encoding, _)| encoding.len())
            .map(|(_, symbol)| symbol)
    }

    /// Confirm every symbol of the word has an encoding.
    pub fn validate_word(&self, word: &[Symbol]) -> Result<()> {
        match word.iter().find(|symbol| !self.contains(symbol)) {
            Some(symbol) => Err(Error::SymbolNotInAlphabet(symbol.clone())),
            None => Ok(()),
        }
    }
}
