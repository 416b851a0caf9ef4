//! Monotonic request tokens.
//!
//! Every async dispatch captures the current [`Token`]; on completion the
//! result is applied only if the token is still current. Superseded work is
//! not aborted, its result is dropped on arrival.

/// A captured generation value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(u64);

impl Token {
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Monotonic counter issuing [`Token`]s.
#[derive(Debug, Default)]
pub struct Generation {
    current: u64,
}

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bump the counter and return the new token.
    pub fn advance(&mut self) -> Token {
        self.current += 1;
        Token(self.current)
    }

    pub fn current(&self) -> Token {
        Token(self.current)
    }

    pub fn is_current(&self, token: Token) -> bool {
        token.0 == self.current
    }
}
