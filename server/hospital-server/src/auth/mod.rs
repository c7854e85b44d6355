pub mod tokens;

pub use tokens::{TokenClaims, TokenPair, TokenService, TokenType};
