//! Cryptographic primitives for ballot encryption and token integrity

pub mod ballot_cipher;
pub mod digest;
pub mod hash_registry;
pub mod hex_codec;
pub mod random;
pub mod voting_token;

pub use crate::types::{BallotHash, ContentHash, TokenHash};

pub use ballot_cipher::{BallotCipher, EncryptionResult};
pub use digest::ContentDigest;
pub use hash_registry::HashRegistry;
pub use hex_codec::HexCodec;
pub use random::{OsRandom, RandomSource};
pub use voting_token::{IssuedToken, TokenService, VotingToken};
