//! Transaction assembly: resolution, gas, routing, encoding and dispatch

mod codec;
mod gas;
mod resolver;
mod router;
mod sender;
mod types;

pub use codec::{keccak256, public_key_to_address};
pub use gas::{GasEstimator, GasLimits};
pub use resolver::FieldResolver;
pub use router::{route, SigningPath};
pub use sender::TransactionSender;
pub use types::{
    parse_address, ResolvedTransaction, SenderRef, Signature, SignedTransaction,
    TransactionIntent,
};
