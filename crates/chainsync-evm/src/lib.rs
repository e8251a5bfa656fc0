//! chainsync-evm — JSON-RPC ledger client, Gravity registry decoder, and builder.

pub mod builder;
pub mod fetcher;
pub mod gravatar;

pub use builder::SyncBuilder;
pub use fetcher::JsonRpcLedger;
pub use gravatar::GravatarDecoder;
