//! XD Connects: flat JSON feed of PascalCase item records downloaded from
//! pre-signed feed URLs. One feed record is one sellable item; the normalizer
//! synthesizes the canonical variant from the item itself.

pub mod client;
pub mod feed;
pub mod normalize;

pub use client::XdConnectsClient;
