//! Node key pairs for the `admin` commands.

pub mod keypair;

pub use keypair::*;
