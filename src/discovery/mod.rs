//! Local address discovery.
//!
//! Two independent strategies feed the [`DiscoveryCoordinator`]:
//!
//! - [`prober`]: asks the OS which source address a UDP socket connected
//!   towards a target would use. Cheap, needs no privileges, and reports the
//!   address actually used for outbound traffic.
//! - [`scraper`]: runs the platform's network-configuration tool and
//!   extracts every address it lists, using the rows in [`platform`].
//!
//! Neither strategy reports errors to the caller; a failure only means fewer
//! addresses.

pub mod coordinator;
pub mod platform;
pub mod prober;
pub mod scraper;

pub use coordinator::{DiscoveryCoordinator, DiscoveryReport, Supplement};
pub use platform::{PlatformFamily, PlatformProfile};
pub use prober::{Prober, Resolve, SystemResolver};
pub use scraper::{ConfigScraper, SystemToolRunner, ToolRunner};
