//! Hash collection re-exports, switchable between `std` and `hashbrown`.

#[cfg(feature = "hashbrown")]
pub use hashbrown::HashMap;
#[cfg(not(feature = "hashbrown"))]
pub use std::collections::HashMap;
