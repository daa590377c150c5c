//! Auth-domain identifiers, scope lists, tenant resolution, and token results.

pub mod id;
pub mod scope;
pub mod tenant;
pub mod token;

pub use id::*;
pub use scope::*;
pub use tenant::*;
pub use token::{result::*, secret::*};
