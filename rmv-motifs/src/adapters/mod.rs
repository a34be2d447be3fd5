//! Source adapters
//!
//! Each adapter normalizes one native format into a
//! [`MotifCollection`](crate::types::MotifCollection):
//!
//! - [`bgsu_hub`] - BGSU RNA 3D Hub (web, loop-class categories)
//! - [`rfam_api`] - Rfam motif hits (web, family-named categories)
//! - [`bundled`] - offline Atlas and Rfam datasets
//! - [`user_tools`] - FR3D, RNAMotifScan and RNAMotifScanX result files

pub mod bgsu_hub;
pub mod bundled;
pub mod http;
pub mod patterns;
pub mod rfam_api;
pub mod unit_id;
pub mod user_tools;

pub use bgsu_hub::BgsuHubSource;
pub use bundled::BundledSource;
pub use http::WebClient;
pub use rfam_api::RfamApiSource;
pub use user_tools::{PValueFilter, ToolFormat, UserToolSource};
