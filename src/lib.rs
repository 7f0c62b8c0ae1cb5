// Licensed under the Apache-2.0 license

//! Queue-based I2C master driver for TM4C123-class microcontrollers.

// No panicking shortcuts in firmware builds
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::indexing_slicing))]
#![cfg_attr(not(test), warn(clippy::expect_used))]
#![cfg_attr(not(test), no_std)]
pub mod common;
pub mod i2c;
