// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Status payload decoding.
//!
//! The controller publishes a single text line on `farm/<device>/status`
//! summarising every zone, for example:
//!
//! ```text
//! S1=1830(M1200..X2000) Z1=OFF | S2=1950(M1200..X2000) Z2=ON | PUMP=AUTO
//! ```
//!
//! [`decode`] turns the zone segments into [`ZoneReading`]s. Device-level
//! flags such as the pump or light state travel in the same line but are not
//! parsed here; they remain available verbatim through
//! [`MessageReceived`](crate::event::MessageReceived).

mod reading;
mod status_decoder;

pub use reading::ZoneReading;
pub use status_decoder::{Scan, decode, scan};
