// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared by commands, readings and cached state.

mod mode;
mod zone;

pub use mode::{LightMode, ZoneMode};
pub use zone::ZoneIndex;
