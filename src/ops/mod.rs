// SPDX-License-Identifier: Apache-2.0 OR MIT
//! The six archive workflows. Each one announces what it is about to do on
//! the output sink, does it, and returns a typed failure if it cannot.

pub mod edit;
pub mod list;
pub mod pack;
pub mod pack_or_add;
pub mod unpack;
