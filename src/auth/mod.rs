// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Caller identity and the admin bypass check

pub mod bypass;
pub mod subject;

pub use bypass::{account_from_arn, BypassPolicy, SameAccountPolicy};
pub use subject::{derive_subject, source_address, CLIENT_ID_HEADER};
