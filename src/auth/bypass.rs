// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Admin quota bypass for callers from the deployment's own account

use axum::http::HeaderMap;
use regex::Regex;
use std::sync::OnceLock;

/// Account id forwarded by the upstream authorizer
pub const CALLER_ACCOUNT_HEADER: &str = "x-caller-account-id";
/// Caller ARN forwarded by the upstream authorizer
pub const CALLER_ARN_HEADER: &str = "x-caller-arn";

fn arn_account_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"arn:aws:(?:iam|sts)::(\d{12}):").expect("static ARN pattern is valid")
    })
}

/// Account id embedded in an IAM/STS ARN
pub fn account_from_arn(arn: &str) -> Option<String> {
    arn_account_regex()
        .captures(arn)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Decides whether an admin request may skip quota enforcement
pub trait BypassPolicy: Send + Sync {
    fn allows_bypass(&self, headers: &HeaderMap) -> bool;
}

/// Bypass only when the caller's account equals this deployment's account
#[derive(Debug, Clone, Default)]
pub struct SameAccountPolicy {
    account_id: Option<String>,
}

impl SameAccountPolicy {
    pub fn new(account_id: Option<String>) -> Self {
        Self { account_id }
    }

    /// Caller account from the explicit header, else parsed from the ARN header
    pub fn caller_account(headers: &HeaderMap) -> Option<String> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        header(CALLER_ACCOUNT_HEADER)
            .map(str::to_string)
            .or_else(|| header(CALLER_ARN_HEADER).and_then(account_from_arn))
    }
}

impl BypassPolicy for SameAccountPolicy {
    fn allows_bypass(&self, headers: &HeaderMap) -> bool {
        match (&self.account_id, Self::caller_account(headers)) {
            (Some(own), Some(caller)) => *own == caller,
            _ => false,
        }
    }
}
