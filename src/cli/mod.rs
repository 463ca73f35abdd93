// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use clap::Parser;
use std::net::{IpAddr, SocketAddr};

/// Image Analysis Node
#[derive(Parser, Debug)]
#[command(name = "image-analysis-node")]
#[command(version)]
#[command(about = "HTTP endpoint for image label and text detection with daily quotas", long_about = None)]
pub struct Cli {
    /// Address to bind the API server to
    #[arg(long, env = "API_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to bind the API server to
    #[arg(long, env = "API_PORT", default_value_t = 8080)]
    pub port: u16,
}

impl Cli {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
