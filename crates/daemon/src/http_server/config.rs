use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub struct Config {
    // Listen address
    pub listen_addr: SocketAddr,
    // log level for http tracing
    pub log_level: tracing::Level,
    // Largest accepted disclosure body, in bytes
    pub max_disclosure_bytes: usize,
}

impl Config {
    pub fn new(listen_addr: SocketAddr, max_disclosure_bytes: usize) -> Self {
        tracing::info!(
            "Creating HTTP server Config: listen_addr={}, max_disclosure_bytes={}",
            listen_addr,
            max_disclosure_bytes
        );
        Self {
            listen_addr,
            log_level: tracing::Level::INFO,
            max_disclosure_bytes,
        }
    }
}
