//! Round-robin rotation over the configured clients.

use crate::client_pool::descriptor::{ClientDescriptor, ClientPoolError};
use crate::config::ClientsConfig;

/// Fixed, ordered set of clients handed out in rotation.
///
/// Owned by exactly one consumer, so the cursor is a plain index.
#[derive(Debug)]
pub struct ClientPool {
    clients: Vec<ClientDescriptor>,
    cursor: usize,
}

impl ClientPool {
    /// Create a pool over at least one client.
    pub fn new(clients: Vec<ClientDescriptor>) -> Option<Self> {
        if clients.is_empty() {
            return None;
        }
        Some(Self { clients, cursor: 0 })
    }

    /// Build one client per configured source address, or a single unbound
    /// client when none are configured.
    pub fn from_config(config: &ClientsConfig) -> Result<Self, ClientPoolError> {
        let mut clients = Vec::with_capacity(config.source_addresses.len().max(1));
        if config.source_addresses.is_empty() {
            clients.push(ClientDescriptor::new(None, config)?);
        }
        for address in &config.source_addresses {
            let addr = address
                .parse()
                .map_err(|_| ClientPoolError::InvalidAddress(address.clone()))?;
            clients.push(ClientDescriptor::new(Some(addr), config)?);
        }

        tracing::info!(clients = clients.len(), "Client pool initialized");
        Ok(Self { clients, cursor: 0 })
    }

    /// Return the next client and advance the rotation.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> &ClientDescriptor {
        let index = self.cursor;
        self.cursor = (self.cursor + 1) % self.clients.len();
        &self.clients[index]
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
