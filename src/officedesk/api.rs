//! # API Facade
//!
//! [`DeskApi`] is the single entry point the terminal client (or any other
//! front end) talks to. It owns the shared [`HttpClient`] and the loaded
//! [`DeskConfig`], and hands out per-entity services and resources already
//! wired with the configured endpoints and options.
//!
//! The facade holds no entity state of its own. Cached collections live in
//! the [`Resource`]s it creates, each bound to the caller's [`ViewScope`].
//!
//! ## Generic Over Transport
//!
//! - Production: `DeskApi<ReqwestTransport>`
//! - Testing: `DeskApi<InMemoryBackend>`

use crate::board::BoardLayout;
use crate::config::DeskConfig;
use crate::entities::EntityKind;
use crate::error::{DeskError, Result};
use crate::filter::FilterSpec;
use crate::http::{HttpClient, Transport};
use crate::resource::{Resource, ResourceOptions, ViewScope};
use crate::service::ResourceService;
use crate::session::Session;
use std::sync::Arc;

pub struct DeskApi<T: Transport> {
    client: Arc<HttpClient<T>>,
    config: DeskConfig,
}

impl<T: Transport> DeskApi<T> {
    pub fn new(client: HttpClient<T>, config: &DeskConfig) -> Self {
        Self {
            client: Arc::new(client),
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &DeskConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        self.client.session()
    }

    pub fn client(&self) -> &HttpClient<T> {
        &self.client
    }

    pub fn service(&self, kind: EntityKind) -> ResourceService<T> {
        ResourceService::new(Arc::clone(&self.client), self.config.endpoints_for(kind))
    }

    pub fn options(&self, kind: EntityKind) -> ResourceOptions {
        self.config.options_for(kind)
    }

    pub fn resource(&self, kind: EntityKind, scope: &ViewScope) -> Resource<T> {
        Resource::new(self.service(kind), self.options(kind), scope)
    }

    pub fn login(&self, token: &str) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(DeskError::Config("token must not be empty".into()));
        }
        self.session().login(token)
    }

    pub fn logout(&self) -> Result<()> {
        self.session().logout()
    }

    pub fn filter_spec(&self, kind: EntityKind) -> FilterSpec {
        kind.filter_spec()
    }

    pub fn board_layout(&self, kind: EntityKind) -> Result<BoardLayout> {
        kind.board()
            .ok_or_else(|| DeskError::Unsupported(format!("{} has no board view", kind)))
    }
}
