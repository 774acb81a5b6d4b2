// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection (C3): the authenticated channel to the remote scheduler.

use std::sync::Arc;

use parking_lot::RwLock;
use tonic::service::interceptor::InterceptedService;
use tonic::transport::{Channel, Endpoint};
use tonic::Request;
use tracing::{info, warn};

use wk_core::User;
use wk_proto::{AuthInterceptor, EngineClient, HandShakeRequest, LoginRequest};
use wk_storage::CredentialStore;

use crate::error::AdapterError;

const DAEMON_VERSION: &str = env!("CARGO_PKG_VERSION");

type Client = EngineClient<InterceptedService<Channel, AuthInterceptor>>;

/// State mutated by `Login`/`Logout`/handshake re-validation — guarded by a
/// single lock since the Connection is the sole writer.
struct AuthState {
    device_token: String,
    device_id: wk_core::DeviceId,
    user: Option<User>,
}

/// Owns the gRPC channel to the remote scheduler and the credential state
/// layered on top of it.
pub struct Connection {
    channel: Channel,
    store: Arc<CredentialStore>,
    auth: RwLock<AuthState>,
}

impl Connection {
    /// Opens a channel to `addr`, loads any stored device token, performs
    /// `HandShake`, and opportunistically re-validates a stored user token.
    /// A failed user-token re-validation degrades silently to device-only
    /// auth rather than failing construction.
    pub async fn connect(
        addr: impl Into<String>,
        tls: bool,
        store: Arc<CredentialStore>,
    ) -> Result<Self, AdapterError> {
        let addr = addr.into();
        let mut endpoint = Endpoint::from_shared(addr.clone()).map_err(|e| AdapterError::InvalidAddress {
            addr,
            reason: e.to_string(),
        })?;
        if tls {
            endpoint = endpoint
                .tls_config(tonic::transport::ClientTlsConfig::new().with_native_roots())
                .map_err(AdapterError::Transport)?;
        }
        let channel = endpoint.connect().await?;

        let stored_device_token = store.device_token()?;
        let bootstrap_interceptor =
            AuthInterceptor::new(stored_device_token.clone().unwrap_or_default(), DAEMON_VERSION);
        let mut client = EngineClient::with_interceptor(channel.clone(), bootstrap_interceptor);

        let system_info = crate::system_info::collect();
        let response = client
            .hand_shake(Request::new(HandShakeRequest { system_info: Some(system_info) }))
            .await?
            .into_inner();

        store.set_device_token(&response.token)?;
        info!(device_id = %response.device_id, "handshake complete");

        let mut auth = AuthState {
            device_token: response.token,
            device_id: wk_core::DeviceId::from_string(&response.device_id),
            user: None,
        };

        if let Some(user_token) = store.user_token()? {
            if !user_token.is_empty() {
                let interceptor = AuthInterceptor::new(user_token, DAEMON_VERSION);
                let mut probe = EngineClient::with_interceptor(channel.clone(), interceptor);
                match probe
                    .login(Request::new(LoginRequest { account: String::new(), password: String::new() }))
                    .await
                {
                    Ok(resp) => {
                        let resp = resp.into_inner();
                        auth.user = Some(User::new(resp.user_id, resp.user_name, resp.user_email));
                    }
                    Err(e) => {
                        warn!(error = %e, "stored user token failed re-validation, degrading to device-only auth");
                    }
                }
            }
        }

        Ok(Self { channel, store, auth: RwLock::new(auth) })
    }

    /// A user token, when one is on file, takes precedence over the device
    /// token: user-authenticated calls act on behalf of the user.
    fn interceptor(&self) -> AuthInterceptor {
        match self.store.user_token().ok().flatten().filter(|t| !t.is_empty()) {
            Some(user_token) => AuthInterceptor::new(user_token, DAEMON_VERSION),
            None => AuthInterceptor::new(self.auth.read().device_token.clone(), DAEMON_VERSION),
        }
    }

    /// Builds a client carrying the current authorization + version headers,
    /// for callers (C5/C7/C8) that need the raw streaming RPCs.
    pub fn client(&self) -> Client {
        EngineClient::with_interceptor(self.channel.clone(), self.interceptor())
    }

    /// Client decorated with an extra `id = <jobId>` header, used by
    /// `NotifyExecStatus`.
    pub fn client_for_job(&self, job_id: wk_core::JobId) -> Client {
        let interceptor = self.interceptor().with_extra("id", job_id.to_string());
        EngineClient::with_interceptor(self.channel.clone(), interceptor)
    }

    pub fn device_id(&self) -> wk_core::DeviceId {
        self.auth.read().device_id
    }

    pub fn current_user(&self) -> Option<User> {
        self.auth.read().user.clone()
    }

    pub async fn login(&self, account: &str, password: &str) -> Result<User, AdapterError> {
        let mut client = self.client();
        let response = client
            .login(Request::new(LoginRequest {
                account: account.to_string(),
                password: password.to_string(),
            }))
            .await?
            .into_inner();

        self.store.set_user_token(&response.token)?;
        let user = User::new(response.user_id, response.user_name, response.user_email);
        self.auth.write().user = Some(user.clone());
        Ok(user)
    }

    pub fn logout(&self) -> Result<(), AdapterError> {
        self.store.clear_user_token()?;
        self.auth.write().user = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daemon_version_is_nonempty() {
        assert!(!DAEMON_VERSION.is_empty());
    }
}
