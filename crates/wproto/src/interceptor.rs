// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralizes the header decoration every outgoing call needs — every
//! outgoing call carries `authorization` and `version` headers — instead of
//! repeating it at each call site in `wk-adapters`.

use tonic::metadata::MetadataValue;
use tonic::service::Interceptor;
use tonic::{Request, Status};

/// Stamps `authorization` and `version` metadata on every request, plus any
/// caller-supplied extra key/value pairs.
#[derive(Clone)]
pub struct AuthInterceptor {
    token: String,
    daemon_version: String,
    extra: Vec<(String, String)>,
}

impl AuthInterceptor {
    pub fn new(token: impl Into<String>, daemon_version: impl Into<String>) -> Self {
        Self { token: token.into(), daemon_version: daemon_version.into(), extra: Vec::new() }
    }

    /// Returns a copy carrying an additional header, for one-off calls that
    /// need more than authorization/version (e.g. `NotifyExecStatus`'s
    /// `id = <jobId>` header).
    pub fn with_extra(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut clone = self.clone();
        clone.extra.push((key.into(), value.into()));
        clone
    }
}

impl Interceptor for AuthInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        let metadata = request.metadata_mut();

        let token: MetadataValue<_> = self
            .token
            .parse()
            .map_err(|_| Status::invalid_argument("non-ascii auth token"))?;
        metadata.insert("authorization", token);

        let version: MetadataValue<_> = self
            .daemon_version
            .parse()
            .map_err(|_| Status::invalid_argument("non-ascii daemon version"))?;
        metadata.insert("version", version);

        for (key, value) in &self.extra {
            let name = tonic::metadata::MetadataKey::from_bytes(key.as_bytes())
                .map_err(|_| Status::invalid_argument("invalid header name"))?;
            let value: MetadataValue<_> =
                value.parse().map_err(|_| Status::invalid_argument("non-ascii header value"))?;
            metadata.insert(name, value);
        }

        Ok(request)
    }
}
