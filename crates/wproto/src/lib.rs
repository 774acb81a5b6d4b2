// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Wire contract with the remote scheduler.
//!
//! This crate wraps the `tonic`/`prost`-generated `Engine` client so the
//! rest of the workspace never touches raw generated types directly: it
//! only sees the typed wrappers and conversions in [`convert`] plus the
//! [`AuthInterceptor`] that stamps authorization headers on every call.

pub mod convert;
pub mod interceptor;

pub use interceptor::AuthInterceptor;

/// Generated protobuf/gRPC types and the `Engine` client stub.
pub mod pb {
    tonic::include_proto!("sath.engine.v1");
}

pub use pb::engine_client::EngineClient;
pub use pb::{
    CommandRequest, CommandResponse, CommandStatusWire, ExecNotificationRequest,
    ExecNotificationResponse, FileRefWire, GetNewJobRequest, GpuOptionWire, HandShakeRequest,
    HandShakeResponse, ImageSpecWire, JobGetResponse, JobMetadataWire, LoginRequest,
    LoginResponse, OutputResultWire, RequestSpecWire, ResourceFileWire, SystemInfo,
};
