// src/remote/mod.rs

//! Everything that talks to the collaborator service: wire types, the HTTP
//! client, the backend abstraction used by the runtime, and the background
//! pollers.

pub mod api;
pub mod backend;
pub mod client;
pub mod poller;

pub use api::{
    AllocationRow, CheckReply, DependencyReply, ExecutionStateReply, TaskExport, TaskRow,
};
pub use backend::{RealRemoteBackend, RemoteBackend};
pub use client::RemoteClient;
pub use poller::spawn_pollers;
