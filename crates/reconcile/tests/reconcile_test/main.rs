//! Integration tests for fdsync-reconcile.
//!
//! Every flow runs end-to-end against the in-memory store; no AWS
//! credentials are needed.

mod consistency;
mod create;
mod delete;
mod read_list;
mod support;
mod update;
