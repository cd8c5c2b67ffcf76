//! GroupTrack Core - Domain logic and membership rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `MemberId`, `GroupTag`, `Group`, `Snapshot`, `MembershipIndex`
//! - **Membership engine** - `MembershipEngine`, the diff and grace-period state machine
//! - **Port definitions** - Traits for adapters: `IIndexStore`, `INotifier`
//! - **Configuration** - YAML-backed `Config` with validation and a builder
//!
//! # Architecture
//!
//! The domain module contains pure data types and validation. Ports define
//! trait interfaces that adapter crates implement. The engine mutates the
//! membership indexes through the store port and reports what happened as
//! a [`engine::Transition`]; it never sleeps and never delivers notifications
//! itself.

pub mod config;
pub mod domain;
pub mod engine;
pub mod ports;
