//! # taskflow
//!
//! Task, project and client management with search, filtering, sorting and
//! tagging. The library holds the record types, a generic CRUD layer over an
//! in-memory or remote record store, and the page controllers the `taskflow`
//! binary drives.
//!
//! ## Layers
//!
//! - **Records** ([`task`], [`category`], [`client`], [`project`]): plain data
//!   with a draft type for creation and a patch type for partial updates.
//! - **Stores** ([`store`], [`remote`]): [`store::MemoryStore`] owns its records
//!   in process; [`remote::RemoteStore`] maps the same operations onto a
//!   tabular record API reached through a [`remote::RecordsClient`].
//! - **Services** ([`service`]): one generic [`service::EntityService`] per
//!   entity. Failures become empty results plus a [`notice`].
//! - **Pages** ([`view`], [`form`], [`page`]): derived lists, entry forms and
//!   the controllers that keep a page's copy of the data in step.
//!
//! ## Quick Start
//!
//! ```bash
//! # Browse the sample data
//! taskflow task list --sort priority
//!
//! # Keep changes between runs
//! taskflow --data ~/.taskflow.json task quick Call the plumber
//! taskflow --data ~/.taskflow.json task toggle 7
//!
//! # Clients and projects
//! taskflow client list --tag vip
//! taskflow project add "Mobile App" --tags "mobile, design"
//! ```
//!
//! Without `--data` every run starts from the built-in sample data and
//! nothing is written.

pub mod backend;
pub mod category;
pub mod cli;
pub mod client;
pub mod cmd;
pub mod config;
pub mod error;
pub mod fields;
pub mod fixtures;
pub mod form;
pub mod notice;
pub mod page;
pub mod project;
pub mod record;
pub mod remote;
pub mod service;
pub mod store;
pub mod task;
pub mod view;
