//! # Flowscope - Topology analytics engine for traffic-flow networks
//!
//! This library models a directed network of traffic-processing nodes,
//! aggregates per-edge flow samples into fixed windows, and derives
//! path-level analytics an operator can act on.
//!
//! ## Overview
//!
//! Flowscope keeps a single authoritative topology (nodes, directed
//! links, boundary groups) behind a command console. Flow samples are
//! collected per window, collapsed into per-edge aggregates, and fed to
//! analyzers that classify end-to-end path health, surface boundary
//! crossings, and flag capacity bottlenecks.
//!
//! ## Key Features
//!
//! - **Typed topology**: Source/Ingress/Service/Sink nodes with
//!   capacity and processing attributes, directed links, named
//!   boundary groups
//! - **Windowed flow metrics**: peak-rate, summed-latency, summed-error
//!   aggregation per edge, replaced wholesale each window
//! - **Path analytics**: per source/sink pair rate, latency, drop rate,
//!   and a three-tier health classification
//! - **Structural analysis**: connectivity matrix, boundary-crossing
//!   counts, utilization-based bottleneck detection
//! - **Operator console**: line-oriented commands with an echo-first
//!   transcript, plus poll-driven command scripts with delays
//! - **Reproducible**: seeded traffic generation for deterministic runs
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - `topology`: node, link, and boundary-group model and its mutations
//! - `flow`: flow samples, windows, and per-edge aggregates
//! - `analysis`: path statistics, health classification, structure
//!   reports, and report generation
//! - `console`: command grammar, interpreter, script runner, sessions
//! - `sim`: seeded synthetic traffic generation
//! - `config`: YAML topology documents and integrity checks
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use flowscope::console::Session;
//!
//! let mut session = Session::new(42);
//! session.execute_line("node add edge Ingress capacity=250");
//! session.execute_line("node add app Service processing=2.5");
//! session.execute_line("node add store Sink");
//! session.execute_line("link add edge app");
//! session.execute_line("link add app store");
//! session.execute_line("tick 5");
//! session.execute_line("paths critical");
//! for line in session.transcript().lines() {
//!     println!("{}", line);
//! }
//! ```
//!
//! ## Topology Document Format
//!
//! Topologies load from YAML documents:
//!
//! ```yaml
//! nodes:
//!   - id: edge
//!     kind: Ingress
//!     capacity: 250
//!   - id: app
//!     kind: Service
//!     processing: 2.5
//!   - id: store
//!     kind: Sink
//! links:
//!   - from: edge
//!     to: app
//!   - from: app
//!     to: store
//! groups:
//!   - name: frontend
//!     members: [edge]
//! simulation:
//!   tick_interval: 1s
//!   seed: 42
//! ```
//!
//! ## Error Handling
//!
//! Model and command failures carry typed errors (`thiserror`) whose
//! display strings appear verbatim in console transcripts. Filesystem
//! and startup paths use `color_eyre` for contextual error reports.

pub mod analysis;
pub mod config;
pub mod console;
pub mod flow;
pub mod sim;
pub mod topology;

pub use analysis::report::AnalyticsReport;
pub use console::Session;
pub use flow::{EdgeMetrics, FlowSample, FlowWindow};
pub use topology::TopologyModel;
