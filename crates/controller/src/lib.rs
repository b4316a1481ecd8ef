//! LiveCoder Pipeline Controller
//!
//! Orchestrates the generation-render-capture-evaluate loop for LLM-built UI
//! components across two backend services:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  PipelineController                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  submit(requirement)                                         │
//! │    ├── gate: non-empty + generation backend reachable        │
//! │    ├── get_screen_test_cases  ──► TestCaseStore.add_many     │
//! │    ├── snapshot checklist (post-append concatenation)        │
//! │    ├── get_react_code         ──► extract fenced block       │
//! │    ├── write-file             ──► artifact store             │
//! │    ├── remount (flip view off/on, await mount signal)        │
//! │    ├── capture                ──► save-screenshot            │
//! │    └── evaluate_image_with_prompt(snapshot, stored path)     │
//! ├──────────────────────────────────────────────────────────────┤
//! │  HealthMonitor: polls both backends, one retry timer per     │
//! │  service, gates submission                                   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The checklist text used for evaluation is always the snapshot taken when
//! code generation started, never a live read of the store.

pub mod artifact;
pub mod config;
pub mod extract;
pub mod health;
pub mod pipeline;
pub mod services;
pub mod store;
pub mod view;

pub use config::ControllerConfig;
pub use health::HealthMonitor;
pub use pipeline::PipelineController;
pub use store::TestCaseStore;

pub use livecoder_common::{Error, Result};
