pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod publish;
pub mod service;
pub mod sheet;

pub use config::{AppConfig, ReconConfig};
pub use error::{ReconError, Result};
pub use publish::{ReportPublisher, XlsxPublisher};
pub use service::{reconcile, ReconcileOutput, ReconcileService};
