use std::sync::Arc;

use guildhall_core::forum::PostRepository;
use guildhall_core::rate_limit::AdmissionController;
use guildhall_core::users::UserDirectory;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind an `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Admission controller shared by every limiter layer.
    pub limiter: AdmissionController,
    /// Account lookup for login.
    pub users: Arc<dyn UserDirectory>,
    /// Post and reply storage.
    pub posts: Arc<dyn PostRepository>,
}
