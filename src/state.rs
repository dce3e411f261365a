use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tokio::sync::broadcast;

use crate::config::AppConfig;
use crate::models::BookingEvent;
use crate::services::scheduling::LifecycleManager;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub lifecycle: LifecycleManager,
    pub events_tx: broadcast::Sender<BookingEvent>,
}
