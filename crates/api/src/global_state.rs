use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

use promptdraw_clients::PostgresClient;
use promptdraw_common::{EnvVars, ModuleClient};
use promptdraw_runtime::store::{DrawStore, PgDrawStore};
use promptdraw_runtime::{DrawCompleted, DrawEngine, DrawEngineEnv, DrawEvents};

pub struct GlobalState<S: DrawStore = PgDrawStore> {
    pub engine: Arc<DrawEngine<S>>,
}

impl<S: DrawStore> Clone for GlobalState<S> {
    fn clone(&self) -> Self {
        Self { engine: self.engine.clone() }
    }
}

impl<S: DrawStore> GlobalState<S> {
    pub fn from_engine(engine: DrawEngine<S>) -> Self {
        Self { engine: Arc::new(engine) }
    }
}

impl GlobalState<PgDrawStore> {
    pub async fn new() -> Result<(Self, mpsc::Receiver<DrawCompleted>)> {
        let db = PostgresClient::setup_connection().await;
        let env = DrawEngineEnv::load();

        let store = Arc::new(PgDrawStore::new(db.get_client().as_ref().clone()));
        let (events, draw_events_rx) = DrawEvents::channel(env.event_buffer);

        let engine = DrawEngine::new(store, &env, events);
        let tiers = engine.tiers().await?;
        if tiers.is_empty() {
            tracing::warn!("[GlobalState] no rarity tiers configured, draws will fail until tiers are added");
        }

        Ok((Self::from_engine(engine), draw_events_rx))
    }
}
