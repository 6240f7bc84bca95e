use axum::extract::FromRef;
use rand::rngs::StdRng;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::soil::{SampleIdGenerator, SoilAnalyzer};
use crate::soil_store::SoilStore;

use super::ServerConfig;

pub type GuardedSoilStore = Arc<dyn SoilStore>;
pub type GuardedRng = Arc<Mutex<StdRng>>;
pub type GuardedSampleIds = Arc<dyn SampleIdGenerator>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub soil_store: GuardedSoilStore,
    pub analyzer: SoilAnalyzer,
    pub rng: GuardedRng,
    pub sample_ids: GuardedSampleIds,
    pub hash: String,
}

impl FromRef<ServerState> for GuardedSoilStore {
    fn from_ref(input: &ServerState) -> Self {
        input.soil_store.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for SoilAnalyzer {
    fn from_ref(input: &ServerState) -> Self {
        input.analyzer
    }
}
