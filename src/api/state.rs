//! Shared state passed to all API handlers

use std::sync::Arc;

use crate::notify::AlertDispatcher;
use crate::pipeline::BatchRunner;
use crate::store::DataStore;

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<dyn DataStore>,
    pub runner: Arc<BatchRunner>,
    pub dispatcher: Arc<AlertDispatcher>,
}

impl ApiState {
    pub fn new(
        store: Arc<dyn DataStore>,
        runner: Arc<BatchRunner>,
        dispatcher: Arc<AlertDispatcher>,
    ) -> Self {
        Self {
            store,
            runner,
            dispatcher,
        }
    }
}
