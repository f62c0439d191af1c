use std::sync::Arc;

use cherga_core::{
    sequence::{CounterStore, RetryPolicy, SequenceCounter},
    Config, DispatchService, DisplayService, IssuanceService, LifecycleService, QueueContext,
};

/// Shared application state
pub struct AppState {
    issuance: IssuanceService,
    dispatch: DispatchService,
    lifecycle: LifecycleService,
    display: DisplayService,
}

impl AppState {
    pub fn new(config: &Config, ctx: QueueContext, counters: Arc<dyn CounterStore>) -> Self {
        let counter = SequenceCounter::new(counters, RetryPolicy::from(&config.sequence));
        Self {
            issuance: IssuanceService::new(ctx.clone(), counter, config.queue.ticket_prefix.clone()),
            dispatch: DispatchService::new(ctx.clone(), &config.dispatch),
            lifecycle: LifecycleService::new(ctx.clone()),
            display: DisplayService::new(ctx, &config.display),
        }
    }

    pub fn issuance(&self) -> &IssuanceService {
        &self.issuance
    }

    pub fn dispatch(&self) -> &DispatchService {
        &self.dispatch
    }

    pub fn lifecycle(&self) -> &LifecycleService {
        &self.lifecycle
    }

    pub fn display(&self) -> &DisplayService {
        &self.display
    }
}
