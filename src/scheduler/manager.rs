//! 调度器注册表：按类别取调度器

use std::collections::HashMap;
use std::sync::Arc;

use crate::scheduler::types::SchedulerKind;
use crate::scheduler::{Scheduler, SchedulerError};

#[derive(Clone, Default)]
pub struct SchedulerManager {
    schedulers: HashMap<SchedulerKind, Arc<dyn Scheduler>>,
}

impl SchedulerManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: SchedulerKind, scheduler: Arc<dyn Scheduler>) {
        self.schedulers.insert(kind, scheduler);
    }

    pub fn with(mut self, kind: SchedulerKind, scheduler: Arc<dyn Scheduler>) -> Self {
        self.register(kind, scheduler);
        self
    }

    pub fn get_scheduler(&self, kind: SchedulerKind) -> Result<Arc<dyn Scheduler>, SchedulerError> {
        self.schedulers
            .get(&kind)
            .cloned()
            .ok_or(SchedulerError::Unavailable(kind))
    }
}
