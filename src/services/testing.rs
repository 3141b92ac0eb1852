//! Общие заготовки для тестов сервисов

use crate::error::Result;
use crate::events::WindowId;
use crate::securelogin_error;
use crate::services::behavior::{BehaviorFactory, WindowBehavior};
use crate::services::host::{HostWindow, WindowHandle};
use crate::services::prefs::{PrefStore, PREF_LOGIN_WITH_PROTECTION};
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
pub struct CountingFactory {
    pub created: DashMap<WindowId, usize>,
    pub finalized: Arc<DashMap<WindowId, usize>>,
    pub failing_finalize: Arc<DashSet<WindowId>>,
    pub failing_create: DashSet<WindowId>,
    pub protection_seen: DashMap<WindowId, Option<bool>>,
    pub prefs: Option<Arc<dyn PrefStore>>,
    total_created: AtomicUsize,
}

impl CountingFactory {
    pub fn with_prefs(prefs: Arc<dyn PrefStore>) -> Self {
        Self {
            prefs: Some(prefs),
            ..Self::default()
        }
    }

    pub fn created(&self, id: WindowId) -> usize {
        self.created.get(&id).map(|c| *c).unwrap_or(0)
    }

    pub fn finalized(&self, id: WindowId) -> usize {
        self.finalized.get(&id).map(|c| *c).unwrap_or(0)
    }

    pub fn total_created(&self) -> usize {
        self.total_created.load(Ordering::Relaxed)
    }

    pub fn total_finalized(&self) -> usize {
        self.finalized.iter().map(|e| *e.value()).sum()
    }
}

struct CountingBehavior {
    id: WindowId,
    finalized: Arc<DashMap<WindowId, usize>>,
    failing_finalize: Arc<DashSet<WindowId>>,
}

impl WindowBehavior for CountingBehavior {
    fn finalize(&mut self) -> Result<()> {
        *self.finalized.entry(self.id).or_insert(0) += 1;
        if self.failing_finalize.contains(&self.id) {
            return Err(securelogin_error!(behavior, self.id, "сбой finalize"));
        }
        Ok(())
    }
}

impl BehaviorFactory for CountingFactory {
    fn create(&self, window: &WindowHandle) -> Result<Box<dyn WindowBehavior>> {
        let id = window.id();
        if self.failing_create.contains(&id) {
            return Err(securelogin_error!(behavior, id, "сбой создания"));
        }
        if let Some(prefs) = &self.prefs {
            self.protection_seen
                .insert(id, prefs.get_bool(PREF_LOGIN_WITH_PROTECTION));
        }
        *self.created.entry(id).or_insert(0) += 1;
        self.total_created.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(CountingBehavior {
            id,
            finalized: self.finalized.clone(),
            failing_finalize: self.failing_finalize.clone(),
        }))
    }
}

/// Дать фоновым задачам current_thread-рантайма отработать
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}
