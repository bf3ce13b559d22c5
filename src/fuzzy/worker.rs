//! Фоновый подбор подсказок: один поток на запрос, последний побеждает.
//!
//! Новый `submit` отменяет токен предыдущей оценки. Публикуется только
//! результат самого свежего запроса (сверка поколения под Mutex), так что
//! опоздавший старый поток ничего не перезапишет.

use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use anyhow::{anyhow, Context, Result};
use log::debug;
use serde::Serialize;

use super::best_matches::{BestMatches, CancelToken, Match};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestions {
    pub generation: u64,
    pub query: String,
    pub matches: Vec<Match>,
}

#[derive(Default)]
struct WorkerState {
    generation: u64,
    current: Option<CancelToken>,
    running: usize,
    latest: Option<Suggestions>,
}

pub struct SuggestionWorker {
    candidates: Arc<Vec<String>>,
    limit: usize,
    state: Arc<(Mutex<WorkerState>, Condvar)>,
}

impl SuggestionWorker {
    pub fn new(candidates: Vec<String>, limit: usize) -> Self {
        Self {
            candidates: Arc::new(candidates),
            limit,
            state: Arc::new((Mutex::new(WorkerState::default()), Condvar::new())),
        }
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    /// Запустить оценку `query`; предыдущая отменяется. Возвращает поколение.
    pub fn submit(&self, query: &str) -> Result<u64> {
        let token = CancelToken::new();
        let generation = {
            let mut st = self
                .state
                .0
                .lock()
                .map_err(|_| anyhow!("suggestion state poisoned"))?;
            if let Some(prev) = st.current.take() {
                prev.cancel();
            }
            st.generation += 1;
            st.current = Some(token.clone());
            st.running += 1;
            st.generation
        };

        let candidates = Arc::clone(&self.candidates);
        let state = Arc::clone(&self.state);
        let query = query.to_string();
        let limit = self.limit;
        let spawned = thread::Builder::new()
            .name(format!("suggest-{}", generation))
            .spawn(move || {
                let mut bm = BestMatches::new();
                let done = bm.evaluate(&query, candidates.as_slice(), &token);
                let (lock, cv) = &*state;
                if let Ok(mut st) = lock.lock() {
                    if done && st.generation == generation {
                        st.latest = Some(Suggestions {
                            generation,
                            query,
                            matches: bm.top(limit),
                        });
                    } else {
                        debug!("suggestion generation {} discarded", generation);
                    }
                    st.running -= 1;
                }
                cv.notify_all();
            });

        if let Err(e) = spawned {
            if let Ok(mut st) = self.state.0.lock() {
                st.running -= 1;
            }
            return Err(e).context("spawn suggestion thread");
        }
        Ok(generation)
    }

    /// Последний опубликованный результат.
    pub fn latest(&self) -> Option<Suggestions> {
        self.state.0.lock().ok().and_then(|st| st.latest.clone())
    }

    /// Дождаться завершения всех запущенных оценок.
    pub fn wait_idle(&self) -> Result<()> {
        let (lock, cv) = &*self.state;
        let mut st = lock.lock().map_err(|_| anyhow!("suggestion state poisoned"))?;
        while st.running > 0 {
            st = cv
                .wait(st)
                .map_err(|_| anyhow!("suggestion state poisoned"))?;
        }
        Ok(())
    }

    /// Отменить текущую оценку, если она есть.
    pub fn cancel(&self) {
        if let Ok(mut st) = self.state.0.lock() {
            if let Some(t) = st.current.take() {
                t.cancel();
            }
        }
    }
}

impl Drop for SuggestionWorker {
    fn drop(&mut self) {
        self.cancel();
    }
}
