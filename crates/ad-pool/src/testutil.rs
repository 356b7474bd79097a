//! Scripted mock provider for lifecycle tests
//!
//! Each operation pops the next queued failure code and succeeds when its
//! queue is empty. Call counters let tests assert that guards short-circuit
//! before the provider is contacted. An optional latency keeps operations
//! in flight so reentrancy guards can be exercised under paused time.

use crate::config::CategorySettings;
use provider::{
    AdCategory, AdProvider, AdResource, OP_LOAD_AND_SHOW_BANNER, ProviderFailure,
};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Queues {
    create: VecDeque<&'static str>,
    load: VecDeque<&'static str>,
    show: VecDeque<&'static str>,
    banner_show: VecDeque<&'static str>,
    banner_hide: VecDeque<&'static str>,
}

enum Op {
    Create,
    Load,
    Show,
    BannerShow,
    BannerHide,
}

#[derive(Default)]
struct MockState {
    queues: Mutex<Queues>,
    latency: Mutex<Duration>,
    create_calls: AtomicUsize,
    load_calls: AtomicUsize,
    show_calls: AtomicUsize,
    banner_show_calls: AtomicUsize,
    banner_hide_calls: AtomicUsize,
    capability_queries: AtomicUsize,
    created_order: Mutex<Vec<String>>,
}

impl MockState {
    async fn run(&self, op: Op) -> Result<(), ProviderFailure> {
        let code = {
            let mut queues = self.queues.lock().unwrap();
            match op {
                Op::Create => {
                    self.create_calls.fetch_add(1, Ordering::SeqCst);
                    queues.create.pop_front()
                }
                Op::Load => {
                    self.load_calls.fetch_add(1, Ordering::SeqCst);
                    queues.load.pop_front()
                }
                Op::Show => {
                    self.show_calls.fetch_add(1, Ordering::SeqCst);
                    queues.show.pop_front()
                }
                Op::BannerShow => {
                    self.banner_show_calls.fetch_add(1, Ordering::SeqCst);
                    queues.banner_show.pop_front()
                }
                Op::BannerHide => {
                    self.banner_hide_calls.fetch_add(1, Ordering::SeqCst);
                    queues.banner_hide.pop_front()
                }
            }
        };
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        match code {
            Some(code) => Err(ProviderFailure::new(code, "scripted failure")),
            None => Ok(()),
        }
    }
}

/// Mock ad provider with scripted outcomes.
pub(crate) struct MockProvider {
    state: Arc<MockState>,
    operations: Vec<String>,
}

impl MockProvider {
    /// Provider that supports banners and succeeds on everything.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Arc::new(MockState::default()),
            operations: vec![OP_LOAD_AND_SHOW_BANNER.to_string()],
        })
    }

    /// Provider whose capability list omits banner support.
    pub fn without_banner() -> Arc<Self> {
        Arc::new(Self {
            state: Arc::new(MockState::default()),
            operations: Vec::new(),
        })
    }

    pub fn fail_create(&self, code: &'static str) {
        self.state.queues.lock().unwrap().create.push_back(code);
    }

    pub fn fail_load(&self, code: &'static str) {
        self.state.queues.lock().unwrap().load.push_back(code);
    }

    pub fn fail_show(&self, code: &'static str) {
        self.state.queues.lock().unwrap().show.push_back(code);
    }

    pub fn fail_banner_show(&self, code: &'static str) {
        self.state.queues.lock().unwrap().banner_show.push_back(code);
    }

    pub fn fail_banner_hide(&self, code: &'static str) {
        self.state.queues.lock().unwrap().banner_hide.push_back(code);
    }

    /// Keep every provider call in flight for `latency` of simulated time.
    pub fn set_latency(&self, latency: Duration) {
        *self.state.latency.lock().unwrap() = latency;
    }

    pub fn create_calls(&self) -> usize {
        self.state.create_calls.load(Ordering::SeqCst)
    }

    pub fn load_calls(&self) -> usize {
        self.state.load_calls.load(Ordering::SeqCst)
    }

    pub fn show_calls(&self) -> usize {
        self.state.show_calls.load(Ordering::SeqCst)
    }

    pub fn banner_show_calls(&self) -> usize {
        self.state.banner_show_calls.load(Ordering::SeqCst)
    }

    pub fn banner_hide_calls(&self) -> usize {
        self.state.banner_hide_calls.load(Ordering::SeqCst)
    }

    pub fn capability_queries(&self) -> usize {
        self.state.capability_queries.load(Ordering::SeqCst)
    }

    /// Placement ids in the order `create_resource` was invoked.
    pub fn created_order(&self) -> Vec<String> {
        self.state.created_order.lock().unwrap().clone()
    }
}

struct MockResource {
    state: Arc<MockState>,
}

impl AdResource for MockResource {
    fn load(&self) -> Pin<Box<dyn Future<Output = provider::Result<()>> + Send + '_>> {
        let state = Arc::clone(&self.state);
        Box::pin(async move { state.run(Op::Load).await })
    }

    fn show(&self) -> Pin<Box<dyn Future<Output = provider::Result<()>> + Send + '_>> {
        let state = Arc::clone(&self.state);
        Box::pin(async move { state.run(Op::Show).await })
    }
}

impl AdProvider for MockProvider {
    fn id(&self) -> &str {
        "mock"
    }

    fn create_resource<'a>(
        &'a self,
        _category: AdCategory,
        placement_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = provider::Result<Arc<dyn AdResource>>> + Send + 'a>> {
        let state = Arc::clone(&self.state);
        let placement = placement_id.to_string();
        Box::pin(async move {
            state.created_order.lock().unwrap().push(placement);
            state.run(Op::Create).await?;
            Ok(Arc::new(MockResource { state }) as Arc<dyn AdResource>)
        })
    }

    fn load_and_show_banner<'a>(
        &'a self,
        _placement_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = provider::Result<()>> + Send + 'a>> {
        let state = Arc::clone(&self.state);
        Box::pin(async move { state.run(Op::BannerShow).await })
    }

    fn hide_banner(&self) -> Pin<Box<dyn Future<Output = provider::Result<()>> + Send + '_>> {
        let state = Arc::clone(&self.state);
        Box::pin(async move { state.run(Op::BannerHide).await })
    }

    fn supported_operations(&self) -> Vec<String> {
        self.state.capability_queries.fetch_add(1, Ordering::SeqCst);
        self.operations.clone()
    }
}

/// Category settings for tests: no warmup, explicit everything else.
pub(crate) fn settings(
    refresh_interval: Duration,
    max_load_errors: u32,
    auto_reload_on_show: bool,
) -> CategorySettings {
    CategorySettings {
        refresh_interval,
        warmup: Duration::ZERO,
        max_load_errors,
        auto_reload_on_show,
    }
}
