use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use cotask::engine::EngineEvent;
use cotask::errors::Result;
use cotask::remote::{AllocationRow, DependencyReply, RemoteBackend, TaskExport, TaskRow};
use cotask::seq::BlockSummary;
use cotask::types::TaskName;

/// Record of one backend call, for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    ReloadTasks,
    FetchPreviousAllocation,
    /// Block names, in the order they were persisted.
    SaveBlockOrder(Vec<String>),
    /// Task names, in execution order.
    StartExecution(Vec<String>),
    CompleteHumanTask(String),
    ResetRemote,
    LogEvent(String),
}

/// A fake remote backend that:
/// - records every call it receives
/// - answers fetches with canned data fed back as engine events.
pub struct FakeRemote {
    runtime_tx: mpsc::Sender<EngineEvent>,
    calls: Arc<Mutex<Vec<RemoteCall>>>,
    tasks: Vec<TaskRow>,
    dependencies: DependencyReply,
    previous_allocation: Vec<AllocationRow>,
}

impl FakeRemote {
    pub fn new(
        runtime_tx: mpsc::Sender<EngineEvent>,
        calls: Arc<Mutex<Vec<RemoteCall>>>,
    ) -> Self {
        Self {
            runtime_tx,
            calls,
            tasks: Vec::new(),
            dependencies: DependencyReply::default(),
            previous_allocation: Vec::new(),
        }
    }

    /// Canned task set returned by `reload_tasks`.
    pub fn with_task_set(mut self, tasks: Vec<TaskRow>, dependencies: DependencyReply) -> Self {
        self.tasks = tasks;
        self.dependencies = dependencies;
        self
    }

    /// Canned rows returned by `fetch_previous_allocation`.
    pub fn with_previous_allocation(mut self, rows: Vec<AllocationRow>) -> Self {
        self.previous_allocation = rows;
        self
    }
}

impl RemoteBackend for FakeRemote {
    fn reload_tasks(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let calls = Arc::clone(&self.calls);
        let tasks = self.tasks.clone();
        let dependencies = self.dependencies.clone();

        Box::pin(async move {
            calls.lock().unwrap().push(RemoteCall::ReloadTasks);
            tx.send(EngineEvent::TaskSetLoaded {
                tasks,
                dependencies,
            })
            .await
            .map_err(anyhow::Error::from)?;
            Ok(())
        })
    }

    fn fetch_previous_allocation(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let calls = Arc::clone(&self.calls);
        let rows = self.previous_allocation.clone();

        Box::pin(async move {
            calls
                .lock()
                .unwrap()
                .push(RemoteCall::FetchPreviousAllocation);
            tx.send(EngineEvent::PreviousAllocationLoaded { rows })
                .await
                .map_err(anyhow::Error::from)?;
            Ok(())
        })
    }

    fn save_block_order(
        &mut self,
        blocks: Vec<BlockSummary>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let calls = Arc::clone(&self.calls);

        Box::pin(async move {
            let names = blocks.iter().map(|b| b.name.clone()).collect();
            calls.lock().unwrap().push(RemoteCall::SaveBlockOrder(names));
            Ok(())
        })
    }

    fn start_execution(
        &mut self,
        tasks: Vec<TaskExport>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let calls = Arc::clone(&self.calls);

        Box::pin(async move {
            let names = tasks.iter().map(|t| t.name.clone()).collect();
            calls.lock().unwrap().push(RemoteCall::StartExecution(names));
            Ok(())
        })
    }

    fn complete_human_task(
        &mut self,
        task: TaskName,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let calls = Arc::clone(&self.calls);

        Box::pin(async move {
            calls.lock().unwrap().push(RemoteCall::CompleteHumanTask(task));
            Ok(())
        })
    }

    fn reset_remote(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let calls = Arc::clone(&self.calls);

        Box::pin(async move {
            calls.lock().unwrap().push(RemoteCall::ResetRemote);
            Ok(())
        })
    }

    fn log_event(
        &mut self,
        event: String,
        _details: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let calls = Arc::clone(&self.calls);

        Box::pin(async move {
            calls.lock().unwrap().push(RemoteCall::LogEvent(event));
            Ok(())
        })
    }
}
