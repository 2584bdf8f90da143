//! Scripted truck service: every remote call is parked until the test
//! answers it, so completion order can be forced.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use truck_grid::{ApiError, ErrorReporter, Truck, TruckId, TruckService};

const WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    List,
    Count,
    Update,
    Insert,
    Delete,
}

pub enum Reply {
    List(Result<Vec<Truck>, ApiError>),
    Count(Result<u64, ApiError>),
    Ack(Result<(), ApiError>),
}

pub struct Call {
    pub kind: CallKind,
    pub filter: String,
    pub order: String,
    pub limit: usize,
    pub offset: usize,
    reply: oneshot::Sender<Reply>,
}

impl Call {
    pub fn reply(self, reply: Reply) {
        let _ = self.reply.send(reply);
    }
}

pub struct ScriptedService {
    calls: mpsc::UnboundedSender<Call>,
}

impl ScriptedService {
    pub fn new() -> (Arc<Self>, Calls) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { calls: tx }), Calls { rx, buffered: Vec::new() })
    }

    async fn call(&self, kind: CallKind, limit: usize, offset: usize, order: &str, filter: &str) -> Result<Reply, ApiError> {
        let (tx, rx) = oneshot::channel();
        self.calls
            .send(Call {
                kind,
                filter: filter.to_string(),
                order: order.to_string(),
                limit,
                offset,
                reply: tx,
            })
            .map_err(|_| ApiError::Unavailable("test finished".into()))?;
        rx.await.map_err(|_| ApiError::Unavailable("call dropped".into()))
    }

    async fn ack(&self, kind: CallKind) -> Result<(), ApiError> {
        match self.call(kind, 0, 0, "", "").await? {
            Reply::Ack(r) => r,
            _ => Err(ApiError::Unavailable("wrong reply kind".into())),
        }
    }
}

#[async_trait::async_trait]
impl TruckService for ScriptedService {
    async fn list_trucks(&self, limit: usize, offset: usize, order: &str, filter: &str) -> Result<Vec<Truck>, ApiError> {
        match self.call(CallKind::List, limit, offset, order, filter).await? {
            Reply::List(r) => r,
            _ => Err(ApiError::Unavailable("wrong reply kind".into())),
        }
    }

    async fn count_trucks(&self, filter: &str) -> Result<u64, ApiError> {
        match self.call(CallKind::Count, 0, 0, "", filter).await? {
            Reply::Count(r) => r,
            _ => Err(ApiError::Unavailable("wrong reply kind".into())),
        }
    }

    async fn update_truck(&self, _: &Truck) -> Result<(), ApiError> {
        self.ack(CallKind::Update).await
    }

    async fn insert_truck(&self, _: &Truck) -> Result<(), ApiError> {
        self.ack(CallKind::Insert).await
    }

    async fn delete_truck(&self, _: TruckId) -> Result<(), ApiError> {
        self.ack(CallKind::Delete).await
    }
}

/// Test side of the scripted service.
pub struct Calls {
    rx: mpsc::UnboundedReceiver<Call>,
    buffered: Vec<Call>,
}

impl Calls {
    /// Next call of `kind`, in arrival order.
    pub async fn next(&mut self, kind: CallKind) -> Call {
        self.next_where(|c| c.kind == kind).await
    }

    /// Next call of `kind` carrying `filter`.
    pub async fn next_filtered(&mut self, kind: CallKind, filter: &str) -> Call {
        self.next_where(|c| c.kind == kind && c.filter == filter).await
    }

    async fn next_where(&mut self, pred: impl Fn(&Call) -> bool) -> Call {
        if let Some(pos) = self.buffered.iter().position(&pred) {
            return self.buffered.remove(pos);
        }
        loop {
            let call = tokio::time::timeout(WAIT, self.rx.recv())
                .await
                .expect("timed out waiting for a service call")
                .expect("service dropped");
            if pred(&call) {
                return call;
            }
            self.buffered.push(call);
        }
    }
}

/// Reporter that records every notification.
#[derive(Default)]
pub struct RecordingReporter {
    pub reports: Mutex<Vec<(String, String)>>,
}

impl RecordingReporter {
    pub fn taken(&self) -> Vec<(String, String)> {
        std::mem::take(&mut *self.reports.lock().unwrap())
    }
}

impl ErrorReporter for RecordingReporter {
    fn notify(&self, title: &str, error: &ApiError) {
        self.reports.lock().unwrap().push((title.to_string(), error.to_string()));
    }
}

/// Yield until `cond` holds.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(WAIT, async {
        while !cond() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition never became true");
}

pub fn truck(id: TruckId, number: i64, brand: &str) -> Truck {
    Truck {
        id,
        number,
        brand: brand.to_string(),
        ..Default::default()
    }
}
