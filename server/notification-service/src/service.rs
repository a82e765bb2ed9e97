//! Single-task service loop around the engine.
//!
//! Bus messages, user decisions, manual actions and dispatch outcomes all arrive on
//! channels drained by one task, so every reduction runs to completion before the next
//! one starts and always sees the latest list. Dispatch calls run in spawned tasks and
//! report back through the same loop.

use std::sync::Arc;

use notification_engine::correlation::Outcome;
use notification_engine::types::Action;
use notification_engine::{Decision, Effect, Engine, Notification};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::dispatch::CommandDispatcher;
use crate::error::ServiceError;

/// Reply to a decision or manual action: what happened and the entry as it now stands.
#[derive(Debug, Clone)]
pub struct Reply {
  pub outcome: Outcome,
  pub notification: Option<Notification>,
}

enum Command {
  Bus {
    topic: String,
    payload: Vec<u8>,
  },
  Decide {
    notification_id: String,
    decision: Decision,
    reply: oneshot::Sender<Reply>,
  },
  ManualAction {
    zone_id: String,
    command: String,
    action_text: String,
    reply: oneshot::Sender<Reply>,
  },
  Snapshot {
    reply: oneshot::Sender<Vec<Notification>>,
  },
  Clear {
    reply: oneshot::Sender<()>,
  },
  Shutdown,
}

struct DispatchDone {
  notification_id: String,
  result: Result<(), String>,
}

/// Cheap, cloneable front door to the service loop.
#[derive(Clone)]
pub struct ServiceHandle {
  tx: mpsc::Sender<Command>,
}

impl ServiceHandle {
  /// Hand a raw bus message to the engine. Malformed messages are logged and dropped by the loop.
  pub async fn publish(&self, topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Result<(), ServiceError> {
    self
      .send(Command::Bus {
        topic: topic.into(),
        payload: payload.into(),
      })
      .await
  }

  /// Same as [`publish`](Self::publish), for callers on a plain thread outside the runtime.
  pub fn blocking_publish(&self, topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Result<(), ServiceError> {
    self
      .tx
      .blocking_send(Command::Bus {
        topic: topic.into(),
        payload: payload.into(),
      })
      .map_err(|_| ServiceError::Closed)
  }

  /// Apply a user decision. Returns once the optimistic state is in place; the dispatch
  /// outcome is folded in later.
  pub async fn decide(&self, notification_id: impl Into<String>, decision: Decision) -> Result<Reply, ServiceError> {
    let (reply, rx) = oneshot::channel();
    self
      .send(Command::Decide {
        notification_id: notification_id.into(),
        decision,
        reply,
      })
      .await?;
    rx.await.map_err(|_| ServiceError::Closed)
  }

  pub async fn track_manual_action(
    &self,
    zone_id: impl Into<String>,
    command: impl Into<String>,
    action_text: impl Into<String>,
  ) -> Result<Reply, ServiceError> {
    let (reply, rx) = oneshot::channel();
    self
      .send(Command::ManualAction {
        zone_id: zone_id.into(),
        command: command.into(),
        action_text: action_text.into(),
        reply,
      })
      .await?;
    rx.await.map_err(|_| ServiceError::Closed)
  }

  pub async fn snapshot(&self) -> Result<Vec<Notification>, ServiceError> {
    let (reply, rx) = oneshot::channel();
    self.send(Command::Snapshot { reply }).await?;
    rx.await.map_err(|_| ServiceError::Closed)
  }

  pub async fn clear_all(&self) -> Result<(), ServiceError> {
    let (reply, rx) = oneshot::channel();
    self.send(Command::Clear { reply }).await?;
    rx.await.map_err(|_| ServiceError::Closed)
  }

  /// Stop the loop even while other handles are still alive. Commands queued before this
  /// one are still handled, and in-flight dispatches are still folded in.
  pub async fn shutdown(&self) -> Result<(), ServiceError> {
    self.send(Command::Shutdown).await
  }

  async fn send(&self, cmd: Command) -> Result<(), ServiceError> {
    self.tx.send(cmd).await.map_err(|_| ServiceError::Closed)
  }
}

pub struct Service {
  engine: Engine,
  dispatcher: Arc<dyn CommandDispatcher>,
  commands: mpsc::Receiver<Command>,
  done_tx: mpsc::UnboundedSender<DispatchDone>,
  done_rx: mpsc::UnboundedReceiver<DispatchDone>,
  in_flight: usize,
}

impl Service {
  /// Start the loop on the current runtime. It exits on shutdown or once every handle is
  /// dropped, after in-flight dispatches have reported back.
  pub fn spawn(engine: Engine, dispatcher: Arc<dyn CommandDispatcher>, buffer: usize) -> (ServiceHandle, JoinHandle<Engine>) {
    let (tx, commands) = mpsc::channel(buffer.max(1));
    let (done_tx, done_rx) = mpsc::unbounded_channel();
    let service = Service {
      engine,
      dispatcher,
      commands,
      done_tx,
      done_rx,
      in_flight: 0,
    };
    let task = tokio::spawn(service.run());
    (ServiceHandle { tx }, task)
  }

  async fn run(mut self) -> Engine {
    loop {
      tokio::select! {
        cmd = self.commands.recv() => match cmd {
          Some(Command::Shutdown) | None => break,
          Some(cmd) => self.handle(cmd),
        },
        Some(done) = self.done_rx.recv() => self.resolve(done),
      }
    }

    while self.in_flight > 0 {
      match self.done_rx.recv().await {
        Some(done) => self.resolve(done),
        None => break,
      }
    }
    debug!("service loop stopped");
    self.engine
  }

  fn handle(&mut self, cmd: Command) {
    match cmd {
      Command::Bus { topic, payload } => match self.engine.ingest_message(&topic, &payload) {
        Ok(applied) => self.run_effect(applied.effect),
        Err(e) => warn!(%topic, error = %e, "dropping malformed bus message"),
      },
      Command::Decide {
        notification_id,
        decision,
        reply,
      } => {
        let applied = self.engine.handle_decision(&notification_id, decision);
        self.run_effect(applied.effect);
        let _ = reply.send(Reply {
          notification: self.engine.get(&notification_id).cloned(),
          outcome: applied.outcome,
        });
      }
      Command::ManualAction {
        zone_id,
        command,
        action_text,
        reply,
      } => {
        let applied = self.engine.track_manual_action(&zone_id, &command, &action_text);
        let notification = match &applied.outcome {
          Outcome::ManualTracked { id } | Outcome::Created { id, .. } => self.engine.get(id).cloned(),
          _ => None,
        };
        let _ = reply.send(Reply {
          outcome: applied.outcome,
          notification,
        });
      }
      Command::Snapshot { reply } => {
        let _ = reply.send(self.engine.notifications().to_vec());
      }
      Command::Clear { reply } => {
        self.engine.clear_all();
        let _ = reply.send(());
      }
      // Intercepted by `run`.
      Command::Shutdown => {}
    }
  }

  fn run_effect(&mut self, effect: Option<Effect>) {
    let Some(Effect::Dispatch {
      notification_id,
      zone_id,
      command,
    }) = effect
    else {
      return;
    };

    self.in_flight += 1;
    let dispatcher = Arc::clone(&self.dispatcher);
    let done = self.done_tx.clone();
    tokio::spawn(async move {
      let result = dispatcher
        .dispatch(&zone_id, &command)
        .await
        .map_err(|e| e.to_string());
      if let Err(e) = &result {
        warn!(%zone_id, %command, error = %e, "command dispatch failed");
      }
      let _ = done.send(DispatchDone {
        notification_id,
        result,
      });
    });
  }

  fn resolve(&mut self, done: DispatchDone) {
    self.in_flight = self.in_flight.saturating_sub(1);
    let action = match done.result {
      Ok(()) => Action::DispatchSucceeded {
        notification_id: done.notification_id,
      },
      Err(reason) => Action::DispatchFailed {
        notification_id: done.notification_id,
        reason,
      },
    };
    self.engine.apply(action);
  }
}
