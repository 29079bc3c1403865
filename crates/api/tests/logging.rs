//! Lifecycle events are logged once per request.

mod common;

use std::fmt::Debug;
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use common::{credentials_get, submit, ALICE, SPOOLER};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// Collects the `message` of every event.
#[derive(Clone, Default)]
struct Messages(Arc<Mutex<Vec<String>>>);

impl Messages {
    fn count(&self, message: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|m| *m == message).count()
    }
}

struct MessageVisitor(Option<String>);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "message" {
            self.0 = Some(format!("{value:?}"));
        }
    }
}

impl<S: Subscriber> Layer<S> for Messages {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(None);
        event.record(&mut visitor);
        if let Some(message) = visitor.0 {
            self.0.lock().unwrap().push(message);
        }
    }
}

#[tokio::test]
async fn submit_and_claim_log_one_event_each() {
    let messages = Messages::default();
    let _guard =
        tracing::subscriber::set_default(tracing_subscriber::registry().with(messages.clone()));

    let (app, _) = common::build_test_app();
    let response = submit(&app, "fermions", ALICE, r#"{"shots": 4}"#).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = credentials_get(&app, "fermions", "get_next_job_in_queue", SPOOLER).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(messages.count("Job submitted"), 1);
    assert_eq!(messages.count("Job claimed"), 1);
}
