#![cfg(feature = "tracing")]

//! Failed keydown handlers are reported as warnings and dispatch continues.

use std::sync::{Arc, Mutex};

use sheetkit_core::event::{KeyCode, KeyEvent};
use sheetkit_core::keydown::{KeydownError, KeydownOptions, KeydownRegistry, Propagation};
use tracing::Subscriber;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

#[derive(Default)]
struct Warnings {
    handlers: Vec<u64>,
}

struct WarnCapture {
    state: Arc<Mutex<Warnings>>,
}

#[derive(Default)]
struct HandlerVisitor {
    handler: Option<u64>,
}

impl tracing::field::Visit for HandlerVisitor {
    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        if field.name() == "handler" {
            self.handler = Some(value);
        }
    }

    fn record_debug(&mut self, _field: &tracing::field::Field, _value: &dyn std::fmt::Debug) {}
}

impl<S> Layer<S> for WarnCapture
where
    S: Subscriber + for<'lookup> tracing_subscriber::registry::LookupSpan<'lookup>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if meta.target() != sheetkit_core::logging::LOG_TARGET || *meta.level() != tracing::Level::WARN {
            return;
        }
        let mut visitor = HandlerVisitor::default();
        event.record(&mut visitor);
        if let Some(id) = visitor.handler {
            self.state.lock().expect("warn state lock").handlers.push(id);
        }
    }
}

#[test]
fn handler_error_is_warned_with_its_id() {
    let state = Arc::new(Mutex::new(Warnings::default()));
    let subscriber = tracing_subscriber::registry().with(WarnCapture {
        state: Arc::clone(&state),
    });
    let _guard = tracing::subscriber::set_default(subscriber);
    tracing::callsite::rebuild_interest_cache();

    let registry = KeydownRegistry::new();
    let failing = registry.on(KeydownOptions::new().priority(1), |_| {
        Err(KeydownError::Handler("no route".into()))
    });
    registry.on(KeydownOptions::new(), |_| Ok(Propagation::Handled));

    let report = registry.run(&KeyEvent::new(KeyCode::Enter));
    tracing::callsite::rebuild_interest_cache();

    assert!(report.handled);
    assert_eq!(report.invoked, 2);
    assert_eq!(report.failed, 1);
    let warnings = state.lock().expect("warn state lock");
    assert_eq!(warnings.handlers, vec![failing.id()]);
}
