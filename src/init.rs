use crate::handler::{HandlerOptions, TextHandler};
use crate::layer::TextLayer;
use crate::sink::LogSink;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Initialize the global `tracing` subscriber with a [`TextLayer`] writing
/// to `sink` under the given options.
///
/// **Parameters**
/// - `sink`: destination for formatted lines.
/// - `options`: [`HandlerOptions`] controlling threshold, styling and
///   timestamp layout.
///
/// **Effects**
///
/// Installs a [`Registry`] combined with [`TextLayer`] as the global
/// default subscriber, so all `tracing` events in the process are rendered
/// through the handler.
pub fn init_tracing_with_options(sink: impl LogSink + 'static, options: HandlerOptions) {
    let handler = TextHandler::new(sink, options);
    let subscriber = Registry::default().with(TextLayer::new(handler));
    tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");
}

/// Initialize tracing with default options.
///
/// Equivalent to calling [`init_tracing_with_options`] with
/// [`HandlerOptions::default`]. This is the recommended entrypoint for
/// typical services.
pub fn init_tracing(sink: impl LogSink + 'static) {
    init_tracing_with_options(sink, HandlerOptions::default());
}
