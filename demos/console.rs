use std::io;

use text_log_handler::handler::{HandlerOptions, TextHandler};
use text_log_handler::record::{Level, LogRecord};
use text_log_handler::sink::WriterSink;
use text_log_handler::value::Attr;

fn main() {
    let sink = WriterSink::new(io::stderr());
    let handler = TextHandler::new(sink, HandlerOptions::default());

    handler
        .handle(&LogRecord::new(Level::Info, "starting service"))
        .expect("write log line");

    let auth = handler
        .with_group("auth")
        .with_attrs(vec![Attr::string("service", "login")]);

    let rec = LogRecord::new(Level::Error, "authentication failed").with_attrs(vec![
        Attr::int("user_id", 42),
        Attr::string("reason", "invalid password"),
        Attr::group(
            "client",
            vec![Attr::string("ip", "10.0.0.7"), Attr::uint("port", 51423)],
        ),
    ]);
    auth.handle(&rec).expect("write log line");

    #[cfg(feature = "tracing")]
    {
        use text_log_handler::init::init_tracing;

        init_tracing(WriterSink::new(io::stderr()));
        tracing::warn!(queue_depth = 17_i64, "backlog growing");
    }
}
