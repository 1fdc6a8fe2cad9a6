use tracing_subscriber::{
    Layer,
    filter::{EnvFilter, LevelFilter},
    layer::SubscriberExt as _,
    registry,
};

// `RUST_LOG` wins over the default level.
fn filter(default: LevelFilter) -> EnvFilter {
    EnvFilter::builder().with_default_directive(default.into()).from_env_lossy()
}

pub fn init(default: LevelFilter) {
    let stderr_layer = tracing_subscriber::fmt::Layer::default().with_writer(std::io::stderr).with_filter(filter(default));
    tracing::subscriber::set_global_default(registry().with(stderr_layer)).expect("failed to set global subscriber");
    tracing::debug!(message_id = "Rk6pXs1v", "logging initialized");
    std::panic::set_hook(Box::new(|panic_info| {
        tracing::error!(message_id = "W3cjnUq8", "{panic_info}\n{:#}", std::backtrace::Backtrace::force_capture());
    }));
}
