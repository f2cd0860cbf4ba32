/// Installs the `log` backend. With the `console` feature the tokio-console
/// subscriber is started as well.
pub fn init() {
    #[cfg(feature = "console")]
    console_subscriber::init();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}
