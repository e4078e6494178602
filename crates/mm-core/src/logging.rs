use std::panic;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// tracing の初期化。フィルタは RUST_LOG（未設定なら info）、
/// MM_LOG_DIR が指す場合は日次ローテーションのファイル出力に切り替える。
/// 二重初期化は黙って無視する。
pub fn init(app_name: &'static str) {
    install_panic_hook(app_name);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match rolling_file_writer(app_name) {
        Some(writer) => builder.with_writer(writer).with_ansi(false).try_init(),
        None => builder.try_init(),
    };
    let _ = result;
}

fn rolling_file_writer(app_name: &'static str) -> Option<BoxMakeWriter> {
    let dir = std::env::var_os("MM_LOG_DIR")?;
    let dir = std::path::PathBuf::from(dir);
    if let Err(err) = std::fs::create_dir_all(&dir) {
        eprintln!("failed to create MM_LOG_DIR ({err}); falling back to stdout");
        return None;
    }

    let appender = tracing_appender::rolling::daily(dir, format!("{app_name}.log"));
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);
    Some(BoxMakeWriter::new(non_blocking))
}

/// panic を tracing 経由で file/line 付きのログに残す。
/// プロセスごとに 1 回だけ差し込む。
fn install_panic_hook(app_name: &'static str) {
    static INSTALLED: OnceLock<()> = OnceLock::new();

    INSTALLED.get_or_init(|| {
        panic::set_hook(Box::new(move |info| {
            let location = info
                .location()
                .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()));
            let message = info
                .payload()
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| info.payload().downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic payload not string".into());

            tracing::error!(
                application = app_name,
                location = location.as_deref().unwrap_or("unknown"),
                panic_message = %message,
                "panic captured"
            );
        }));
    });
}
