#![allow(dead_code)]

use kelp_sans_io::Result;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;

pub(crate) fn init_tracing() -> Result<DefaultGuard> {
    Ok(tracing::subscriber::set_default(
        tracing_subscriber::fmt()
            .with_level(true)
            .with_line_number(true)
            .with_thread_names(false)
            .with_target(true)
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(
                    format!("{}=debug", env!("CARGO_PKG_NAME").replace("-", "_"))
                        .parse()
                        .map_err(|error| kelp_sans_io::Error::Message(format!("{error}")))?,
                ),
            )
            .with_test_writer()
            .finish(),
    ))
}
