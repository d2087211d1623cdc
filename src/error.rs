use thiserror::Error;

use crate::config::ConfigError;
use crate::event::WaitError;
use crate::platform::PlatformError;
use crate::ui::WidgetError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Wait error: {0}")]
    Wait(#[from] WaitError),
    #[error("Widget error: {0}")]
    Widget(#[from] WidgetError),
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type HeraldResult<T> = Result<T, Error>;

impl Error {
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Error::Internal(message.into())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::event::EventType;

    #[test]
    fn test_conversions_keep_source_message() {
        let err: Error = WaitError::Timeout {
            event_type: EventType::MessageCreate,
            timeout: Duration::from_millis(10),
        }
        .into();
        assert!(matches!(err, Error::Wait(_)));
        assert!(err.to_string().starts_with("Wait error: "));

        let err: Error = WidgetError::PagesEmpty.into();
        assert_eq!(err.to_string(), "Widget error: No pages");

        let err = Error::internal("boom");
        assert_eq!(err.to_string(), "Internal error: boom");
    }
}
