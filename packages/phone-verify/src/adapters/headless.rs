use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::traits::{BotFilter, BotFilterError, RenderOptions, WidgetHandle};

/// Bot filter for callers with no browser widget (CLI, server-side forms).
///
/// Issues random tokens and tracks which are live so double disposal is caught.
#[derive(Debug, Default)]
pub struct HeadlessBotFilter {
    live: Mutex<HashSet<WidgetHandle>>,
}

impl HeadlessBotFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live.lock().map(|live| live.len()).unwrap_or(0)
    }
}

#[async_trait]
impl BotFilter for HeadlessBotFilter {
    async fn render(
        &self,
        container: &str,
        options: RenderOptions,
    ) -> Result<WidgetHandle, BotFilterError> {
        let handle = WidgetHandle::new(format!("headless-{}", Uuid::new_v4()));
        debug!(container, visible = options.visible, widget = %handle, "Rendered headless bot filter");
        self.live
            .lock()
            .map_err(|_| BotFilterError::Render {
                message: "widget registry poisoned".to_string(),
                partial: None,
            })?
            .insert(handle.clone());
        Ok(handle)
    }

    fn dispose(&self, handle: WidgetHandle) -> Result<(), BotFilterError> {
        let mut live = self.live.lock().map_err(|_| BotFilterError::Dispose {
            message: "widget registry poisoned".to_string(),
        })?;
        if live.remove(&handle) {
            Ok(())
        } else {
            Err(BotFilterError::Dispose {
                message: format!("widget {handle} is not live"),
            })
        }
    }
}
